// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lexer for the query language using a hybrid approach
//!
//! Token recognizers are written with nom; the main tokenization loop is a
//! manual loop that tracks source locations and guards against recognizers
//! that fail to consume input. Whitespace and commas are insignificant
//! separators and never reach the parser.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, char, digit1},
    combinator::{opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};
use std::fmt;
use thiserror::Error;

use super::Location;

/// Token types for the query language
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Str(String),
    Integer(i64),
    Number(f64),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    // Trivia - filtered out before the parser sees the stream
    Whitespace,
    Comma,

    EOF,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Str(_) => write!(f, "string literal"),
            Token::Integer(n) => write!(f, "integer '{}'", n),
            Token::Number(n) => write!(f, "number '{}'", n),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::LeftBrace => write!(f, "'{{'"),
            Token::RightBrace => write!(f, "'}}'"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Comma => write!(f, "','"),
            Token::EOF => write!(f, "end of query"),
        }
    }
}

/// A token together with the location where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub location: Location,
}

/// Lexical error with the offending location
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {location}")]
pub struct LexerError {
    pub message: String,
    pub location: Location,
}

fn whitespace(input: &str) -> IResult<&str, Token> {
    value(Token::Whitespace, take_while1(|c: char| c.is_whitespace()))(input)
}

fn comma(input: &str) -> IResult<&str, Token> {
    value(Token::Comma, char(','))(input)
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LeftParen, char('(')),
        value(Token::RightParen, char(')')),
        value(Token::LeftBrace, char('{')),
        value(Token::RightBrace, char('}')),
    ))(input)
}

/// Parse a double-quoted string literal with `\"`, `\\`, `\n`, `\t`, `\r`
/// escapes. Returns `Err::Failure` for unterminated literals and bad escapes
/// so the tokenize loop can report them precisely instead of falling through
/// to "unexpected character".
fn string_literal(input: &str) -> IResult<&str, Token> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => {
            return Err(nom::Err::Error(NomError::new(input, ErrorKind::Char)));
        }
    }

    let mut text = String::new();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => return Ok((&input[index + 1..], Token::Str(text))),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, '"')) => text.push('"'),
                Some((_, '\\')) => text.push('\\'),
                _ => {
                    return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Escaped)));
                }
            },
            _ => text.push(ch),
        }
    }

    Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char)))
}

fn number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;

    let token = if text.contains('.') {
        match text.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Float))),
        }
    } else {
        match text.parse::<i64>() {
            Ok(n) => Token::Integer(n),
            // Out-of-range integers degrade to floating point
            Err(_) => match text.parse::<f64>() {
                Ok(n) => Token::Number(n),
                Err(_) => return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Digit))),
            },
        }
    };

    Ok((rest, token))
}

fn identifier(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;
    Ok((rest, Token::Identifier(text.to_string())))
}

/// Parse a single token
///
/// Recognizer order matters: literals come before identifiers so that a
/// leading digit or quote is never swallowed by a more general pattern.
fn token(input: &str) -> IResult<&str, Token> {
    alt((
        whitespace,
        comma,
        punctuation,
        string_literal,
        number,
        identifier,
    ))(input)
}

/// Advance a location over consumed input
fn advance(location: &mut Location, consumed: &str) {
    for ch in consumed.chars() {
        location.offset += ch.len_utf8();
        if ch == '\n' {
            location.line += 1;
            location.column = 1;
        } else {
            location.column += 1;
        }
    }
}

/// Tokenize query text into a located token stream
///
/// Trivia (whitespace, commas) is dropped here. The loop verifies that every
/// recognizer consumes input; a recognizer that matches without advancing
/// would otherwise spin forever.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, LexerError> {
    let mut remaining = input;
    let mut location = Location::start();
    let mut tokens = Vec::new();

    while !remaining.is_empty() {
        match token(remaining) {
            Ok((next_remaining, tok)) => {
                if next_remaining.len() == remaining.len() {
                    return Err(LexerError {
                        message: format!("lexer made no progress before {:?}", tok),
                        location,
                    });
                }

                let consumed = &remaining[..remaining.len() - next_remaining.len()];
                if !matches!(tok, Token::Whitespace | Token::Comma) {
                    tokens.push(SpannedToken {
                        token: tok,
                        location,
                    });
                }
                advance(&mut location, consumed);
                remaining = next_remaining;
            }
            Err(nom::Err::Failure(failure)) => {
                let message = match failure.code {
                    ErrorKind::Escaped => "invalid escape sequence in string literal".to_string(),
                    _ if remaining.starts_with('"') => "unterminated string literal".to_string(),
                    _ => format!("malformed literal near '{}'", head(remaining)),
                };
                return Err(LexerError { message, location });
            }
            Err(_) => {
                return Err(LexerError {
                    message: format!("unexpected character '{}'", head(remaining)),
                    location,
                });
            }
        }
    }

    tokens.push(SpannedToken {
        token: Token::EOF,
        location,
    });
    Ok(tokens)
}

fn head(input: &str) -> char {
    input.chars().next().unwrap_or('\0')
}
