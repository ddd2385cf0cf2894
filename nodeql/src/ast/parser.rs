// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parser for the query language
//!
//! Grammar:
//!
//! ```text
//! query     := call+
//! call      := name [ '(' argument* ')' ] [ block ]
//! block     := '{' selection* '}'
//! selection := name [ block ]
//! argument  := identifier | string | number
//! ```
//!
//! Whitespace and commas are insignificant separators (dropped by the
//! lexer). The parser is schema-agnostic: it enforces only lexical and
//! grammatical well-formedness; call semantics belong to the compiler.
//! Any violation yields a single error with no partial tree.

use log::debug;
use thiserror::Error;

use super::lexer::{tokenize, LexerError, SpannedToken, Token};
use super::{Argument, ArgumentValue, Call, Location, Query, Selection};

/// Parse-time nesting cap. Selection nesting is grammatically unbounded;
/// this only bounds stack depth on adversarial input. The compiler applies
/// its own, configurable guard.
const MAX_NESTING: usize = 64;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    #[error("{0}")]
    Lexer(#[from] LexerError),

    #[error("unexpected {found} at {location}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        location: Location,
    },

    #[error("empty query: expected at least one call")]
    EmptyQuery,

    #[error("selection nesting exceeds {limit} levels at {location}")]
    NestingTooDeep { limit: usize, location: Location },
}

/// Parse query text into a call tree
pub fn parse_query(input: &str) -> Result<Query, ParserError> {
    let tokens = tokenize(input)?;
    let query = Parser::new(&tokens).parse()?;
    debug!("parsed query with {} top-level call(s)", query.calls.len());
    Ok(query)
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn parse(mut self) -> Result<Query, ParserError> {
        let mut calls = Vec::new();
        while !matches!(self.peek().token, Token::EOF) {
            calls.push(self.call()?);
        }
        if calls.is_empty() {
            return Err(ParserError::EmptyQuery);
        }
        Ok(Query { calls })
    }

    fn call(&mut self) -> Result<Call, ParserError> {
        let location = self.peek().location;
        let name = self.name("call name")?;

        let arguments = if matches!(self.peek().token, Token::LeftParen) {
            self.bump();
            self.arguments()?
        } else {
            Vec::new()
        };

        let selections = if matches!(self.peek().token, Token::LeftBrace) {
            self.block(0)?
        } else {
            Vec::new()
        };

        Ok(Call {
            name,
            arguments,
            selections,
            location,
        })
    }

    /// Argument list; the opening paren has already been consumed
    fn arguments(&mut self) -> Result<Vec<Argument>, ParserError> {
        let mut arguments = Vec::new();
        loop {
            let spanned = self.peek();
            let location = spanned.location;
            let value = match &spanned.token {
                Token::RightParen => {
                    self.bump();
                    return Ok(arguments);
                }
                Token::Identifier(name) => ArgumentValue::Identifier(name.clone()),
                Token::Str(text) => ArgumentValue::Str(text.clone()),
                Token::Integer(n) => ArgumentValue::Integer(*n),
                Token::Number(n) => ArgumentValue::Number(*n),
                other => {
                    return Err(ParserError::UnexpectedToken {
                        found: other.to_string(),
                        expected: "an argument or ')'",
                        location,
                    });
                }
            };
            self.bump();
            arguments.push(Argument { value, location });
        }
    }

    /// Selection block, starting at the opening brace
    fn block(&mut self, depth: usize) -> Result<Vec<Selection>, ParserError> {
        let open = self.peek().location;
        if depth >= MAX_NESTING {
            return Err(ParserError::NestingTooDeep {
                limit: MAX_NESTING,
                location: open,
            });
        }
        self.bump(); // '{'

        let mut selections = Vec::new();
        loop {
            let spanned = self.peek();
            match &spanned.token {
                Token::RightBrace => {
                    self.bump();
                    return Ok(selections);
                }
                Token::Identifier(_) => {
                    selections.push(self.selection(depth)?);
                }
                other => {
                    return Err(ParserError::UnexpectedToken {
                        found: other.to_string(),
                        expected: "a field name or '}'",
                        location: spanned.location,
                    });
                }
            }
        }
    }

    fn selection(&mut self, depth: usize) -> Result<Selection, ParserError> {
        let location = self.peek().location;
        let name = self.name("field name")?;

        let selections = if matches!(self.peek().token, Token::LeftBrace) {
            self.block(depth + 1)?
        } else {
            Vec::new()
        };

        Ok(Selection {
            name,
            selections,
            location,
        })
    }

    fn name(&mut self, expected: &'static str) -> Result<String, ParserError> {
        let spanned = self.peek();
        match &spanned.token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            other => Err(ParserError::UnexpectedToken {
                found: other.to_string(),
                expected,
                location: spanned.location,
            }),
        }
    }

    // Returns a reference with the token stream's lifetime, not the
    // parser's, so lookahead can outlive a following bump
    fn peek(&self) -> &'a SpannedToken {
        // The token stream always ends with EOF, so position stays in range
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_call() {
        let query = parse_query("schema").expect("parse failed");
        assert_eq!(query.calls.len(), 1);
        assert_eq!(query.calls[0].name, "schema");
        assert!(query.calls[0].arguments.is_empty());
        assert!(query.calls[0].selections.is_empty());
    }

    #[test]
    fn test_parse_call_with_arguments_and_block() {
        let query = parse_query(r#"node(User, "some-id") { handle, karma }"#).expect("parse failed");
        let call = &query.calls[0];
        assert_eq!(call.name, "node");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0].as_identifier(), Some("User"));
        assert_eq!(call.arguments[1].as_id(), Some("some-id"));
        let names: Vec<&str> = call.selections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["handle", "karma"]);
    }

    #[test]
    fn test_parse_nested_selections() {
        let query = parse_query("node(Micropost, X) { text author { handle } }").expect("parse failed");
        let call = &query.calls[0];
        assert_eq!(call.selections.len(), 2);
        let author = &call.selections[1];
        assert_eq!(author.name, "author");
        assert_eq!(author.selections.len(), 1);
        assert_eq!(author.selections[0].name, "handle");
    }

    #[test]
    fn test_parse_multiple_calls() {
        let query = parse_query("createType(Test) { success } nodes(Test) { count }")
            .expect("parse failed");
        assert_eq!(query.calls.len(), 2);
        assert_eq!(query.calls[0].name, "createType");
        assert_eq!(query.calls[1].name, "nodes");
    }

    #[test]
    fn test_empty_query_is_rejected() {
        assert_eq!(parse_query("   "), Err(ParserError::EmptyQuery));
    }

    #[test]
    fn test_unclosed_block_is_rejected() {
        let err = parse_query("nodes(User) { count").expect_err("should fail");
        match err {
            ParserError::UnexpectedToken { expected, .. } => {
                assert_eq!(expected, "a field name or '}'");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_argument_in_selection_is_rejected() {
        // Selections take no arguments; only calls do
        let err = parse_query("node(User, X) { posts(3) }").expect_err("should fail");
        assert!(matches!(err, ParserError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_error_carries_location() {
        let err = parse_query("node(User) {\n  42\n}").expect_err("should fail");
        match err {
            ParserError::UnexpectedToken { location, .. } => {
                assert_eq!(location.line, 2);
                assert_eq!(location.column, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nesting_guard() {
        let mut source = String::from("node(User, X) ");
        for _ in 0..(MAX_NESTING + 1) {
            source.push_str("{ a ");
        }
        for _ in 0..(MAX_NESTING + 1) {
            source.push('}');
        }
        let err = parse_query(&source).expect_err("should fail");
        assert!(matches!(err, ParserError::NestingTooDeep { .. }));
    }
}
