//! The lexer proper: a deterministic finite automaton over single-byte
//! ASCII input, dispatching into one sub-state per [`crate::token::TokenKind`]
//! family. Each sub-module owns one state so `next_token` itself stays a
//! flat dispatch table rather than a monolithic function.

mod comment;
mod identifier;
mod number;
mod operator;
mod string;

use ifjc_util::CompileError;
use tracing::trace;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};
use crate::token_vector::TokenVector;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            cursor: Cursor::new(source.as_bytes()),
        }
    }

    /// Lexes the whole input in one pass, returning the populated
    /// [`TokenVector`] terminated by an EOF token.
    pub fn tokenize(mut self) -> Result<TokenVector, CompileError> {
        let mut tokens = TokenVector::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            trace!(kind = ?token.kind, line = token.line, "lexed token");
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        comment::skip_trivia(&mut self.cursor);
        let line = self.cursor.line();

        let Some(first) = self.cursor.peek() else {
            return Ok(Token::eof(line));
        };

        if first.is_ascii_digit() {
            return number::lex_number(&mut self.cursor, line);
        }
        if first.is_ascii_alphabetic() || first == b'_' {
            return Ok(identifier::lex_identifier(&mut self.cursor, line));
        }
        if first == b'"' {
            self.cursor.bump();
            return string::lex_string(&mut self.cursor, line);
        }
        if first == b'@' {
            self.cursor.bump();
            return operator::lex_import(&mut self.cursor, line);
        }
        if first == b'[' {
            self.cursor.bump();
            return operator::lex_u8_array(&mut self.cursor, line);
        }
        if first == b'?' {
            self.cursor.bump();
            return operator::lex_nullable(&mut self.cursor, line);
        }
        if !first.is_ascii() {
            return Err(CompileError::Lexical {
                line,
                message: format!("non-ASCII byte 0x{first:02x} outside a string literal"),
            });
        }

        self.cursor.bump();
        operator::lex_punctuator(&mut self.cursor, line, first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Keyword;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .as_slice()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn hello_world_skeleton() {
        let src = "pub fn main() void { ifj.write(\"hello\"); }";
        let k = kinds(src);
        assert_eq!(k.first(), Some(&TokenKind::Keyword(Keyword::Pub)));
        assert_eq!(k.last(), Some(&TokenKind::Eof));
        assert!(k.contains(&TokenKind::StringLiteral));
    }

    #[test]
    fn nullable_decl() {
        let k = kinds("var x : ?i32 = null;");
        assert!(k.contains(&TokenKind::NullableKeyword(Keyword::I32)));
        assert!(k.contains(&TokenKind::Keyword(Keyword::Null)));
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn comment_is_skipped() {
        let k = kinds("// whole line\nvar");
        assert_eq!(k, vec![TokenKind::Keyword(Keyword::Var), TokenKind::Eof]);
    }
}
