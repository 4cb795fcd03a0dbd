use ifjc_util::CompileError;

use crate::cursor::Cursor;
use crate::token::{Keyword, Token, TokenKind};

/// Single-char punctuators, plus the four operators that accept an
/// optional trailing `=` (`=`, `!`, `<`, `>`). `first` has already been
/// consumed by the caller.
pub fn lex_punctuator(cursor: &mut Cursor<'_>, line: u32, first: u8) -> Result<Token, CompileError> {
    let kind = match first {
        b'+' => TokenKind::Plus,
        b'-' => TokenKind::Minus,
        b'*' => TokenKind::Star,
        b'/' => TokenKind::Slash,
        b'(' => TokenKind::LParen,
        b')' => TokenKind::RParen,
        b'{' => TokenKind::LBrace,
        b'}' => TokenKind::RBrace,
        b':' => TokenKind::Colon,
        b',' => TokenKind::Comma,
        b';' => TokenKind::Semicolon,
        b'.' => TokenKind::Dot,
        b'|' => TokenKind::VerticalBar,
        b'=' => {
            if consume_eq(cursor) {
                TokenKind::Eq
            } else {
                TokenKind::Assign
            }
        }
        b'!' => {
            if consume_eq(cursor) {
                TokenKind::NotEq
            } else {
                return Err(CompileError::Lexical {
                    line,
                    message: "bare '!' is not a valid operator".into(),
                });
            }
        }
        b'<' => {
            if consume_eq(cursor) {
                TokenKind::Le
            } else {
                TokenKind::Lt
            }
        }
        b'>' => {
            if consume_eq(cursor) {
                TokenKind::Ge
            } else {
                TokenKind::Gt
            }
        }
        other => {
            return Err(CompileError::Lexical {
                line,
                message: format!("unexpected character '{}'", other as char),
            });
        }
    };
    let text = std::str::from_utf8(&[first]).unwrap().to_string();
    Ok(Token::new(kind, text, line))
}

fn consume_eq(cursor: &mut Cursor<'_>) -> bool {
    if cursor.peek() == Some(b'=') {
        cursor.bump();
        true
    } else {
        false
    }
}

/// `@import` — the only directive the lexer recognizes after `@`.
pub fn lex_import(cursor: &mut Cursor<'_>, line: u32) -> Result<Token, CompileError> {
    for expected in "import".bytes() {
        match cursor.bump() {
            Some(b) if b == expected => {}
            _ => {
                return Err(CompileError::Lexical {
                    line,
                    message: "expected '@import'".into(),
                });
            }
        }
    }
    Ok(Token::new(TokenKind::Import, "@import", line))
}

/// `[]u8`, with the opening `[` already consumed.
pub fn lex_u8_array(cursor: &mut Cursor<'_>, line: u32) -> Result<Token, CompileError> {
    expect_literal(cursor, line, "]u8")?;
    Ok(Token::new(TokenKind::U8Array, "[]u8", line))
}

/// `?i32`, `?f64`, `?u8`, or `?[]u8` — the leading `?` is already consumed.
pub fn lex_nullable(cursor: &mut Cursor<'_>, line: u32) -> Result<Token, CompileError> {
    if cursor.peek() == Some(b'[') {
        cursor.bump();
        expect_literal(cursor, line, "]u8")?;
        return Ok(Token::new(TokenKind::NullableU8Array, "?[]u8", line));
    }

    let starts_ident = cursor
        .peek()
        .map(|b| b.is_ascii_alphanumeric() || b == b'_')
        .unwrap_or(false);
    if !starts_ident {
        return Err(CompileError::Lexical {
            line,
            message: "'?' must be followed by a type name or '[]u8'".into(),
        });
    }

    let mut word = String::new();
    while let Some(b) = cursor.peek() {
        if b.is_ascii_alphanumeric() || b == b'_' {
            cursor.bump();
            word.push(b as char);
        } else {
            break;
        }
    }

    let kw = match word.as_str() {
        "i32" => Keyword::I32,
        "f64" => Keyword::F64,
        "u8" => Keyword::U8,
        _ => {
            return Err(CompileError::Lexical {
                line,
                message: format!("'?{word}' is not a valid nullable type"),
            });
        }
    };
    Ok(Token::new(TokenKind::NullableKeyword(kw), format!("?{word}"), line))
}

fn expect_literal(cursor: &mut Cursor<'_>, line: u32, literal: &str) -> Result<(), CompileError> {
    for expected in literal.bytes() {
        match cursor.bump() {
            Some(b) if b == expected => {}
            _ => {
                return Err(CompileError::Lexical {
                    line,
                    message: format!("expected \"{literal}\""),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_operators() {
        let bytes = "=".as_bytes();
        let mut cursor = Cursor::new(bytes);
        assert_eq!(lex_punctuator(&mut cursor, 1, b'=').unwrap().kind, TokenKind::Assign);

        let bytes = "=".as_bytes();
        let mut cursor = Cursor::new(bytes);
        assert_eq!(lex_punctuator(&mut cursor, 1, b'!').unwrap_err().exit_code(), 1);
    }

    #[test]
    fn nullable_i32() {
        let bytes = "i32".as_bytes();
        let mut cursor = Cursor::new(bytes);
        let t = lex_nullable(&mut cursor, 1).unwrap();
        assert_eq!(t.kind, TokenKind::NullableKeyword(Keyword::I32));
    }

    #[test]
    fn nullable_u8_array() {
        let bytes = "[]u8".as_bytes();
        let mut cursor = Cursor::new(bytes);
        let t = lex_nullable(&mut cursor, 1).unwrap();
        assert_eq!(t.kind, TokenKind::NullableU8Array);
    }

    #[test]
    fn u8_array() {
        let bytes = "]u8".as_bytes();
        let mut cursor = Cursor::new(bytes);
        let t = lex_u8_array(&mut cursor, 1).unwrap();
        assert_eq!(t.kind, TokenKind::U8Array);
    }
}
