use ifjc_util::CompileError;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Opens on `"`, closes on the next unescaped `"`. Only `\"`, `\n`, `\r`,
/// `\t`, `\\` are accepted escapes; anything else, a raw newline, or EOF
/// inside the literal is a lexical error. The stored attribute keeps the
/// enclosing quotes, matching the source's raw re-emittable form.
pub fn lex_string(cursor: &mut Cursor<'_>, line: u32) -> Result<Token, CompileError> {
    cursor.push_lexeme(b'"'); // opening quote already consumed by the caller

    loop {
        match cursor.bump() {
            None => {
                return Err(CompileError::Lexical {
                    line,
                    message: "unterminated string literal".into(),
                });
            }
            Some(b'"') => {
                cursor.push_lexeme(b'"');
                break;
            }
            Some(b'\n') => {
                return Err(CompileError::Lexical {
                    line,
                    message: "newline inside string literal".into(),
                });
            }
            Some(b'\\') => {
                let escaped = cursor.bump().ok_or_else(|| CompileError::Lexical {
                    line,
                    message: "unterminated string literal".into(),
                })?;
                match escaped {
                    b'"' | b'n' | b'r' | b't' | b'\\' => {
                        cursor.push_lexeme(b'\\');
                        cursor.push_lexeme(escaped);
                    }
                    _ => {
                        return Err(CompileError::Lexical {
                            line,
                            message: format!("invalid escape sequence \\{}", escaped as char),
                        });
                    }
                }
            }
            Some(b) => cursor.push_lexeme(b),
        }
    }

    let text = cursor.take_lexeme();
    Ok(Token::new(TokenKind::StringLiteral, text, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(src: &str) -> Result<Token, CompileError> {
        let bytes = src.as_bytes();
        let mut cursor = Cursor::new(bytes);
        lex_string(&mut cursor, 1)
    }

    #[test]
    fn simple_string() {
        let t = lex_one("hello\"").unwrap();
        assert_eq!(t.attribute, "\"hello\"");
    }

    #[test]
    fn escapes() {
        let t = lex_one("a\\nb\"").unwrap();
        assert_eq!(t.attribute, "\"a\\nb\"");
    }

    #[test]
    fn bad_escape_is_error() {
        assert!(lex_one("a\\qb\"").is_err());
    }

    #[test]
    fn raw_newline_is_error() {
        assert!(lex_one("a\nb\"").is_err());
    }

    #[test]
    fn unterminated_is_error() {
        assert!(lex_one("abc").is_err());
    }
}
