use ifjc_util::CompileError;

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Numbers: `digits`, `digits "." digits`, `digits ("e"|"E") ["+"|"-"] digits`,
/// or the combination of both. The textual form is preserved verbatim so the
/// emitter can round-trip exponent notation without reconstructing it.
pub fn lex_number(cursor: &mut Cursor<'_>, line: u32) -> Result<Token, CompileError> {
    let mut is_float = false;

    let int_digits = consume_digits(cursor);
    if int_digits.len() > 1 && int_digits.starts_with('0') {
        return Err(CompileError::Lexical {
            line,
            message: format!("leading zero in integer literal \"{int_digits}\""),
        });
    }

    if cursor.peek() == Some(b'.') && cursor.peek2().map(|b| b.is_ascii_digit()).unwrap_or(false) {
        is_float = true;
        cursor.bump();
        cursor.push_lexeme(b'.');
        consume_digits(cursor);
    }

    if matches!(cursor.peek(), Some(b'e') | Some(b'E')) {
        let e = cursor.bump().unwrap();
        cursor.push_lexeme(e);
        if matches!(cursor.peek(), Some(b'+') | Some(b'-')) {
            let sign = cursor.bump().unwrap();
            cursor.push_lexeme(sign);
        }
        if !cursor.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            return Err(CompileError::Lexical {
                line,
                message: "malformed exponent in numeric literal".into(),
            });
        }
        is_float = true;
        consume_digits(cursor);
    }

    let text = cursor.take_lexeme();
    let kind = if is_float {
        TokenKind::FloatLiteral
    } else {
        TokenKind::IntLiteral
    };
    Ok(Token::new(kind, text, line))
}

/// Consumes a run of ASCII digits, returning the text consumed (without
/// mutating the lexeme buffer's other contents).
fn consume_digits(cursor: &mut Cursor<'_>) -> String {
    let mut out = String::new();
    while let Some(b) = cursor.peek() {
        if b.is_ascii_digit() {
            cursor.bump();
            cursor.push_lexeme(b);
            out.push(b as char);
        } else {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(src: &str) -> Token {
        let bytes = src.as_bytes();
        let mut cursor = Cursor::new(bytes);
        lex_number(&mut cursor, 1).unwrap()
    }

    #[test]
    fn integer_literal() {
        let t = lex_one("42");
        assert_eq!(t.kind, TokenKind::IntLiteral);
        assert_eq!(t.attribute, "42");
    }

    #[test]
    fn float_literal_preserves_exponent() {
        let t = lex_one("1.5e+3");
        assert_eq!(t.kind, TokenKind::FloatLiteral);
        assert_eq!(t.attribute, "1.5e+3");
    }

    #[test]
    fn float_with_zero_fraction() {
        let t = lex_one("3.0");
        assert_eq!(t.kind, TokenKind::FloatLiteral);
        assert_eq!(t.attribute, "3.0");
    }

    #[test]
    fn rejects_multiple_leading_zeroes() {
        let bytes = "01".as_bytes();
        let mut cursor = Cursor::new(bytes);
        assert!(lex_number(&mut cursor, 1).is_err());
    }

    #[test]
    fn accepts_single_zero() {
        let t = lex_one("0");
        assert_eq!(t.attribute, "0");
    }
}
