use crate::cursor::Cursor;
use crate::token::{Keyword, Token, TokenKind};

/// `[A-Za-z_][A-Za-z0-9_]*`. A bare `_` (no further identifier characters)
/// is its own token kind rather than an identifier.
pub fn lex_identifier(cursor: &mut Cursor<'_>, line: u32) -> Token {
    while let Some(b) = cursor.peek() {
        if b.is_ascii_alphanumeric() || b == b'_' {
            cursor.bump();
            cursor.push_lexeme(b);
        } else {
            break;
        }
    }
    let text = cursor.take_lexeme();

    if text == "_" {
        return Token::new(TokenKind::Underscore, text, line);
    }
    if let Some(kw) = Keyword::lookup(&text) {
        return Token::new(TokenKind::Keyword(kw), text, line);
    }
    Token::new(TokenKind::Identifier, text, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(src: &str) -> Token {
        let bytes = src.as_bytes();
        let mut cursor = Cursor::new(bytes);
        lex_identifier(&mut cursor, 1)
    }

    #[test]
    fn plain_identifier() {
        assert_eq!(lex_one("foo_bar1").kind, TokenKind::Identifier);
    }

    #[test]
    fn keyword() {
        assert_eq!(lex_one("while").kind, TokenKind::Keyword(Keyword::While));
    }

    #[test]
    fn underscore_alone() {
        assert_eq!(lex_one("_ ").kind, TokenKind::Underscore);
    }
}
