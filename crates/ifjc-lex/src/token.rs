use std::fmt;

/// The closed set of reserved words. Each keyword also doubles as a type
/// name when it appears in a type position (`i32`, `f64`, `u8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Const,
    Else,
    Fn,
    If,
    I32,
    F64,
    Null,
    Pub,
    Return,
    U8,
    Var,
    Void,
    While,
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        Some(match word {
            "const" => Keyword::Const,
            "else" => Keyword::Else,
            "fn" => Keyword::Fn,
            "if" => Keyword::If,
            "i32" => Keyword::I32,
            "f64" => Keyword::F64,
            "null" => Keyword::Null,
            "pub" => Keyword::Pub,
            "return" => Keyword::Return,
            "u8" => Keyword::U8,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            _ => return None,
        })
    }
}

/// Closed token classification. Variants carrying a `Keyword` distinguish a
/// bare type keyword from its nullable spelling (`?i32`) produced when the
/// lexer sees a leading `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    /// The bare `_` token, distinct from an identifier starting with `_`.
    Underscore,
    Keyword(Keyword),
    /// `?i32`, `?f64`, `?u8` — only ever carries `I32`, `F64`, or `U8`.
    NullableKeyword(Keyword),
    /// `[]u8`
    U8Array,
    /// `?[]u8`
    NullableU8Array,
    /// `@import` directive.
    Import,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Semicolon,
    Dot,
    VerticalBar,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One lexed unit: its kind, the raw source text it was built from (numeric
/// literals keep their textual form so exponent notation round-trips), and
/// the 1-based source line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub attribute: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, attribute: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            attribute: attribute.into(),
            line,
        }
    }

    pub fn eof(line: u32) -> Self {
        Token::new(TokenKind::Eof, "", line)
    }
}
