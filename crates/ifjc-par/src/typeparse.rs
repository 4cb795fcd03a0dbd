use ifjc_lex::{Keyword, Token, TokenKind};
use ifjc_sem::DataType;
use ifjc_util::CompileError;

/// Parses a single type-position token (`i32`, `?i32`, `f64`, `?f64`,
/// `u8[]`/`[]u8`, `?u8[]`/`?[]u8`, or — return-type position only —
/// `void`) into the closed [`DataType`] universe. `bool` has no source
/// spelling: it only ever arises as the static type of a relational
/// expression.
pub fn parse_type(token: &Token) -> Result<DataType, CompileError> {
    match token.kind {
        TokenKind::Keyword(Keyword::I32) => Ok(DataType::I32),
        TokenKind::NullableKeyword(Keyword::I32) => Ok(DataType::NullableI32),
        TokenKind::Keyword(Keyword::F64) => Ok(DataType::F64),
        TokenKind::NullableKeyword(Keyword::F64) => Ok(DataType::NullableF64),
        TokenKind::U8Array => Ok(DataType::U8Array),
        TokenKind::NullableU8Array => Ok(DataType::NullableU8Array),
        TokenKind::Keyword(Keyword::Void) => Ok(DataType::Void),
        _ => Err(CompileError::Syntactic {
            line: token.line,
            message: format!("expected a type, found \"{}\"", token.attribute),
        }),
    }
}
