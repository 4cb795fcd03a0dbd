//! Character stream → token stream.
//!
//! This crate owns components A–C of the pipeline: the byte cursor (a
//! thin wrapper that also plays the role of the classic grow-on-append
//! lexeme buffer), the `Token`/`TokenVector` carrier types, and the lexer
//! itself. Nothing here knows about scopes, types, or emission — it hands
//! the rest of the pipeline one flat, randomly-addressable token stream.

mod cursor;
mod lexer;
mod token;
mod token_vector;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{Keyword, Token, TokenKind};
pub use token_vector::TokenVector;
