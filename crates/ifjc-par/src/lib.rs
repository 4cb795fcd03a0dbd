//! Parser and semantic analyzer: components G–I of the pipeline, plus the
//! `Compiler` context (component "single threaded context" from the design
//! notes) everything else is threaded through.
//!
//! The two passes share one [`Compiler`]: [`prepass::run_prepass`] walks the
//! token stream once to register every function's signature (so forward
//! references resolve), then [`body::run_body_pass`] walks it a second time
//! to type-check and emit each function body.

mod body;
mod compiler;
mod cursor;
mod expr;
mod prepass;
mod typeparse;

pub use body::run_body_pass;
pub use compiler::Compiler;
pub use cursor::TokenCursor;
pub use expr::{parse_expression, parse_expression_with_literal};
pub use prepass::run_prepass;
pub use typeparse::parse_type;
