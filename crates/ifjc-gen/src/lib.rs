//! Code emitter (component F): a small typed API that hides TARGET's
//! textual instruction syntax behind one method per instruction family,
//! plus the label/monotonic-counter bookkeeping shared by `if`/`while`
//! and the `strcmp`/`ord`/`substring` helper sequences.

mod emit;
mod escape;
mod labels;
mod operand;

pub use emit::{ArithOp, AsmEmitter, Emit, RelOp};
pub use escape::{escape_string_literal, format_float_literal};
pub use labels::LabelCounters;
pub use operand::{scratch_register, Frame, LiteralValue, Operand};
