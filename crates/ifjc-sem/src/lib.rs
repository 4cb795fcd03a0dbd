//! Symbol model and scoped symbol tables (components D and E): the
//! variable/function records, the per-scope hash tables and their LIFO
//! stack, and the embedded-function registry that is installed into the
//! global table before the function pre-pass runs.

mod embedded;
mod symbol;
mod symtable;
mod types;

pub use embedded::register_embedded;
pub use symbol::{FunctionSymbol, Symbol, VariableSymbol};
pub use symtable::{Symtable, SymtableStack};
pub use types::DataType;
