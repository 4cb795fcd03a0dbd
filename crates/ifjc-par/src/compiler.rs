use ifjc_gen::{Emit, LabelCounters};
use ifjc_sem::{DataType, Symtable, SymtableStack};
use ifjc_util::CompileError;

/// The single threaded context every pipeline stage operates through,
/// replacing the source's global mutable singletons (`stream`,
/// `if_label_count`, `while_label_count`, the embedded-function tables)
/// with ordinary fields. One `Compiler` is constructed per compilation
/// and never shared across threads.
pub struct Compiler<E: Emit> {
    pub global: Symtable,
    pub scopes: SymtableStack,
    pub labels: LabelCounters,
    pub emit: E,
    /// Name of the function currently being parsed, for diagnostics and
    /// for resolving `return`'s target type.
    pub current_function: String,
    pub current_return_type: DataType,
}

impl<E: Emit> Compiler<E> {
    pub fn new(emit: E) -> Result<Self, CompileError> {
        let mut global = Symtable::new();
        ifjc_sem::register_embedded(&mut global)?;
        Ok(Compiler {
            global,
            scopes: SymtableStack::new(),
            labels: LabelCounters::new(),
            emit,
            current_function: String::new(),
            current_return_type: DataType::Void,
        })
    }
}
