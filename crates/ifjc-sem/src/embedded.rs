use ifjc_util::CompileError;

use crate::symbol::{FunctionSymbol, Symbol, VariableSymbol};
use crate::symtable::Symtable;
use crate::types::DataType;

/// The `ifj.`-namespaced built-ins. Their implementations live in the
/// TARGET runtime; the compiler only ever registers the signature below
/// and emits a matching `CALL`. This table is a process-wide constant,
/// not something any pass mutates.
fn signatures() -> Vec<(&'static str, &'static [DataType], DataType)> {
    vec![
        ("readstr", &[], DataType::NullableU8Array),
        ("readi32", &[], DataType::NullableI32),
        ("readf64", &[], DataType::NullableF64),
        ("write", &[DataType::Term], DataType::Void),
        ("i2f", &[DataType::I32], DataType::F64),
        ("f2i", &[DataType::F64], DataType::I32),
        ("string", &[DataType::Term], DataType::U8Array),
        ("length", &[DataType::U8Array], DataType::I32),
        ("concat", &[DataType::U8Array, DataType::U8Array], DataType::U8Array),
        (
            "substring",
            &[DataType::U8Array, DataType::I32, DataType::I32],
            DataType::NullableU8Array,
        ),
        ("strcmp", &[DataType::U8Array, DataType::U8Array], DataType::I32),
        ("ord", &[DataType::U8Array, DataType::I32], DataType::I32),
        ("chr", &[DataType::I32], DataType::U8Array),
    ]
}

/// Installs every embedded function into the global table. Must run
/// before the function pre-pass so user redefinition of e.g. `write` (via
/// the bare, unprefixed name — embedded functions only live under `ifj.`)
/// is impossible by construction: they are keyed as `ifj.<name>`, a name
/// no user declaration can ever spell.
pub fn register_embedded(global: &mut Symtable) -> Result<(), CompileError> {
    for (name, params, ret) in signatures() {
        let parameters = params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let mut p = VariableSymbol::new(format!("p{i}"), *ty, false, 0);
                p.defined = true;
                p
            })
            .collect();
        let qualified = format!("ifj.{name}");
        global.insert(
            qualified,
            Symbol::Function(FunctionSymbol::new(name, parameters, ret)),
            0,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_thirteen() {
        let mut global = Symtable::new();
        register_embedded(&mut global).unwrap();
        assert_eq!(global.iter_functions().count(), 13);
        let write = global.get("ifj.write").unwrap().as_function().unwrap();
        assert_eq!(write.return_type, DataType::Void);
        assert_eq!(write.parameters.len(), 1);
    }
}
