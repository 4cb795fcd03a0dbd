use ifjc_util::{CompileError, FxHashMap};

use crate::symbol::{FunctionSymbol, Symbol, VariableSymbol};

/// One scope's hash table, keyed by name. The original design fixes
/// capacity at construction to a prime ≥ 1009 with a 65599-multiplier
/// hash; capacity is non-functional here as long as insert/lookup stay
/// O(1) amortized and iteration order never leaks into emitted output, so
/// this is a thin, capacity-agnostic wrapper over [`FxHashMap`].
#[derive(Debug, Default)]
pub struct Symtable {
    slots: FxHashMap<String, Symbol>,
}

impl Symtable {
    pub fn new() -> Self {
        Symtable {
            slots: FxHashMap::default(),
        }
    }

    /// Fails if `name` is already bound in this table to a symbol of
    /// either kind — variables and functions share the key space.
    pub fn insert(&mut self, name: String, symbol: Symbol, line: u32) -> Result<(), CompileError> {
        if self.slots.contains_key(&name) {
            return Err(CompileError::Redefinition {
                line,
                message: format!("\"{name}\" is already defined in this scope"),
            });
        }
        self.slots.insert(name, symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.slots.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.slots.get_mut(name)
    }

    pub fn iter_variables(&self) -> impl Iterator<Item = &VariableSymbol> {
        self.slots.values().filter_map(Symbol::as_variable)
    }

    pub fn iter_functions(&self) -> impl Iterator<Item = &FunctionSymbol> {
        self.slots.values().filter_map(Symbol::as_function)
    }
}

/// The LIFO stack of scopes the body parser pushes/pops as it enters and
/// leaves `{ ... }` blocks. `find` searches top-to-bottom so inner
/// declarations shadow outer ones.
#[derive(Debug, Default)]
pub struct SymtableStack {
    scopes: Vec<Symtable>,
}

impl SymtableStack {
    pub fn new() -> Self {
        SymtableStack { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Symtable::new());
    }

    /// Retires the top scope, failing with [`CompileError::UnusedVariable`]
    /// if any variable it declared was never read. Checked in declaration
    /// order so the diagnostic is deterministic.
    pub fn pop_scope(&mut self) -> Result<(), CompileError> {
        let scope = self.scopes.pop().expect("pop_scope with empty stack");
        let mut unused: Vec<&VariableSymbol> = scope.iter_variables().filter(|v| !v.was_used).collect();
        unused.sort_by_key(|v| v.declared_line);
        if let Some(v) = unused.first() {
            return Err(CompileError::UnusedVariable {
                line: v.declared_line,
                message: format!("variable \"{}\" is declared but never used", v.name),
            });
        }
        Ok(())
    }

    pub fn current_scope_mut(&mut self) -> &mut Symtable {
        self.scopes.last_mut().expect("no open scope")
    }

    /// Searches every open scope, innermost first.
    pub fn find_variable(&self, name: &str) -> Option<&VariableSymbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).and_then(Symbol::as_variable))
    }

    pub fn find_variable_mut(&mut self, name: &str) -> Option<&mut VariableSymbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name).and_then(Symbol::as_variable_mut))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn shadowing_prefers_innermost() {
        let mut stack = SymtableStack::new();
        stack.push_scope();
        stack
            .current_scope_mut()
            .insert(
                "x".into(),
                Symbol::Variable(VariableSymbol::new("x", DataType::I32, false, 1)),
                1,
            )
            .unwrap();
        stack.push_scope();
        stack
            .current_scope_mut()
            .insert(
                "x".into(),
                Symbol::Variable(VariableSymbol::new("x", DataType::F64, false, 2)),
                2,
            )
            .unwrap();
        assert_eq!(stack.find_variable("x").unwrap().ty, DataType::F64);
    }

    #[test]
    fn pop_scope_flags_unused_variable() {
        let mut stack = SymtableStack::new();
        stack.push_scope();
        stack
            .current_scope_mut()
            .insert(
                "z".into(),
                Symbol::Variable(VariableSymbol::new("z", DataType::I32, false, 3)),
                3,
            )
            .unwrap();
        let err = stack.pop_scope().unwrap_err();
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn pop_scope_passes_when_used() {
        let mut stack = SymtableStack::new();
        stack.push_scope();
        stack
            .current_scope_mut()
            .insert(
                "z".into(),
                Symbol::Variable(VariableSymbol::new("z", DataType::I32, false, 3)),
                3,
            )
            .unwrap();
        stack.find_variable_mut("z").unwrap().was_used = true;
        assert!(stack.pop_scope().is_ok());
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let mut table = Symtable::new();
        table
            .insert(
                "x".into(),
                Symbol::Variable(VariableSymbol::new("x", DataType::I32, false, 1)),
                1,
            )
            .unwrap();
        let err = table
            .insert(
                "x".into(),
                Symbol::Variable(VariableSymbol::new("x", DataType::F64, false, 2)),
                2,
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
