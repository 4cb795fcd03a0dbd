use crate::types::DataType;

/// A declared variable. `was_used` backs the "declared but never read"
/// diagnostic raised when its owning scope closes ([crate::symtable::SymtableStack::pop]).
#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: DataType,
    pub is_const: bool,
    pub defined: bool,
    pub nullable: bool,
    pub was_used: bool,
    /// Line the symbol was declared on, kept for unused-variable diagnostics.
    pub declared_line: u32,
    /// Set when this is a `const` declared with a bare literal initializer
    /// (kind + raw textual form). The expression sub-parser inlines reads
    /// of such a variable by rewriting the identifier token to a literal
    /// bearing this value, and still marks the variable used.
    pub constant_literal: Option<(DataType, String)>,
}

impl VariableSymbol {
    pub fn new(name: impl Into<String>, ty: DataType, is_const: bool, declared_line: u32) -> Self {
        VariableSymbol {
            name: name.into(),
            ty,
            is_const,
            defined: false,
            nullable: ty.is_nullable(),
            was_used: false,
            declared_line,
            constant_literal: None,
        }
    }

    /// Fresh owned copy materialized on the callee's scope at a call site —
    /// parameters are never shared by reference between the function table
    /// and a scope's symtable.
    pub fn fresh_binding(&self, declared_line: u32) -> VariableSymbol {
        VariableSymbol {
            name: self.name.clone(),
            ty: self.ty,
            is_const: self.is_const,
            defined: true,
            nullable: self.nullable,
            was_used: false,
            declared_line,
            constant_literal: self.constant_literal.clone(),
        }
    }
}

/// A declared function: name, ordered parameters, and declared return
/// type. `has_return` is set once the body parser observes a `return`
/// reaching the function's top level with the right shape for its type.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub parameters: Vec<VariableSymbol>,
    pub return_type: DataType,
    pub has_return: bool,
}

impl FunctionSymbol {
    pub fn new(name: impl Into<String>, parameters: Vec<VariableSymbol>, return_type: DataType) -> Self {
        FunctionSymbol {
            name: name.into(),
            parameters,
            return_type,
            has_return: false,
        }
    }
}

/// The tagged union a [`crate::symtable::Symtable`] slot actually holds —
/// variables and functions share one key space per table.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(VariableSymbol),
    Function(FunctionSymbol),
}

impl Symbol {
    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match self {
            Symbol::Variable(v) => Some(v),
            Symbol::Function(_) => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableSymbol> {
        match self {
            Symbol::Variable(v) => Some(v),
            Symbol::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match self {
            Symbol::Function(f) => Some(f),
            Symbol::Variable(_) => None,
        }
    }
}
