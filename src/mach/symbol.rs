use super::{Address, Word};
use std::collections::HashMap;

/// What a name in scope stands for.
///
/// Constants carry their literal value, variables their word offset
/// from the owning frame's base (negative for parameters), and
/// subroutines the code address of their prologue plus the declared
/// parameter count.
#[derive(Debug, Clone, PartialEq)]
pub enum SymValue {
    Constant(Word),
    Variable(Word),
    Procedure { addr: Address, arity: usize },
    Function { addr: Address, arity: usize },
}

impl SymValue {
    pub fn kind(&self) -> &'static str {
        use SymValue::*;
        match self {
            Constant(_) => "constant",
            Variable(_) => "variable",
            Procedure { .. } => "procedure",
            Function { .. } => "function",
        }
    }
}

/// ## Symbol table
///
/// One scope per lexical level, pushed on block entry and popped on
/// exit. Lookup walks the scopes innermost-first, so the binding with
/// the greatest level not exceeding the current nesting wins.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, SymValue>>,
}

impl SymbolTable {
    /// A new table holds the implicit `main` procedure at level 0.
    pub fn new() -> SymbolTable {
        let mut table = SymbolTable {
            scopes: vec![HashMap::new()],
        };
        table.insert("main", SymValue::Procedure { addr: 0, arity: 0 });
        table
    }

    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn open(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope, returning its bindings.
    pub fn close(&mut self) -> Vec<(String, SymValue)> {
        match self.scopes.pop() {
            Some(scope) => scope.into_iter().collect(),
            None => vec![],
        }
    }

    /// Add to the innermost scope. Same-level collisions are the
    /// caller's problem; check with `defined_here` first.
    pub fn insert(&mut self, name: &str, value: SymValue) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    pub fn defined_here(&self, name: &str) -> bool {
        self.scopes.last().map_or(false, |s| s.contains_key(name))
    }

    /// The innermost binding for `name`, with its level.
    pub fn lookup(&self, name: &str) -> Option<(usize, &SymValue)> {
        for (level, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(value) = scope.get(name) {
                return Some((level, value));
            }
        }
        None
    }

    /// Patch the code address of the subroutine `name` owned by `level`.
    pub fn set_addr(&mut self, name: &str, level: usize, addr: Address) {
        if let Some(value) = self.scopes.get_mut(level).and_then(|s| s.get_mut(name)) {
            match value {
                SymValue::Procedure { addr: a, .. } | SymValue::Function { addr: a, .. } => {
                    *a = addr
                }
                _ => {}
            }
        }
    }

    /// Record the parameter count of the subroutine `name` owned by `level`.
    pub fn set_arity(&mut self, name: &str, level: usize, arity: usize) {
        if let Some(value) = self.scopes.get_mut(level).and_then(|s| s.get_mut(name)) {
            match value {
                SymValue::Procedure { arity: n, .. } | SymValue::Function { arity: n, .. } => {
                    *n = arity
                }
                _ => {}
            }
        }
    }
}
