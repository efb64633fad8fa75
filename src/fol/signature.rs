//! Signature view: sorts, function symbols, predicate symbols
//!
//! The signature is read-only during search but can be extended before it,
//! which is how the monotonicity rewrite introduces its guard predicates and
//! witness constants.

use crate::fol::{FuncId, PredId, SortId};

/// A function symbol with its declared argument and result sorts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    name: String,
    arg_sorts: Vec<SortId>,
    result_sort: SortId,
    usage_count: u32,
}

impl FunctionSymbol {
    /// Returns the symbol name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of arguments
    pub fn arity(&self) -> usize {
        self.arg_sorts.len()
    }

    /// Returns the declared argument sorts
    pub fn arg_sorts(&self) -> &[SortId] {
        &self.arg_sorts
    }

    /// Returns the declared result sort
    pub fn result_sort(&self) -> SortId {
        self.result_sort
    }

    /// Returns how often the symbol occurs in the preprocessed problem
    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }
}

/// A predicate symbol with its declared argument sorts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateSymbol {
    name: String,
    arg_sorts: Vec<SortId>,
}

impl PredicateSymbol {
    /// Returns the symbol name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of arguments
    pub fn arity(&self) -> usize {
        self.arg_sorts.len()
    }

    /// Returns the declared argument sorts
    pub fn arg_sorts(&self) -> &[SortId] {
        &self.arg_sorts
    }
}

/// The declared sorts and symbols of a problem
///
/// Predicate index 0 is reserved for equality; it carries no argument sorts
/// of its own (an equality literal takes the sort of its sides) and is never
/// given SAT variables.
#[derive(Debug, Clone)]
pub struct Signature {
    sort_names: Vec<String>,
    functions: Vec<FunctionSymbol>,
    predicates: Vec<PredicateSymbol>,
}

impl Default for Signature {
    fn default() -> Self {
        Self::new()
    }
}

impl Signature {
    /// Creates a signature containing only the reserved equality predicate
    pub fn new() -> Self {
        Self {
            sort_names: Vec::new(),
            functions: Vec::new(),
            predicates: vec![PredicateSymbol {
                name: "=".to_string(),
                arg_sorts: Vec::new(),
            }],
        }
    }

    /// Declares a sort and returns its id
    pub fn add_sort(&mut self, name: &str) -> SortId {
        self.sort_names.push(name.to_string());
        (self.sort_names.len() - 1) as SortId
    }

    /// Declares a function symbol and returns its id
    pub fn add_function(&mut self, name: &str, arg_sorts: &[SortId], result_sort: SortId) -> FuncId {
        self.functions.push(FunctionSymbol {
            name: name.to_string(),
            arg_sorts: arg_sorts.to_vec(),
            result_sort,
            usage_count: 0,
        });
        (self.functions.len() - 1) as FuncId
    }

    /// Declares a predicate symbol and returns its id
    pub fn add_predicate(&mut self, name: &str, arg_sorts: &[SortId]) -> PredId {
        self.predicates.push(PredicateSymbol {
            name: name.to_string(),
            arg_sorts: arg_sorts.to_vec(),
        });
        (self.predicates.len() - 1) as PredId
    }

    /// Records the usage count of a function as seen by preprocessing
    pub fn set_function_usage(&mut self, f: FuncId, count: u32) {
        self.functions[f as usize].usage_count = count;
    }

    /// Returns the number of declared sorts
    pub fn sort_count(&self) -> u32 {
        self.sort_names.len() as u32
    }

    /// Returns the name of a sort
    pub fn sort_name(&self, sort: SortId) -> &str {
        &self.sort_names[sort as usize]
    }

    /// Returns the number of function symbols
    pub fn function_count(&self) -> u32 {
        self.functions.len() as u32
    }

    /// Returns the number of predicate symbols, including equality
    pub fn predicate_count(&self) -> u32 {
        self.predicates.len() as u32
    }

    /// Returns a function symbol
    pub fn function(&self, f: FuncId) -> &FunctionSymbol {
        &self.functions[f as usize]
    }

    /// Returns a predicate symbol
    pub fn predicate(&self, p: PredId) -> &PredicateSymbol {
        &self.predicates[p as usize]
    }

    /// Iterates over all function ids
    pub fn function_ids(&self) -> impl Iterator<Item = FuncId> + use<> {
        0..self.function_count()
    }

    /// Iterates over all predicate ids except the reserved equality
    pub fn predicate_ids(&self) -> impl Iterator<Item = PredId> + use<> {
        1..self.predicate_count()
    }
}
