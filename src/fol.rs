//! First-order signature and clause view
//!
//! The finder consumes clause sets that have already been clausified,
//! flattened, and variable-renamed by an upstream pipeline. This module
//! defines the read-only view of that input: symbols with declared sorts,
//! clauses as lists of literals over variables, and the bookkeeping tables
//! for symbols eliminated during preprocessing (kept around so the model
//! extractor can reconstruct their interpretations).

pub mod clause;
pub mod signature;

pub use clause::{Clause, DefFormula, FunctionDefinition, Literal, PredicateDefinition, Term};
pub use signature::{FunctionSymbol, PredicateSymbol, Signature};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// A clause variable, renamed to `0..var_count` within its clause
pub type Var = u32;

/// A declared sort in the input signature
pub type SortId = u32;

/// Index of a function symbol
pub type FuncId = u32;

/// Index of a predicate symbol; index 0 is reserved for equality
pub type PredId = u32;

/// The reserved predicate index for equality; never encoded
pub const EQUALITY: PredId = 0;

/// An ordering constraint between the cardinalities of two declared sorts
///
/// Produced by external function-relationship inference and consumed when
/// [`crate::solver::Options::detect_sort_bounds`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConstraint {
    /// The sort required to be at least as large (or strictly larger)
    pub larger: SortId,
    /// The sort bounded from above by `larger`
    pub smaller: SortId,
    /// Whether the constraint is `larger > smaller` rather than `>=`
    pub strict: bool,
}

/// A complete input to the finder
///
/// Holds the signature, the flattened clause set, and the tables of symbols
/// removed by preprocessing together with their definitions.
#[derive(Debug, Clone)]
pub struct Problem {
    signature: Signature,
    clauses: Vec<Clause>,
    deleted_functions: IndexMap<FuncId, FunctionDefinition>,
    deleted_predicates: IndexMap<PredId, PredicateDefinition>,
    partially_deleted_predicates: IndexMap<PredId, PredicateDefinition>,
    trivial_predicates: FxHashMap<PredId, bool>,
    declared_sort_bounds: FxHashMap<SortId, u32>,
    sort_equivalences: Vec<(SortId, SortId)>,
    sort_constraints: Vec<SortConstraint>,
    complete: bool,
}

impl Problem {
    /// Creates an empty problem over the given signature
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            clauses: Vec::new(),
            deleted_functions: IndexMap::new(),
            deleted_predicates: IndexMap::new(),
            partially_deleted_predicates: IndexMap::new(),
            trivial_predicates: FxHashMap::default(),
            declared_sort_bounds: FxHashMap::default(),
            sort_equivalences: Vec::new(),
            sort_constraints: Vec::new(),
            complete: true,
        }
    }

    /// Adds a clause to the problem
    pub fn add_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Records a function eliminated during preprocessing
    pub fn add_deleted_function(&mut self, f: FuncId, def: FunctionDefinition) {
        self.deleted_functions.insert(f, def);
    }

    /// Records a predicate eliminated during preprocessing
    pub fn add_deleted_predicate(&mut self, p: PredId, def: PredicateDefinition) {
        self.deleted_predicates.insert(p, def);
    }

    /// Records a predicate partially eliminated during preprocessing
    pub fn add_partially_deleted_predicate(&mut self, p: PredId, def: PredicateDefinition) {
        self.partially_deleted_predicates.insert(p, def);
    }

    /// Records a predicate discovered to be constantly true or false
    pub fn add_trivial_predicate(&mut self, p: PredId, value: bool) {
        self.trivial_predicates.insert(p, value);
    }

    /// Declares an upper bound on the cardinality of a sort
    pub fn add_sort_bound(&mut self, sort: SortId, bound: u32) {
        self.declared_sort_bounds.insert(sort, bound);
    }

    /// Records an externally inferred equivalence between two declared sorts
    pub fn add_sort_equivalence(&mut self, a: SortId, b: SortId) {
        self.sort_equivalences.push((a, b));
    }

    /// Records an externally inferred cardinality constraint
    pub fn add_sort_constraint(&mut self, constraint: SortConstraint) {
        self.sort_constraints.push(constraint);
    }

    /// Marks the problem as unsuitable for complete finite model finding
    ///
    /// Set when an upstream stage (for example an incomplete equality proxy)
    /// has weakened the clause set; the finder then reports Unknown rather
    /// than claiming a refutation.
    pub fn set_incomplete(&mut self) {
        self.complete = false;
    }

    /// Returns the signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the clauses
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns true if complete finite model finding is possible
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns true if some function was deleted by preprocessing
    pub fn is_deleted_function(&self, f: FuncId) -> bool {
        self.deleted_functions.contains_key(&f)
    }

    /// Returns true if some predicate was deleted by preprocessing
    pub fn is_deleted_predicate(&self, p: PredId) -> bool {
        self.deleted_predicates.contains_key(&p)
    }

    /// Returns the deleted-function table in insertion order
    pub fn deleted_functions(&self) -> &IndexMap<FuncId, FunctionDefinition> {
        &self.deleted_functions
    }

    /// Returns the deleted-predicate table in insertion order
    pub fn deleted_predicates(&self) -> &IndexMap<PredId, PredicateDefinition> {
        &self.deleted_predicates
    }

    /// Returns the partially-deleted-predicate table in insertion order
    pub fn partially_deleted_predicates(&self) -> &IndexMap<PredId, PredicateDefinition> {
        &self.partially_deleted_predicates
    }

    /// Returns the recorded value of a trivial predicate, if any
    pub fn trivial_predicate(&self, p: PredId) -> Option<bool> {
        self.trivial_predicates.get(&p).copied()
    }

    /// Returns the declared bound of a sort, if any
    pub fn declared_sort_bound(&self, sort: SortId) -> Option<u32> {
        self.declared_sort_bounds.get(&sort).copied()
    }

    /// Returns the externally supplied sort equivalences
    pub fn sort_equivalences(&self) -> &[(SortId, SortId)] {
        &self.sort_equivalences
    }

    /// Returns the externally supplied sort constraints
    pub fn sort_constraints(&self) -> &[SortConstraint] {
        &self.sort_constraints
    }

    /// Returns true if some input clause is empty
    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(|c| c.literals().is_empty())
    }
}
