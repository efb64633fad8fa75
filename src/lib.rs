//! # fmf-rs
//!
//! A SAT-based finite model finder for multi-sorted first-order logic.
//!
//! Given a set of flattened first-order clauses, the finder searches for a
//! finite interpretation satisfying them by encoding the problem into
//! propositional satisfiability at successive domain sizes. Sorts are refined
//! by a unification-class analysis, per-sort cardinalities are explored by a
//! constraint-driven search that never revisits a size vector dominated by an
//! already-refuted one, and satisfying SAT assignments are decoded back into
//! total interpretations of the original signature.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fmf_rs::fol::{Literal, Clause, Problem, Signature};
//! use fmf_rs::solver::{Finder, Options, Outcome};
//!
//! // Signature: one sort, constants a and b, unary predicate q
//! let mut sig = Signature::new();
//! let s = sig.add_sort("S");
//! let a = sig.add_function("a", &[], s);
//! let b = sig.add_function("b", &[], s);
//! let q = sig.add_predicate("q", &[s]);
//!
//! // Clauses (flattened): { a != X | q(X) }, { b != X | ~q(X) }
//! let mut problem = Problem::new(sig);
//! problem.add_clause(Clause::new(1, vec![
//!     Literal::fun_eq(false, a, vec![], 0),
//!     Literal::pred(true, q, vec![0]),
//! ]));
//! problem.add_clause(Clause::new(1, vec![
//!     Literal::fun_eq(false, b, vec![], 0),
//!     Literal::pred(false, q, vec![0]),
//! ]));
//!
//! let finder = Finder::new(Options::default())?;
//! match finder.solve(&problem)? {
//!     Outcome::Satisfiable(model) => println!("{}", model),
//!     other => println!("{:?}", other),
//! }
//! ```

#![warn(missing_docs)]

/// First-order signature and clause view
pub mod fol;

/// Sort refinement, monotonicity analysis, and per-sort bounds
pub mod sorts;

/// SAT solver trait and backend adapters
pub mod engine;

/// SAT-variable allocation and clause-family encoding
pub mod encoder;

/// Search over size vectors with a memoized constraint store
pub mod search;

/// Finite interpretations and their extraction from SAT assignments
pub mod model;

/// Main finder API
pub mod solver;

/// Error types
pub mod error {
    //! Error types for fmf-rs

    use thiserror::Error;

    /// Errors that can occur while setting up a finder
    #[derive(Error, Debug)]
    pub enum FmfError {
        /// Conflicting or out-of-range option values
        #[error("configuration error: {0}")]
        Configuration(String),
    }

    /// Result type for fmf-rs operations
    pub type Result<T> = std::result::Result<T, FmfError>;
}

// Re-export commonly used types
pub use error::{FmfError, Result};
