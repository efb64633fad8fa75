//! Sort refinement, monotonicity analysis, and per-sort bounds
//!
//! Declared sorts are split into finer refined sorts by tracking which
//! argument and result positions are connected through shared variables.
//! Distinct sorts group declared sorts that must share one finite domain.
//! The monotonicity analyzer decides, per declared sort, whether models can
//! absorb fresh domain elements, which both enables a guard-predicate
//! rewrite and relaxes the search constraints for such sorts.

pub mod bounds;
pub mod inference;
pub mod monotonicity;

pub use bounds::{DistinctConstraints, DomainSizes, SortBounds};
pub use inference::{SortInference, SortedSignature};
pub use monotonicity::Monotonicity;

/// A refined sort produced by sort inference
pub type RefinedSort = u32;

/// A distinct sort: an equivalence class of declared sorts sharing a domain
pub type DistinctSort = u32;
