//! Per-distinct-sort cardinality bounds and size vectors

use crate::fol::Problem;
use crate::sorts::inference::SortedSignature;
use crate::sorts::{DistinctSort, RefinedSort};

/// Hard cardinality limits per distinct sort
#[derive(Debug, Clone)]
pub struct SortBounds {
    maxs: Vec<u32>,
    mins: Vec<u32>,
}

impl SortBounds {
    /// Combines declared bounds, refinement bounds, and constant-count
    /// bounds into per-distinct-sort limits
    pub fn aggregate(problem: &Problem, sorted: &SortedSignature) -> Self {
        let d = sorted.distinct_count() as usize;
        let mut maxs = vec![u32::MAX; d];
        let mins = vec![1; d];

        // Largest refinement bound among member refined sorts; the reserved
        // equality sorts keep this at infinity unless every member is bounded
        let mut refinement = vec![0u32; d];
        let mut constants = vec![0u32; d];
        let mut functions = vec![0u32; d];
        for rs in 0..sorted.refined_count() {
            let ds = sorted.parent(rs) as usize;
            refinement[ds] = refinement[ds].max(sorted.sort_bound(rs));
            constants[ds] += sorted.sorted_constants(rs).len() as u32;
            functions[ds] += sorted.sorted_functions(rs).len() as u32;
        }
        for ds in 0..d {
            maxs[ds] = maxs[ds].min(refinement[ds]);
        }

        // Declared bounds apply to the whole distinct sort
        for ds in 0..d {
            for &declared in sorted.distinct_to_declared(ds as DistinctSort) {
                if let Some(bound) = problem.declared_sort_bound(declared) {
                    maxs[ds] = maxs[ds].min(bound);
                }
            }
        }

        // An EPR-like sort (no positive-arity function grounds into it) never
        // needs more elements than it has constants
        for ds in 0..d {
            if functions[ds] == 0 && constants[ds] > 0 {
                maxs[ds] = maxs[ds].min(constants[ds]);
            }
        }

        Self { maxs, mins }
    }

    /// Returns the maximum cardinality of a distinct sort
    pub fn max(&self, ds: DistinctSort) -> u32 {
        self.maxs[ds as usize]
    }

    /// Returns the minimum cardinality of a distinct sort
    pub fn min(&self, ds: DistinctSort) -> u32 {
        self.mins[ds as usize]
    }

    /// Returns the per-sort maxima
    pub fn maxs(&self) -> &[u32] {
        &self.maxs
    }
}

/// Ordering constraints between distinct-sort cardinalities
///
/// Both kinds are enforced to fixpoint on every size-vector change.
#[derive(Debug, Clone, Default)]
pub struct DistinctConstraints {
    nonstrict: Vec<(DistinctSort, DistinctSort)>,
    strict: Vec<(DistinctSort, DistinctSort)>,
}

impl DistinctConstraints {
    /// Translates declared-sort constraints onto distinct sorts
    ///
    /// Constraints naming sorts the problem never uses are dropped.
    pub fn from_problem(problem: &Problem, sorted: &SortedSignature) -> Self {
        let mut result = Self::default();
        for constraint in problem.sort_constraints() {
            let larger = sorted.declared_to_distinct(constraint.larger);
            let smaller = sorted.declared_to_distinct(constraint.smaller);
            if let (Some(larger), Some(smaller)) = (larger, smaller) {
                if constraint.strict {
                    result.strict.push((larger, smaller));
                } else {
                    result.nonstrict.push((larger, smaller));
                }
            }
        }
        result
    }

    /// Returns true if no constraints were recorded
    pub fn is_empty(&self) -> bool {
        self.nonstrict.is_empty() && self.strict.is_empty()
    }

    /// Returns the non-strict constraints `dom[a] >= dom[b]`
    pub fn nonstrict(&self) -> &[(DistinctSort, DistinctSort)] {
        &self.nonstrict
    }

    /// Returns the strict constraints `dom[a] > dom[b]`
    pub fn strict(&self) -> &[(DistinctSort, DistinctSort)] {
        &self.strict
    }

    /// Raises components of `dom` until every constraint holds
    pub fn enforce(&self, dom: &mut [u32]) {
        loop {
            let mut changed = false;
            for &(a, b) in &self.nonstrict {
                if dom[a as usize] < dom[b as usize] {
                    dom[a as usize] = dom[b as usize];
                    changed = true;
                }
            }
            for &(a, b) in &self.strict {
                if dom[a as usize] <= dom[b as usize] {
                    dom[a as usize] = dom[b as usize] + 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Returns the first violated constraint as `(a, b, strict)` if any
    pub fn first_violation(&self, dom: &[u32]) -> Option<(DistinctSort, DistinctSort, bool)> {
        for &(a, b) in &self.nonstrict {
            if dom[a as usize] < dom[b as usize] {
                return Some((a, b, false));
            }
        }
        for &(a, b) in &self.strict {
            if dom[a as usize] <= dom[b as usize] {
                return Some((a, b, true));
            }
        }
        None
    }
}

/// The current candidate cardinalities, per distinct and per refined sort
///
/// The refined size is derived: `min(sort_bound(rs), dom[parent(rs)])`.
#[derive(Debug, Clone)]
pub struct DomainSizes {
    distinct: Vec<u32>,
    refined: Vec<u32>,
}

impl DomainSizes {
    /// Creates a size vector with every distinct sort at `start_size`
    pub fn new(sorted: &SortedSignature, start_size: u32) -> Self {
        let mut sizes = Self {
            distinct: vec![start_size; sorted.distinct_count() as usize],
            refined: vec![0; sorted.refined_count() as usize],
        };
        sizes.rebuild(sorted);
        sizes
    }

    /// Returns the per-distinct-sort sizes
    pub fn distinct(&self) -> &[u32] {
        &self.distinct
    }

    /// Returns the size of a refined sort under the current vector
    pub fn refined(&self, rs: RefinedSort) -> u32 {
        self.refined[rs as usize]
    }

    /// Replaces the distinct-sort sizes and re-derives the refined sizes
    pub fn assign(&mut self, sorted: &SortedSignature, distinct: Vec<u32>) {
        debug_assert_eq!(distinct.len(), self.distinct.len());
        self.distinct = distinct;
        self.rebuild(sorted);
    }

    fn rebuild(&mut self, sorted: &SortedSignature) {
        for rs in 0..sorted.refined_count() {
            self.refined[rs as usize] = sorted
                .sort_bound(rs)
                .min(self.distinct[sorted.parent(rs) as usize]);
        }
    }
}
