//! SAT-variable allocation
//!
//! Maps every `(symbol, argument-tuple)` grounding onto a contiguous 1-based
//! variable block, functions first then predicates, with per-symbol base
//! offsets and precomputed stride tables. Marker variables parameterizing
//! the encoding by per-sort size are reserved after the symbol blocks.
//! Allocation fails when the cumulative offset would no longer fit in 32
//! bits.

use crate::fol::{FuncId, PredId, Signature};
use crate::sorts::bounds::DomainSizes;
use crate::sorts::inference::SortedSignature;
use crate::sorts::DistinctSort;

/// Reserved marker variables, by scheme
#[derive(Debug, Clone)]
enum Markers {
    /// One staircase block of `dom[ds]` markers per distinct sort
    XMass { offsets: Vec<u32> },
    /// One totality and one instance marker per distinct sort
    Plain { totality: u32, instances: u32 },
}

/// Allocates SAT variables for symbol groundings and markers
///
/// The mapping is deterministic given the size vector and the symbol order,
/// so tests can assert specific variable ids.
#[derive(Debug, Clone)]
pub struct VarAllocator {
    f_offsets: Vec<u32>,
    p_offsets: Vec<u32>,
    /// Per-slot strides; the variable of a grounding is
    /// `base + sum (g[i] - 1) * stride[i]`
    f_strides: Vec<Vec<u32>>,
    p_strides: Vec<Vec<u32>>,
    markers: Markers,
    marker_blocks: Vec<u32>,
    var_count: u32,
}

impl VarAllocator {
    /// Lays out variable blocks for all live symbols under the given sizes
    ///
    /// Returns `None` when more than `u32::MAX` variables would be needed.
    pub fn build(
        signature: &Signature,
        sorted: &SortedSignature,
        sizes: &DomainSizes,
        del_f: &[bool],
        del_p: &[bool],
        xmass: bool,
    ) -> Option<Self> {
        let mut next: u64 = 1;
        let nfuncs = signature.function_count() as usize;
        let npreds = signature.predicate_count() as usize;
        let mut f_offsets = vec![u32::MAX; nfuncs];
        let mut p_offsets = vec![u32::MAX; npreds];
        let mut f_strides = vec![Vec::new(); nfuncs];
        let mut p_strides = vec![Vec::new(); npreds];

        let mut reserve = |next: &mut u64, slots: &[u32]| -> Option<(u32, Vec<u32>)> {
            let base = *next;
            let mut strides = Vec::with_capacity(slots.len());
            let mut block: u64 = 1;
            for &rs in slots {
                strides.push(block as u32);
                block = block.checked_mul(sizes.refined(rs) as u64)?;
                if block > u32::MAX as u64 {
                    return None;
                }
            }
            *next = next.checked_add(block)?;
            if *next - 1 > u32::MAX as u64 {
                return None;
            }
            Some((base as u32, strides))
        };

        for f in signature.function_ids() {
            if del_f[f as usize] {
                continue;
            }
            let (base, strides) = reserve(&mut next, sorted.function_signature(f))?;
            f_offsets[f as usize] = base;
            f_strides[f as usize] = strides;
        }
        // Predicate 0 is equality and never encoded
        for p in signature.predicate_ids() {
            if del_p[p as usize] {
                continue;
            }
            let (base, strides) = reserve(&mut next, sorted.predicate_signature(p))?;
            p_offsets[p as usize] = base;
            p_strides[p as usize] = strides;
        }

        let distinct = sorted.distinct_count() as u64;
        let marker_blocks: Vec<u32> = sizes.distinct().to_vec();
        let markers = if xmass {
            let mut offsets = Vec::with_capacity(distinct as usize);
            for &dom in &marker_blocks {
                offsets.push(next as u32);
                next = next.checked_add(dom as u64)?;
                if next - 1 > u32::MAX as u64 {
                    return None;
                }
            }
            Markers::XMass { offsets }
        } else {
            let totality = next as u32;
            next = next.checked_add(distinct)?;
            let instances = next as u32;
            next = next.checked_add(distinct)?;
            if next - 1 > u32::MAX as u64 {
                return None;
            }
            Markers::Plain {
                totality,
                instances,
            }
        };

        Some(Self {
            f_offsets,
            p_offsets,
            f_strides,
            p_strides,
            markers,
            marker_blocks,
            var_count: (next - 1) as u32,
        })
    }

    /// Returns the total number of allocated variables
    pub fn var_count(&self) -> u32 {
        self.var_count
    }

    /// Returns the base variable of a live function's block
    pub fn function_base(&self, f: FuncId) -> u32 {
        self.f_offsets[f as usize]
    }

    /// Returns the base variable of a live predicate's block
    pub fn predicate_base(&self, p: PredId) -> u32 {
        self.p_offsets[p as usize]
    }

    /// Returns the literal for `f(grounding[..arity]) = grounding[arity]`
    ///
    /// Grounding values are 1-based domain elements.
    pub fn function_lit(&self, f: FuncId, grounding: &[u32], positive: bool) -> i32 {
        let strides = &self.f_strides[f as usize];
        debug_assert_eq!(grounding.len(), strides.len());
        let mut var = self.f_offsets[f as usize];
        for (i, &value) in grounding.iter().enumerate() {
            var += (value - 1) * strides[i];
        }
        if positive { var as i32 } else { -(var as i32) }
    }

    /// Returns the literal for `p(grounding)`
    pub fn predicate_lit(&self, p: PredId, grounding: &[u32], positive: bool) -> i32 {
        let strides = &self.p_strides[p as usize];
        debug_assert_eq!(grounding.len(), strides.len());
        let mut var = self.p_offsets[p as usize];
        for (i, &value) in grounding.iter().enumerate() {
            var += (value - 1) * strides[i];
        }
        if positive { var as i32 } else { -(var as i32) }
    }

    /// Returns the `index`-th staircase marker of a distinct sort (0-based)
    pub fn xmass_marker(&self, ds: DistinctSort, index: u32) -> u32 {
        match &self.markers {
            Markers::XMass { offsets } => {
                debug_assert!(index < self.marker_blocks[ds as usize]);
                offsets[ds as usize] + index
            }
            Markers::Plain { .. } => unreachable!("plain scheme has no staircase markers"),
        }
    }

    /// Returns the totality marker of a distinct sort
    pub fn totality_marker(&self, ds: DistinctSort) -> u32 {
        match &self.markers {
            Markers::Plain { totality, .. } => totality + ds,
            Markers::XMass { .. } => unreachable!("xmass scheme has no totality markers"),
        }
    }

    /// Returns the instance marker of a distinct sort
    pub fn instances_marker(&self, ds: DistinctSort) -> u32 {
        match &self.markers {
            Markers::Plain { instances, .. } => instances + ds,
            Markers::XMass { .. } => unreachable!("xmass scheme has no instance markers"),
        }
    }

    /// Returns the distinct sort owning an XMass marker variable
    pub fn xmass_marker_sort(&self, var: u32) -> Option<DistinctSort> {
        let Markers::XMass { offsets } = &self.markers else {
            return None;
        };
        for (ds, &offset) in offsets.iter().enumerate() {
            if var >= offset && var < offset + self.marker_blocks[ds] {
                return Some(ds as DistinctSort);
            }
        }
        None
    }

    /// Classifies a Plain-scheme marker variable
    ///
    /// Returns `(is_totality, sort)` for totality and instance markers.
    pub fn plain_marker_sort(&self, var: u32) -> Option<(bool, DistinctSort)> {
        let Markers::Plain {
            totality,
            instances,
        } = &self.markers
        else {
            return None;
        };
        let d = self.marker_blocks.len() as u32;
        if var >= *totality && var < totality + d {
            Some((true, var - totality))
        } else if var >= *instances && var < instances + d {
            Some((false, var - instances))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::{Clause, Literal, Problem};
    use crate::sorts::inference::SortInference;

    fn small_setup() -> (Problem, SortedSignature) {
        // Unary function f and binary predicate r, connected so that every
        // slot lands in one function-fed (hence unbounded) refined sort
        let mut sig = crate::fol::Signature::new();
        let s = sig.add_sort("S");
        let f = sig.add_function("f", &[s], s);
        let r = sig.add_predicate("r", &[s, s]);
        let mut problem = Problem::new(sig);
        problem.add_clause(Clause::new(
            2,
            vec![
                Literal::fun_eq(false, f, vec![0], 1),
                Literal::pred(true, r, vec![0, 1]),
            ],
        ));
        problem.add_clause(Clause::new(
            2,
            vec![
                Literal::fun_eq(false, f, vec![1], 0),
                Literal::pred(true, r, vec![0, 1]),
            ],
        ));
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        (problem, sorted)
    }

    #[test]
    fn blocks_are_contiguous() {
        let (problem, sorted) = small_setup();
        let sizes = DomainSizes::new(&sorted, 3);
        let alloc = VarAllocator::build(
            problem.signature(),
            &sorted,
            &sizes,
            &[false],
            &[false, false],
            false,
        )
        .unwrap();

        // f occupies 3 * 3 variables, r occupies 9 more
        assert_eq!(alloc.function_base(0), 1);
        assert_eq!(alloc.predicate_base(1), 10);
        assert_eq!(alloc.function_lit(0, &[1, 1], true), 1);
        assert_eq!(alloc.function_lit(0, &[3, 1], true), 3);
        assert_eq!(alloc.function_lit(0, &[1, 2], true), 4);
        assert_eq!(alloc.predicate_lit(1, &[1, 1], true), 10);
        assert_eq!(alloc.predicate_lit(1, &[2, 1], true), 11);
        assert_eq!(alloc.predicate_lit(1, &[1, 2], true), 13);
        assert_eq!(alloc.predicate_lit(1, &[3, 3], false), -18);

        // Plain markers follow the symbol blocks: T then I per sort
        assert_eq!(alloc.totality_marker(0), 19);
        assert_eq!(alloc.instances_marker(0), 20);
        assert_eq!(alloc.var_count(), 20);
        assert_eq!(alloc.plain_marker_sort(19), Some((true, 0)));
        assert_eq!(alloc.plain_marker_sort(20), Some((false, 0)));
        assert_eq!(alloc.plain_marker_sort(18), None);
    }

    #[test]
    fn xmass_markers_form_blocks() {
        let (problem, sorted) = small_setup();
        let sizes = DomainSizes::new(&sorted, 2);
        let alloc = VarAllocator::build(
            problem.signature(),
            &sorted,
            &sizes,
            &[false],
            &[false, false],
            true,
        )
        .unwrap();

        // 4 variables for f, 4 for r, then a block of dom = 2 markers
        assert_eq!(alloc.xmass_marker(0, 0), 9);
        assert_eq!(alloc.xmass_marker(0, 1), 10);
        assert_eq!(alloc.var_count(), 10);
        assert_eq!(alloc.xmass_marker_sort(9), Some(0));
        assert_eq!(alloc.xmass_marker_sort(10), Some(0));
        assert_eq!(alloc.xmass_marker_sort(8), None);
    }

    #[test]
    fn deleted_symbols_get_no_block() {
        let (problem, sorted) = small_setup();
        let sizes = DomainSizes::new(&sorted, 2);
        let alloc = VarAllocator::build(
            problem.signature(),
            &sorted,
            &sizes,
            &[true],
            &[false, false],
            false,
        )
        .unwrap();
        assert_eq!(alloc.function_base(0), u32::MAX);
        assert_eq!(alloc.predicate_base(1), 1);
    }

    #[test]
    fn huge_products_overflow() {
        // A 4-ary function over one sort at a size where size^5 > 2^32
        let mut sig = crate::fol::Signature::new();
        let s = sig.add_sort("S");
        let f = sig.add_function("f", &[s, s, s, s], s);
        let mut problem = Problem::new(sig);
        problem.add_clause(Clause::new(
            1,
            vec![Literal::fun_eq(true, f, vec![0, 0, 0, 0], 0)],
        ));
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        let sizes = DomainSizes::new(&sorted, 90);
        let alloc = VarAllocator::build(
            problem.signature(),
            &sorted,
            &sizes,
            &[false],
            &[false],
            false,
        );
        assert!(alloc.is_none());
    }
}
