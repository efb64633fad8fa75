//! SAT encoding of a clause set at a fixed size vector
//!
//! Four clause families are emitted per iteration: ground clauses, instance
//! clauses (one per grounding of each non-ground clause), functional
//! definitions (a function maps each argument tuple to at most one value),
//! and totality definitions (to at least one value), followed by the
//! symmetry ordering and canonicity axioms. Marker literals woven into the
//! instance and totality families let the search driver ask for models of an
//! exact size and read back which sorts were responsible for failure.

pub mod alloc;
pub mod grounding;
pub mod symmetry;

pub use alloc::VarAllocator;
pub use grounding::GroundingIter;
pub use symmetry::{GroundedTerm, SymbolOrder, WidgetOrder};

use crate::fol::{Clause, Literal, Signature};
use crate::sorts::bounds::DomainSizes;
use crate::sorts::inference::SortedSignature;

/// Encoding options relevant to clause emission
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    /// Use the staircase marker scheme instead of totality/instance markers
    pub xmass: bool,
    /// Omit markers for sorts proved monotonic
    pub special_monot_encoding: bool,
    /// Fraction of canonicity axioms to emit
    pub symmetry_ratio: f32,
}

/// Emits the SAT clause batch for one size vector
pub struct Encoder<'a> {
    signature: &'a Signature,
    sorted: &'a SortedSignature,
    sizes: &'a DomainSizes,
    alloc: &'a VarAllocator,
    clauses: &'a [Clause],
    orderings: &'a [Vec<GroundedTerm>],
    del_f: &'a [bool],
    settings: EncodeSettings,
    batch: Vec<Vec<i32>>,
}

impl<'a> Encoder<'a> {
    /// Creates an encoder over the given context
    ///
    /// `clauses` must be the clause slice sort inference ran on, so that
    /// per-clause variable sorts line up by index.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        signature: &'a Signature,
        sorted: &'a SortedSignature,
        sizes: &'a DomainSizes,
        alloc: &'a VarAllocator,
        clauses: &'a [Clause],
        orderings: &'a [Vec<GroundedTerm>],
        del_f: &'a [bool],
        settings: EncodeSettings,
    ) -> Self {
        Self {
            signature,
            sorted,
            sizes,
            alloc,
            clauses,
            orderings,
            del_f,
            settings,
            batch: Vec::new(),
        }
    }

    /// Emits all clause families and returns the batch
    pub fn encode(mut self) -> Vec<Vec<i32>> {
        self.ground_clauses();
        self.instance_clauses();
        self.functional_definitions();
        self.totality_definitions();
        self.symmetry_axioms();
        self.batch
    }

    /// Removes duplicate literals and drops tautologies before recording
    fn push_clause(&mut self, mut lits: Vec<i32>) {
        lits.sort_unstable();
        lits.dedup();
        for &lit in &lits {
            if lit > 0 && lits.binary_search(&-lit).is_ok() {
                return;
            }
        }
        self.batch.push(lits);
    }

    /// Ground clauses consist of propositional symbols only, by flattening
    fn ground_clauses(&mut self) {
        let clauses = self.clauses;
        for clause in clauses.iter().filter(|c| c.is_ground()) {
            let mut lits = Vec::with_capacity(clause.literals().len());
            for literal in clause.literals() {
                match literal {
                    Literal::Pred {
                        positive,
                        predicate,
                        ..
                    } => lits.push(self.alloc.predicate_lit(*predicate, &[], *positive)),
                    _ => unreachable!("ground flattened clauses are propositional"),
                }
            }
            self.push_clause(lits);
        }
    }

    fn instance_clauses(&mut self) {
        let sorted = self.sorted;
        let clauses = self.clauses;
        let distinct = sorted.distinct_count() as usize;
        let mut marker_maxes = vec![0u32; distinct];
        let mut scratch: Vec<u32> = Vec::new();

        for (index, clause) in clauses.iter().enumerate() {
            if clause.is_ground() {
                continue;
            }
            // Clauses of two-variable equalities only are satisfiable by any
            // grounding merging the sides; they need no instances
            let Some(var_sorts) = sorted.clause_var_sorts(index) else {
                continue;
            };
            let limits: Vec<u32> = var_sorts.iter().map(|&rs| self.sizes.refined(rs)).collect();

            let mut iter = GroundingIter::new(limits);
            'grounding: while let Some(grounding) = iter.advance() {
                // Which sorts this instance actually reaches beyond element 1
                marker_maxes.fill(0);
                for (var, &value) in grounding.iter().enumerate() {
                    let ds = self.sorted.parent(var_sorts[var]) as usize;
                    if self.settings.special_monot_encoding
                        && self.sorted.is_monotonic(ds as u32)
                    {
                        continue;
                    }
                    marker_maxes[ds] = marker_maxes[ds].max(value);
                }
                let mut lits = Vec::with_capacity(distinct + clause.literals().len());
                for (ds, &value) in marker_maxes.iter().enumerate() {
                    if value > 1 {
                        let marker = if self.settings.xmass {
                            self.alloc.xmass_marker(ds as u32, value - 2)
                        } else {
                            self.alloc.instances_marker(ds as u32)
                        };
                        lits.push(-(marker as i32));
                    }
                }

                for literal in clause.literals() {
                    match literal {
                        Literal::VarEq {
                            positive,
                            left,
                            right,
                            ..
                        } => {
                            let equal =
                                grounding[*left as usize] == grounding[*right as usize];
                            if equal == *positive {
                                // The literal is true under this grounding
                                continue 'grounding;
                            }
                            // The literal is false; drop it from the instance
                        }
                        Literal::FunEq {
                            positive,
                            function,
                            args,
                            result,
                        } => {
                            scratch.clear();
                            scratch.extend(args.iter().map(|&v| grounding[v as usize]));
                            scratch.push(grounding[*result as usize]);
                            lits.push(self.alloc.function_lit(*function, &scratch, *positive));
                        }
                        Literal::Pred {
                            positive,
                            predicate,
                            args,
                        } => {
                            scratch.clear();
                            scratch.extend(args.iter().map(|&v| grounding[v as usize]));
                            lits.push(self.alloc.predicate_lit(*predicate, &scratch, *positive));
                        }
                    }
                }
                self.push_clause(lits);
            }
        }
    }

    /// `~F(x.., y) | ~F(x.., z)` for every grounding with `y < z`
    fn functional_definitions(&mut self) {
        let mut scratch: Vec<u32> = Vec::new();
        for f in self.signature.function_ids() {
            if self.del_f[f as usize] {
                continue;
            }
            let fsig = self.sorted.function_signature(f);
            let arity = self.signature.function(f).arity();
            let ret_size = self.sizes.refined(fsig[arity]);

            // Slots are [y, z, args..] so the symmetric half is skipped early
            let mut limits = Vec::with_capacity(arity + 2);
            limits.push(ret_size);
            limits.push(ret_size);
            limits.extend(fsig[..arity].iter().map(|&rs| self.sizes.refined(rs)));

            let mut iter = GroundingIter::new(limits);
            while let Some(grounding) = iter.advance() {
                if grounding[0] >= grounding[1] {
                    continue;
                }
                scratch.clear();
                scratch.extend_from_slice(&grounding[2..]);
                scratch.push(grounding[0]);
                let first = self.alloc.function_lit(f, &scratch, false);
                *scratch.last_mut().unwrap() = grounding[1];
                let second = self.alloc.function_lit(f, &scratch, false);
                self.push_clause(vec![first, second]);
            }
        }
    }

    /// Totality rows per argument grounding, guarded by markers so the
    /// driver can assume exact sizes; in XMass mode also the staircase
    fn totality_definitions(&mut self) {
        if self.settings.xmass {
            // Monotone staircase: M[k+1] -> M[k]
            for ds in 0..self.sorted.distinct_count() {
                let dom = self.sizes.distinct()[ds as usize];
                for k in 0..dom.saturating_sub(1) {
                    let lower = self.alloc.xmass_marker(ds, k) as i32;
                    let upper = self.alloc.xmass_marker(ds, k + 1) as i32;
                    self.push_clause(vec![lower, -upper]);
                }
            }
        }

        let mut scratch: Vec<u32> = Vec::new();
        for f in self.signature.function_ids() {
            if self.del_f[f as usize] {
                continue;
            }
            let fsig = self.sorted.function_signature(f);
            let arity = self.signature.function(f).arity();
            let ret = fsig[arity];
            let ret_sort = self.sorted.parent(ret);
            let max_size = self.sizes.refined(ret);

            let weakest_only = !self.settings.xmass
                || (self.settings.special_monot_encoding && self.sorted.is_monotonic(ret_sort));
            let first_row = if weakest_only { max_size } else { 1 };

            let limits: Vec<u32> = fsig[..arity]
                .iter()
                .map(|&rs| self.sizes.refined(rs))
                .collect();
            let mut iter = GroundingIter::new(limits);
            while let Some(grounding) = iter.advance() {
                for i in first_row..=max_size {
                    let mut lits = Vec::with_capacity(i as usize + 1);
                    for value in 1..=i {
                        scratch.clear();
                        scratch.extend_from_slice(grounding);
                        scratch.push(value);
                        lits.push(self.alloc.function_lit(f, &scratch, true));
                    }
                    if self.settings.xmass {
                        // The strongest row keeps the top marker even when the
                        // sort bound stops below the distinct-sort size
                        let dom = self.sizes.distinct()[ret_sort as usize];
                        let marker_idx = if i == max_size { dom - 1 } else { i - 1 };
                        lits.push(self.alloc.xmass_marker(ret_sort, marker_idx) as i32);
                    } else {
                        lits.push(-(self.alloc.totality_marker(ret_sort) as i32));
                    }
                    self.push_clause(lits);
                }
            }
        }
    }

    fn symmetry_axioms(&mut self) {
        for rs in 0..self.sorted.refined_count() {
            let max_size = self.sizes.refined(rs);
            for size in 1..=max_size {
                self.ordering_axiom(rs as usize, size);
                self.canonicity_axioms(rs as usize, size, max_size);
            }
        }
    }

    /// Restricted totality: the k-th grounded term takes a value in `1..=k`
    fn ordering_axiom(&mut self, rs: usize, size: u32) {
        let terms = &self.orderings[rs];
        if (terms.len() as u32) < size {
            return;
        }
        let term = &terms[(size - 1) as usize];
        let mut scratch = term.grounding.clone();
        scratch.push(0);
        let mut lits = Vec::with_capacity(size as usize);
        for value in 1..=size {
            *scratch.last_mut().unwrap() = value;
            lits.push(self.alloc.function_lit(term.function, &scratch, true));
        }
        self.push_clause(lits);
    }

    /// Canonicity: a constant may take value `size` only if some earlier
    /// grounded term already took `size - 1`
    fn canonicity_axioms(&mut self, rs: usize, size: u32, max_size: u32) {
        if size <= 1 {
            return;
        }
        let terms = &self.orderings[rs];
        let width =
            ((self.settings.symmetry_ratio * max_size as f32) as usize).min(terms.len());
        let mut clauses = Vec::new();
        for i in 1..width {
            let term = &terms[i];
            // The family stops at the first non-constant widget
            if !term.grounding.is_empty() {
                break;
            }
            let mut lits = vec![self.alloc.function_lit(term.function, &[size], false)];
            for earlier in &terms[..i] {
                let mut scratch = earlier.grounding.clone();
                scratch.push(size - 1);
                lits.push(self.alloc.function_lit(earlier.function, &scratch, true));
            }
            clauses.push(lits);
        }
        for lits in clauses {
            self.push_clause(lits);
        }
    }
}
