//! The outer search loop over size vectors
//!
//! Each iteration allocates SAT variables for the current vector, encodes
//! the clause families, and asks the solver for a model whose every sort has
//! exactly the requested size. On UNSAT the failed-assumption set names the
//! markers that mattered; the driver either grows a single sort (staircase
//! scheme) or memoizes a constraint and walks the constraint store to the
//! next undominated vector. The store persists across iterations, the
//! solver and clause batch do not.

pub mod constraints;

pub use constraints::{Constraint, ConstraintSign, ConstraintStore};

use std::time::Instant;

use tracing::debug;

use crate::encoder::symmetry::build_orderings;
use crate::encoder::{EncodeSettings, Encoder, VarAllocator, WidgetOrder};
use crate::engine::{SatSolver, SolveResult};
use crate::fol::{Clause, Problem, Signature};
use crate::model::Interpretation;
use crate::solver::{Diagnostic, Outcome, Statistics};
use crate::sorts::bounds::{DistinctConstraints, DomainSizes, SortBounds};
use crate::sorts::inference::SortedSignature;

/// Search-relevant option values, extracted from the public options bag
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Initial per-sort cardinality
    pub start_size: u32,
    /// Use the staircase marker scheme
    pub xmass: bool,
    /// Derive EQ-only constraints instead of reading failed markers
    pub ignore_markers: bool,
    /// Weight constraints by SAT-call count instead of batch size
    pub no_priority: bool,
    /// Omit markers for monotonic sorts
    pub special_monot_encoding: bool,
    /// Controls the staircase-scheme alternation between growth heuristics
    pub size_weight_ratio: u32,
    /// Fraction of canonicity axioms to emit
    pub symmetry_ratio: f32,
    /// Shape of the grounded-term ordering
    pub widget_order: WidgetOrder,
    /// Wall-clock deadline, checked between SAT calls
    pub deadline: Option<Instant>,
}

/// Drives the search for a finite model
pub struct SearchDriver<'a> {
    signature: &'a Signature,
    problem: &'a Problem,
    clauses: &'a [Clause],
    sorted: &'a SortedSignature,
    bounds: &'a SortBounds,
    constraints: &'a DistinctConstraints,
    del_f: &'a [bool],
    del_p: &'a [bool],
    settings: SearchSettings,
    sizes: DomainSizes,
    store: ConstraintStore,
    alternator: u32,
    sat_calls: u32,
    stats: Statistics,
}

impl<'a> SearchDriver<'a> {
    /// Creates a driver positioned at the start size vector
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        signature: &'a Signature,
        problem: &'a Problem,
        clauses: &'a [Clause],
        sorted: &'a SortedSignature,
        bounds: &'a SortBounds,
        constraints: &'a DistinctConstraints,
        del_f: &'a [bool],
        del_p: &'a [bool],
        settings: SearchSettings,
    ) -> Self {
        let mut sizes = DomainSizes::new(sorted, settings.start_size);
        let mut dom = sizes.distinct().to_vec();
        constraints.enforce(&mut dom);
        sizes.assign(sorted, dom);
        Self {
            signature,
            problem,
            clauses,
            sorted,
            bounds,
            constraints,
            del_f,
            del_p,
            settings,
            sizes,
            store: ConstraintStore::new(),
            alternator: 0,
            sat_calls: 0,
            stats: Statistics::default(),
        }
    }

    /// Runs the search to a terminal outcome
    ///
    /// A fresh solver is requested from the factory for every size vector;
    /// the previous batch and solver are dropped first.
    pub fn run<S, F>(mut self, mut solver_factory: F) -> Outcome
    where
        S: SatSolver,
        F: FnMut() -> S,
    {
        loop {
            if let Some(deadline) = self.settings.deadline {
                if Instant::now() >= deadline {
                    return Outcome::Unknown {
                        diagnostic: Diagnostic::TimeLimit,
                        stats: self.stats,
                    };
                }
            }
            debug!(sizes = ?self.sizes.distinct(), "trying size vector");
            self.stats.iterations += 1;

            let encode_start = Instant::now();
            let Some(alloc) = VarAllocator::build(
                self.signature,
                self.sorted,
                &self.sizes,
                self.del_f,
                self.del_p,
                self.settings.xmass,
            ) else {
                return Outcome::Unknown {
                    diagnostic: Diagnostic::Overflow,
                    stats: self.stats,
                };
            };
            let orderings = build_orderings(
                self.signature,
                self.sorted,
                &self.sizes,
                self.settings.widget_order,
            );
            let batch = Encoder::new(
                self.signature,
                self.sorted,
                &self.sizes,
                &alloc,
                self.clauses,
                &orderings,
                self.del_f,
                EncodeSettings {
                    xmass: self.settings.xmass,
                    special_monot_encoding: self.settings.special_monot_encoding,
                    symmetry_ratio: self.settings.symmetry_ratio,
                },
            )
            .encode();
            let batch_size = batch.len() as u32;
            self.stats.num_variables = alloc.var_count();
            self.stats.num_clauses = batch_size;

            let mut solver = solver_factory();
            solver.ensure_var_count(alloc.var_count());
            for clause in &batch {
                solver.add_clause(clause);
            }
            drop(batch);
            self.stats.encoding_time += encode_start.elapsed();

            let assumptions = self.assumptions(&alloc);
            let solve_start = Instant::now();
            let result = solver.solve_under_assumptions(&assumptions);
            self.stats.solving_time += solve_start.elapsed();
            self.sat_calls += 1;

            match result {
                SolveResult::Sat => {
                    let model = Interpretation::extract(
                        &solver,
                        self.signature,
                        self.problem,
                        self.sorted,
                        &self.sizes,
                        &alloc,
                        self.del_f,
                        self.del_p,
                    );
                    return Outcome::Satisfiable {
                        model,
                        stats: self.stats,
                    };
                }
                SolveResult::Unknown => {
                    return Outcome::Unknown {
                        diagnostic: Diagnostic::SolverFailure,
                        stats: self.stats,
                    };
                }
                SolveResult::Unsat => {
                    let failed = solver.failed_assumptions();
                    let weight = if self.settings.no_priority {
                        self.sat_calls
                    } else {
                        batch_size
                    };
                    let advanced = if self.settings.xmass {
                        self.grow_one_sort(&alloc, &failed)
                    } else {
                        self.next_vector(&alloc, &failed, weight)
                    };
                    if !advanced {
                        return Outcome::Refutation { stats: self.stats };
                    }
                }
            }
        }
    }

    /// Assumption literals asking for a model of exactly the current sizes
    fn assumptions(&self, alloc: &VarAllocator) -> Vec<i32> {
        let dom = self.sizes.distinct();
        let mut assumptions = Vec::with_capacity(2 * dom.len());
        if self.settings.xmass {
            for (ds, &size) in dom.iter().enumerate() {
                assumptions.push(-(alloc.xmass_marker(ds as u32, size - 1) as i32));
            }
        } else {
            for ds in 0..dom.len() as u32 {
                assumptions.push(alloc.totality_marker(ds) as i32);
            }
            for ds in 0..dom.len() as u32 {
                assumptions.push(alloc.instances_marker(ds) as i32);
            }
        }
        assumptions
    }

    /// Staircase-scheme growth: bump the single most promising failed sort
    fn grow_one_sort(&mut self, alloc: &VarAllocator, failed: &[i32]) -> bool {
        self.alternator += 1;
        let mut dom = self.sizes.distinct().to_vec();

        let mut chosen = None;
        let mut best = u64::MAX;
        for &lit in failed {
            let Some(ds) = alloc.xmass_marker_sort(lit.unsigned_abs()) else {
                continue;
            };
            if dom[ds as usize] == self.bounds.max(ds) {
                continue;
            }
            let weight = if self.alternator % (self.settings.size_weight_ratio + 1) != 0 {
                dom[ds as usize] += 1;
                let estimate = self.estimate_instance_count(&dom);
                dom[ds as usize] -= 1;
                estimate
            } else {
                dom[ds as usize] as u64
            };
            if weight < best {
                best = weight;
                chosen = Some(ds);
            }
        }

        let Some(ds) = chosen else {
            return false;
        };
        debug!(sort = ds, "growing distinct sort");
        dom[ds as usize] += 1;
        self.constraints.enforce(&mut dom);
        self.sizes.assign(self.sorted, dom);
        true
    }

    /// How many instance clauses a candidate vector would generate
    fn estimate_instance_count(&self, dom: &[u32]) -> u64 {
        let mut total: u64 = 0;
        for index in 0..self.clauses.len() {
            let Some(var_sorts) = self.sorted.clause_var_sorts(index) else {
                continue;
            };
            let mut instances: u64 = 1;
            for &rs in var_sorts {
                let size = self
                    .sorted
                    .sort_bound(rs)
                    .min(dom[self.sorted.parent(rs) as usize]);
                instances = instances.saturating_mul(size as u64);
            }
            total = total.saturating_add(instances);
        }
        total
    }

    /// Constraint-scheme step: memoize the refuted pattern, then walk
    fn next_vector(&mut self, alloc: &VarAllocator, failed: &[i32], weight: u32) -> bool {
        let dom = self.sizes.distinct();
        let base_sign = if self.settings.ignore_markers {
            ConstraintSign::Eq
        } else {
            ConstraintSign::Star
        };
        let mut constraint = Constraint::uniform(base_sign, dom, weight);

        if !self.settings.ignore_markers {
            for &lit in failed {
                let Some((is_totality, ds)) = alloc.plain_marker_sort(lit.unsigned_abs()) else {
                    continue;
                };
                if is_totality {
                    // Totality was needed; for monotonic sorts any smaller
                    // size fails as well
                    let sign = if self.settings.special_monot_encoding
                        && self.sorted.is_monotonic(ds)
                    {
                        ConstraintSign::Leq
                    } else {
                        ConstraintSign::Eq
                    };
                    constraint.set_sign(ds, sign);
                } else if constraint.sign(ds) == ConstraintSign::Star {
                    // Instances were needed and totality told us nothing
                    constraint.set_sign(ds, ConstraintSign::Geq);
                }
            }
        }

        debug!(constraint = ?constraint, "adding constraint");
        self.store.insert(constraint);
        self.increase_model_sizes()
    }

    /// Walks the constraint store for the next undominated size vector
    fn increase_model_sizes(&mut self) -> bool {
        while let Some(generator) = self.store.peek_min().cloned() {
            let base = generator.sizes();
            for i in 0..base.len() {
                let mut candidate = base.clone();
                candidate[i] += 1;

                if candidate[i] > self.bounds.max(i as u32) {
                    continue;
                }
                if self.store.iter().any(|c| c.rules_out(&candidate)) {
                    continue;
                }
                if let Some((a, b, _)) = self.constraints.first_violation(&candidate) {
                    // Not a valid vector, but keep a generator here so the
                    // space behind the violated constraint stays reachable
                    let mut generator =
                        Constraint::uniform(ConstraintSign::Star, &candidate, generator.weight() + 1);
                    generator.set_sign(a, ConstraintSign::Eq);
                    generator.set_sign(b, ConstraintSign::Geq);
                    self.store.insert(generator);
                    continue;
                }

                self.sizes.assign(self.sorted, candidate);
                return true;
            }
            self.store.pop_min();
        }
        false
    }
}
