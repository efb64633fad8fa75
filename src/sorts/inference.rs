//! Sort inference over flattened clause sets
//!
//! Treats every `(symbol, argument-slot)` pair as a node and unions two nodes
//! whenever one clause variable occupies both slots. The resulting classes
//! are the refined sorts; each descends from the distinct sort of the
//! declared sort it was built from. One extra refined sort per distinct sort
//! is reserved for variables whose sort is witnessed only by a two-variable
//! equality.

use crate::fol::{Clause, FuncId, Literal, PredId, Problem, Signature, SortId};
use crate::sorts::{DistinctSort, RefinedSort};

/// Union-find over slot nodes with path halving
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb as usize] = ra;
        }
    }
}

/// The refined signature produced by sort inference
///
/// All tables are read-only after construction, except the monotonicity
/// flags which are filled in by the finder once the analyzer has run.
#[derive(Debug, Clone)]
pub struct SortedSignature {
    refined_count: u32,
    distinct_count: u32,
    /// Parent distinct sort per refined sort
    parents: Vec<DistinctSort>,
    /// Upper cardinality bound per refined sort, `u32::MAX` when unbounded
    sort_bounds: Vec<u32>,
    /// Reserved refined sort per distinct sort for otherwise-unsorted
    /// two-variable equalities
    var_eq_sorts: Vec<RefinedSort>,
    /// Refined sorts of each live function: argument slots then result slot
    function_signatures: Vec<Vec<RefinedSort>>,
    /// Refined sorts of each live predicate's argument slots
    predicate_signatures: Vec<Vec<RefinedSort>>,
    /// Constants whose result lies in each refined sort
    sorted_constants: Vec<Vec<FuncId>>,
    /// Positive-arity functions whose result lies in each refined sort
    sorted_functions: Vec<Vec<FuncId>>,
    declared_to_distinct: Vec<Option<DistinctSort>>,
    distinct_to_declared: Vec<Vec<SortId>>,
    monotonic: Vec<bool>,
    /// Refined sort of each clause variable, indexed by clause position;
    /// `None` for clauses consisting solely of two-variable equalities
    clause_var_sorts: Vec<Option<Vec<RefinedSort>>>,
}

impl SortedSignature {
    /// Returns the number of refined sorts
    pub fn refined_count(&self) -> u32 {
        self.refined_count
    }

    /// Returns the number of distinct sorts
    pub fn distinct_count(&self) -> u32 {
        self.distinct_count
    }

    /// Returns the parent distinct sort of a refined sort
    pub fn parent(&self, rs: RefinedSort) -> DistinctSort {
        self.parents[rs as usize]
    }

    /// Returns the cardinality bound of a refined sort
    pub fn sort_bound(&self, rs: RefinedSort) -> u32 {
        self.sort_bounds[rs as usize]
    }

    /// Returns the reserved two-variable-equality sort of a distinct sort
    pub fn var_eq_sort(&self, ds: DistinctSort) -> RefinedSort {
        self.var_eq_sorts[ds as usize]
    }

    /// Returns the refined signature of a function: argument sorts then
    /// result sort
    pub fn function_signature(&self, f: FuncId) -> &[RefinedSort] {
        &self.function_signatures[f as usize]
    }

    /// Returns the refined signature of a predicate
    pub fn predicate_signature(&self, p: PredId) -> &[RefinedSort] {
        &self.predicate_signatures[p as usize]
    }

    /// Returns the constants of a refined sort
    pub fn sorted_constants(&self, rs: RefinedSort) -> &[FuncId] {
        &self.sorted_constants[rs as usize]
    }

    /// Returns the positive-arity functions returning into a refined sort
    pub fn sorted_functions(&self, rs: RefinedSort) -> &[FuncId] {
        &self.sorted_functions[rs as usize]
    }

    /// Reorders the symmetry candidates of every refined sort
    pub fn sort_symbols_by<F>(&mut self, mut key: F)
    where
        F: FnMut(FuncId) -> u32,
    {
        for constants in &mut self.sorted_constants {
            constants.sort_by_key(|&f| std::cmp::Reverse(key(f)));
        }
        for functions in &mut self.sorted_functions {
            functions.sort_by_key(|&f| std::cmp::Reverse(key(f)));
        }
    }

    /// Returns the distinct sort a declared sort maps to, if it is used
    pub fn declared_to_distinct(&self, sort: SortId) -> Option<DistinctSort> {
        self.declared_to_distinct.get(sort as usize).copied().flatten()
    }

    /// Returns the declared sorts merged into a distinct sort
    pub fn distinct_to_declared(&self, ds: DistinctSort) -> &[SortId] {
        &self.distinct_to_declared[ds as usize]
    }

    /// Returns whether a distinct sort was proved monotonic
    pub fn is_monotonic(&self, ds: DistinctSort) -> bool {
        self.monotonic[ds as usize]
    }

    /// Records the monotonicity verdict per distinct sort
    pub fn set_monotonic(&mut self, flags: Vec<bool>) {
        debug_assert_eq!(flags.len(), self.distinct_count as usize);
        self.monotonic = flags;
    }

    /// Returns the refined sort of each variable of a clause
    ///
    /// `None` when the clause consists solely of two-variable equalities.
    pub fn clause_var_sorts(&self, clause_index: usize) -> Option<&[RefinedSort]> {
        self.clause_var_sorts[clause_index].as_deref()
    }
}

/// Runs sort inference over a problem
pub struct SortInference;

impl SortInference {
    /// Computes the refined signature of a clause set
    ///
    /// `sig` is the working signature (it may carry symbols the monotonicity
    /// rewrite introduced on top of the problem's own); `equivalences` lists
    /// externally inferred pairs of declared sorts that must share one
    /// distinct sort.
    pub fn apply(
        sig: &Signature,
        problem: &Problem,
        clauses: &[Clause],
        equivalences: &[(SortId, SortId)],
    ) -> SortedSignature {
        let nfuncs = sig.function_count() as usize;
        let npreds = sig.predicate_count() as usize;

        // Lay out one node per (symbol, slot); functions carry an extra slot
        // for the result. Deleted symbols and equality get no nodes.
        let mut func_slots = vec![u32::MAX; nfuncs];
        let mut pred_slots = vec![u32::MAX; npreds];
        let mut slot_sorts: Vec<SortId> = Vec::new();
        for f in sig.function_ids() {
            if problem.is_deleted_function(f) {
                continue;
            }
            func_slots[f as usize] = slot_sorts.len() as u32;
            let symbol = sig.function(f);
            slot_sorts.extend_from_slice(symbol.arg_sorts());
            slot_sorts.push(symbol.result_sort());
        }
        for p in sig.predicate_ids() {
            if problem.is_deleted_predicate(p) {
                continue;
            }
            pred_slots[p as usize] = slot_sorts.len() as u32;
            slot_sorts.extend_from_slice(sig.predicate(p).arg_sorts());
        }

        // Union slots that share a variable within one clause
        let mut uf = UnionFind::new(slot_sorts.len());
        let mut var_slot: Vec<u32> = Vec::new();
        for clause in clauses {
            var_slot.clear();
            var_slot.resize(clause.var_count() as usize, u32::MAX);
            let mut join = |uf: &mut UnionFind, var: u32, slot: u32| {
                let seen = &mut var_slot[var as usize];
                if *seen == u32::MAX {
                    *seen = slot;
                } else {
                    uf.union(*seen, slot);
                }
            };
            for literal in clause.literals() {
                match literal {
                    Literal::FunEq {
                        function,
                        args,
                        result,
                        ..
                    } => {
                        let base = func_slots[*function as usize];
                        for (i, &arg) in args.iter().enumerate() {
                            join(&mut uf, arg, base + i as u32);
                        }
                        join(&mut uf, *result, base + args.len() as u32);
                    }
                    Literal::Pred {
                        predicate, args, ..
                    } => {
                        let base = pred_slots[*predicate as usize];
                        for (i, &arg) in args.iter().enumerate() {
                            join(&mut uf, arg, base + i as u32);
                        }
                    }
                    Literal::VarEq { .. } => {}
                }
            }
        }

        // Distinct sorts: classes of declared sorts under the externally
        // supplied equivalences, restricted to sorts the problem uses
        let nsorts = sig.sort_count() as usize;
        let mut sort_uf = UnionFind::new(nsorts);
        for &(a, b) in equivalences {
            sort_uf.union(a, b);
        }
        let mut used = vec![false; nsorts];
        for &s in &slot_sorts {
            used[s as usize] = true;
        }
        for clause in clauses {
            for literal in clause.literals() {
                if let Literal::VarEq { sort, .. } = literal {
                    used[*sort as usize] = true;
                }
            }
        }
        let mut declared_to_distinct = vec![None; nsorts];
        let mut distinct_to_declared: Vec<Vec<SortId>> = Vec::new();
        for s in 0..nsorts as u32 {
            if !used[s as usize] {
                continue;
            }
            let root = sort_uf.find(s) as usize;
            let ds = match declared_to_distinct[root] {
                Some(ds) => ds,
                None => {
                    let ds = distinct_to_declared.len() as DistinctSort;
                    distinct_to_declared.push(Vec::new());
                    declared_to_distinct[root] = Some(ds);
                    ds
                }
            };
            declared_to_distinct[s as usize] = Some(ds);
            distinct_to_declared[ds as usize].push(s);
        }
        let distinct_count = distinct_to_declared.len() as u32;

        // Number the refined sorts in slot-discovery order
        let mut slot_refined = vec![u32::MAX; slot_sorts.len()];
        let mut parents: Vec<DistinctSort> = Vec::new();
        let mut sort_bounds: Vec<u32> = Vec::new();
        for slot in 0..slot_sorts.len() as u32 {
            let root = uf.find(slot);
            let declared = slot_sorts[slot as usize];
            let parent = declared_to_distinct[declared as usize]
                .expect("slot sorts are marked as used");
            let rs = if slot_refined[root as usize] == u32::MAX {
                let rs = parents.len() as RefinedSort;
                parents.push(parent);
                sort_bounds.push(u32::MAX);
                slot_refined[root as usize] = rs;
                rs
            } else {
                slot_refined[root as usize]
            };
            debug_assert_eq!(parents[rs as usize], parent, "ill-sorted clause set");
            slot_refined[slot as usize] = rs;
            if let Some(bound) = problem.declared_sort_bound(declared) {
                let entry = &mut sort_bounds[rs as usize];
                *entry = (*entry).min(bound);
            }
        }

        // One reserved refined sort per distinct sort, with no declared bound
        let mut var_eq_sorts = Vec::with_capacity(distinct_count as usize);
        for ds in 0..distinct_count {
            var_eq_sorts.push(parents.len() as RefinedSort);
            parents.push(ds);
            sort_bounds.push(u32::MAX);
        }
        let refined_count = parents.len() as u32;

        // Per-symbol refined signatures and per-sort symbol lists
        let mut function_signatures = vec![Vec::new(); nfuncs];
        let mut predicate_signatures = vec![Vec::new(); npreds];
        let mut sorted_constants = vec![Vec::new(); refined_count as usize];
        let mut sorted_functions = vec![Vec::new(); refined_count as usize];
        for f in sig.function_ids() {
            let base = func_slots[f as usize];
            if base == u32::MAX {
                continue;
            }
            let arity = sig.function(f).arity();
            let fsig: Vec<RefinedSort> = (0..=arity)
                .map(|i| slot_refined[(base + i as u32) as usize])
                .collect();
            let ret = fsig[arity];
            if arity == 0 {
                sorted_constants[ret as usize].push(f);
            } else {
                sorted_functions[ret as usize].push(f);
            }
            function_signatures[f as usize] = fsig;
        }
        for p in sig.predicate_ids() {
            let base = pred_slots[p as usize];
            if base == u32::MAX {
                continue;
            }
            let arity = sig.predicate(p).arity();
            predicate_signatures[p as usize] = (0..arity)
                .map(|i| slot_refined[(base + i as u32) as usize])
                .collect();
        }

        // A refined sort reached by no positive-arity function holds at most
        // as many relevant elements as it has constants
        for rs in 0..refined_count {
            if var_eq_sorts.contains(&rs) {
                continue;
            }
            if sorted_functions[rs as usize].is_empty() {
                let reachable = (sorted_constants[rs as usize].len() as u32).max(1);
                let entry = &mut sort_bounds[rs as usize];
                *entry = (*entry).min(reachable);
            }
        }

        let mut sorted = SortedSignature {
            refined_count,
            distinct_count,
            parents,
            sort_bounds,
            var_eq_sorts,
            function_signatures,
            predicate_signatures,
            sorted_constants,
            sorted_functions,
            declared_to_distinct: {
                // Re-derive the per-sort mapping (roots were used as keys above)
                let mut map = vec![None; nsorts];
                for (ds, members) in distinct_to_declared.iter().enumerate() {
                    for &s in members {
                        map[s as usize] = Some(ds as DistinctSort);
                    }
                }
                map
            },
            distinct_to_declared,
            monotonic: vec![false; distinct_count as usize],
            clause_var_sorts: Vec::new(),
        };

        sorted.clause_var_sorts = clauses
            .iter()
            .map(|c| Self::variable_sorts(c, &sorted))
            .collect();
        sorted
    }

    /// Computes the refined sort of every variable of a clause
    ///
    /// Function equalities determine their argument and result variables,
    /// predicate literals their arguments; two-variable equalities inherit
    /// from either side or fall back to the reserved sort of their declared
    /// sort's distinct parent.
    fn variable_sorts(clause: &Clause, sorted: &SortedSignature) -> Option<Vec<RefinedSort>> {
        if clause.literals().is_empty() || clause.only_var_equalities() {
            return None;
        }
        let vars = clause.var_count() as usize;
        let mut result = vec![u32::MAX; vars];
        let mut var_equalities = Vec::new();
        for literal in clause.literals() {
            match literal {
                Literal::FunEq {
                    function,
                    args,
                    result: res_var,
                    ..
                } => {
                    let fsig = sorted.function_signature(*function);
                    for (i, &arg) in args.iter().enumerate() {
                        result[arg as usize] = fsig[i];
                    }
                    result[*res_var as usize] = fsig[args.len()];
                }
                Literal::Pred {
                    predicate, args, ..
                } => {
                    let psig = sorted.predicate_signature(*predicate);
                    for (i, &arg) in args.iter().enumerate() {
                        result[arg as usize] = psig[i];
                    }
                }
                Literal::VarEq { .. } => var_equalities.push(literal),
            }
        }
        for literal in var_equalities {
            let Literal::VarEq {
                left, right, sort, ..
            } = literal
            else {
                unreachable!()
            };
            let (l, r) = (*left as usize, *right as usize);
            if result[l] != u32::MAX {
                if result[r] == u32::MAX {
                    result[r] = result[l];
                }
            } else if result[r] != u32::MAX {
                result[l] = result[r];
            } else {
                let ds = sorted
                    .declared_to_distinct(*sort)
                    .expect("equality sorts are marked as used");
                let rs = sorted.var_eq_sort(ds);
                result[l] = rs;
                result[r] = rs;
            }
        }
        debug_assert!(result.iter().all(|&rs| rs != u32::MAX));
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::Signature;

    fn constants_problem() -> Problem {
        // Constants a, b and a unary predicate q over one sort, with the
        // flattened clauses { a != X | q(X) } and { b != X | ~q(X) }
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let a = sig.add_function("a", &[], s);
        let b = sig.add_function("b", &[], s);
        let q = sig.add_predicate("q", &[s]);
        let mut problem = Problem::new(sig);
        problem.add_clause(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, a, vec![], 0),
                Literal::pred(true, q, vec![0]),
            ],
        ));
        problem.add_clause(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, b, vec![], 0),
                Literal::pred(false, q, vec![0]),
            ],
        ));
        problem
    }

    #[test]
    fn shared_variables_merge_slots() {
        let problem = constants_problem();
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);

        // a.result, b.result and q.0 collapse into one refined sort, plus
        // the reserved equality sort of the single distinct sort
        assert_eq!(sorted.distinct_count(), 1);
        assert_eq!(sorted.refined_count(), 2);
        let rs = sorted.function_signature(0)[0];
        assert_eq!(sorted.function_signature(1)[0], rs);
        assert_eq!(sorted.predicate_signature(1)[0], rs);
        assert_ne!(sorted.var_eq_sort(0), rs);
    }

    #[test]
    fn constant_only_sorts_are_bounded() {
        let problem = constants_problem();
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        let rs = sorted.function_signature(0)[0];
        assert_eq!(sorted.sort_bound(rs), 2);
        assert_eq!(sorted.sort_bound(sorted.var_eq_sort(0)), u32::MAX);
        assert_eq!(sorted.sorted_constants(rs), &[0, 1]);
        assert!(sorted.sorted_functions(rs).is_empty());
    }

    #[test]
    fn function_results_stay_unbounded() {
        // Constant c, unary f, unary predicate e all over one refined sort
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let c = sig.add_function("c", &[], s);
        let f = sig.add_function("f", &[s], s);
        let e = sig.add_predicate("e", &[s]);
        let mut problem = Problem::new(sig);
        // { c != X | e(X) }
        problem.add_clause(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, c, vec![], 0),
                Literal::pred(true, e, vec![0]),
            ],
        ));
        // { f(X) != Y | ~e(Y) | e(X) }
        problem.add_clause(Clause::new(
            2,
            vec![
                Literal::fun_eq(false, f, vec![0], 1),
                Literal::pred(false, e, vec![1]),
                Literal::pred(true, e, vec![0]),
            ],
        ));
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        let rs = sorted.function_signature(c)[0];
        assert_eq!(sorted.function_signature(f), &[rs, rs]);
        assert_eq!(sorted.sort_bound(rs), u32::MAX);
        assert_eq!(sorted.sorted_functions(rs), &[f]);
    }

    #[test]
    fn var_equalities_fall_back_to_reserved_sort() {
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let p = sig.add_predicate("p", &[s]);
        let mut problem = Problem::new(sig);
        // { X != Y | p(X) }: Y inherits X's sort through the equality
        problem.add_clause(Clause::new(
            2,
            vec![
                Literal::var_eq(false, 0, 1, s),
                Literal::pred(true, p, vec![0]),
            ],
        ));
        // { X = Y }: both variables take the reserved sort
        problem.add_clause(Clause::new(2, vec![Literal::var_eq(true, 0, 1, s)]));

        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        let rs = sorted.predicate_signature(p)[0];
        let vars = sorted.clause_var_sorts(0).unwrap();
        assert_eq!(vars, &[rs, rs]);
        assert!(sorted.clause_var_sorts(1).is_none());
    }

    #[test]
    fn equivalences_merge_distinct_sorts() {
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let t = sig.add_sort("T");
        let p = sig.add_predicate("p", &[s]);
        let q = sig.add_predicate("q", &[t]);
        let mut problem = Problem::new(sig);
        problem.add_clause(Clause::new(1, vec![Literal::pred(true, p, vec![0])]));
        problem.add_clause(Clause::new(1, vec![Literal::pred(true, q, vec![0])]));

        let separate = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        assert_eq!(separate.distinct_count(), 2);

        let merged =
            SortInference::apply(problem.signature(), &problem, problem.clauses(), &[(s, t)]);
        assert_eq!(merged.distinct_count(), 1);
        // Slots stay refined apart even though the parents merged
        assert_ne!(
            merged.predicate_signature(p)[0],
            merged.predicate_signature(q)[0]
        );
    }
}
