//! Finite interpretations and their extraction from SAT assignments
//!
//! On a SAT answer the driver reads back the assignment of every
//! `(symbol, argument-tuple)` variable into total per-symbol tables, then
//! evaluates the symbols preprocessing removed by grounding their stored
//! definitions against the tables already built.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::encoder::{GroundingIter, VarAllocator};
use crate::engine::SatSolver;
use crate::fol::{DefFormula, FuncId, PredId, Problem, Signature, Term, Var};
use crate::sorts::bounds::DomainSizes;
use crate::sorts::inference::SortedSignature;
use crate::sorts::DistinctSort;

/// A total finite interpretation of the input signature
#[derive(Debug, Clone, Default)]
pub struct Interpretation {
    distinct_sizes: Vec<u32>,
    declared_sizes: Vec<u32>,
    sort_names: Vec<String>,
    function_names: Vec<String>,
    predicate_names: Vec<String>,
    constants: FxHashMap<FuncId, u32>,
    functions: FxHashMap<FuncId, FxHashMap<Vec<u32>, u32>>,
    propositions: FxHashMap<PredId, bool>,
    predicates: FxHashMap<PredId, FxHashMap<Vec<u32>, bool>>,
}

impl Interpretation {
    /// Reads a satisfying assignment back into symbol tables
    #[allow(clippy::too_many_arguments)]
    pub fn extract<S: SatSolver>(
        solver: &S,
        signature: &Signature,
        problem: &Problem,
        sorted: &SortedSignature,
        sizes: &DomainSizes,
        alloc: &VarAllocator,
        del_f: &[bool],
        del_p: &[bool],
    ) -> Self {
        let mut model = Self {
            distinct_sizes: sizes.distinct().to_vec(),
            declared_sizes: (0..signature.sort_count())
                .map(|s| {
                    sorted
                        .declared_to_distinct(s)
                        .map_or(0, |ds| sizes.distinct()[ds as usize])
                })
                .collect(),
            sort_names: (0..signature.sort_count())
                .map(|s| signature.sort_name(s).to_string())
                .collect(),
            function_names: signature
                .function_ids()
                .map(|f| signature.function(f).name().to_string())
                .collect(),
            predicate_names: (0..signature.predicate_count())
                .map(|p| signature.predicate(p).name().to_string())
                .collect(),
            ..Self::default()
        };

        // Live functions: the unique value per argument tuple, asserted
        // unique by the functional definitions
        for f in signature.function_ids() {
            if del_f[f as usize] {
                continue;
            }
            let fsig = sorted.function_signature(f);
            let arity = signature.function(f).arity();
            let ret_size = sizes.refined(fsig[arity]);
            let limits: Vec<u32> = fsig[..arity].iter().map(|&rs| sizes.refined(rs)).collect();
            let mut iter = GroundingIter::new(limits);
            let mut scratch: Vec<u32> = Vec::new();
            while let Some(grounding) = iter.advance() {
                for value in 1..=ret_size {
                    scratch.clear();
                    scratch.extend_from_slice(grounding);
                    scratch.push(value);
                    let var = alloc.function_lit(f, &scratch, true) as u32;
                    if solver.value_of(var) {
                        if arity == 0 {
                            model.constants.insert(f, value);
                        } else {
                            model
                                .functions
                                .entry(f)
                                .or_default()
                                .insert(grounding.to_vec(), value);
                        }
                        break;
                    }
                }
                // A missing value can only result from sort bounding; the
                // argument collapses onto a smaller element in that case
            }
        }

        // Live predicates; trivial predicates use their recorded value
        for p in signature.predicate_ids() {
            if del_p[p as usize] || problem.partially_deleted_predicates().contains_key(&p) {
                continue;
            }
            let psig = sorted.predicate_signature(p);
            let arity = signature.predicate(p).arity();
            let trivial = problem.trivial_predicate(p);
            if arity == 0 {
                let value = trivial
                    .unwrap_or_else(|| solver.value_of(alloc.predicate_lit(p, &[], true) as u32));
                model.propositions.insert(p, value);
                continue;
            }
            let limits: Vec<u32> = psig.iter().map(|&rs| sizes.refined(rs)).collect();
            let mut iter = GroundingIter::new(limits);
            while let Some(grounding) = iter.advance() {
                let value = trivial.unwrap_or_else(|| {
                    solver.value_of(alloc.predicate_lit(p, grounding, true) as u32)
                });
                model
                    .predicates
                    .entry(p)
                    .or_default()
                    .insert(grounding.to_vec(), value);
            }
        }

        model.evaluate_deleted_functions(signature, problem);
        model.evaluate_deleted_predicates(signature, problem);
        model
    }

    /// Evaluates functions removed by preprocessing from their stored
    /// definitions, most recently introduced first
    fn evaluate_deleted_functions(&mut self, signature: &Signature, problem: &Problem) {
        let mut ids: Vec<FuncId> = problem.deleted_functions().keys().copied().collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        for f in ids {
            let def = &problem.deleted_functions()[&f];
            let symbol = signature.function(f);
            let limits: Vec<u32> = symbol
                .arg_sorts()
                .iter()
                .map(|&s| self.declared_sizes[s as usize])
                .collect();
            if limits.iter().any(|&l| l == 0) {
                continue;
            }
            let mut iter = GroundingIter::new(limits);
            let mut env: FxHashMap<Var, u32> = FxHashMap::default();
            while let Some(grounding) = iter.advance() {
                env.clear();
                for (i, &value) in grounding.iter().enumerate() {
                    env.insert(def.arg_vars[i], value);
                }
                // Evaluation can fail when the definition reaches a symbol
                // with no recorded value; such entries are left out
                if let Some(value) = self.eval_term(&def.body, &env) {
                    if symbol.arity() == 0 {
                        self.constants.insert(f, value);
                    } else {
                        self.functions
                            .entry(f)
                            .or_default()
                            .insert(grounding.to_vec(), value);
                    }
                }
            }
        }
    }

    /// Evaluates deleted and partially-deleted predicates from their stored
    /// definitions
    fn evaluate_deleted_predicates(&mut self, signature: &Signature, problem: &Problem) {
        let mut entries: Vec<(PredId, bool)> = problem
            .deleted_predicates()
            .keys()
            .map(|&p| (p, true))
            .chain(
                problem
                    .partially_deleted_predicates()
                    .keys()
                    .map(|&p| (p, false)),
            )
            .collect();
        entries.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (p, fully_deleted) in entries {
            let def = if fully_deleted {
                &problem.deleted_predicates()[&p]
            } else {
                &problem.partially_deleted_predicates()[&p]
            };
            let symbol = signature.predicate(p);
            let limits: Vec<u32> = symbol
                .arg_sorts()
                .iter()
                .map(|&s| self.declared_sizes[s as usize])
                .collect();
            if limits.iter().any(|&l| l == 0) {
                continue;
            }
            if symbol.arity() == 0 {
                let env = FxHashMap::default();
                if let Some(mut value) = self.eval_formula(&def.body, &env) {
                    if !def.positive {
                        value = !value;
                    }
                    self.propositions.insert(p, value);
                }
                continue;
            }
            let mut iter = GroundingIter::new(limits);
            let mut env: FxHashMap<Var, u32> = FxHashMap::default();
            while let Some(grounding) = iter.advance() {
                env.clear();
                for (i, &value) in grounding.iter().enumerate() {
                    env.insert(def.arg_vars[i], value);
                }
                if let Some(mut value) = self.eval_formula(&def.body, &env) {
                    if !def.positive {
                        value = !value;
                    }
                    self.predicates
                        .entry(p)
                        .or_default()
                        .insert(grounding.to_vec(), value);
                }
            }
        }
    }

    /// Rewrites a ground term against the interpretation
    fn eval_term(&self, term: &Term, env: &FxHashMap<Var, u32>) -> Option<u32> {
        match term {
            Term::Var(v) => env.get(v).copied(),
            Term::App(f, args) => {
                if args.is_empty() {
                    self.constants.get(f).copied()
                } else {
                    let values: Option<Vec<u32>> =
                        args.iter().map(|arg| self.eval_term(arg, env)).collect();
                    self.functions.get(f)?.get(&values?).copied()
                }
            }
        }
    }

    /// Evaluates a ground definitional formula against the interpretation
    fn eval_formula(&self, formula: &DefFormula, env: &FxHashMap<Var, u32>) -> Option<bool> {
        match formula {
            DefFormula::True => Some(true),
            DefFormula::False => Some(false),
            DefFormula::Literal {
                positive,
                predicate,
                args,
            } => {
                let value = if args.is_empty() {
                    self.propositions.get(predicate).copied()?
                } else {
                    let values: Option<Vec<u32>> =
                        args.iter().map(|arg| self.eval_term(arg, env)).collect();
                    self.predicates.get(predicate)?.get(&values?).copied()?
                };
                Some(value == *positive)
            }
            DefFormula::Equality {
                positive,
                left,
                right,
            } => {
                let equal = self.eval_term(left, env)? == self.eval_term(right, env)?;
                Some(equal == *positive)
            }
            DefFormula::Not(inner) => self.eval_formula(inner, env).map(|v| !v),
            DefFormula::And(parts) => {
                let mut result = true;
                for part in parts {
                    result &= self.eval_formula(part, env)?;
                }
                Some(result)
            }
            DefFormula::Or(parts) => {
                let mut result = false;
                for part in parts {
                    result |= self.eval_formula(part, env)?;
                }
                Some(result)
            }
        }
    }

    /// Returns the cardinality of a distinct sort
    pub fn distinct_sizes(&self) -> &[u32] {
        &self.distinct_sizes
    }

    /// Returns the cardinality a declared sort ended up with (0 if unused)
    pub fn declared_sort_size(&self, sort: crate::fol::SortId) -> u32 {
        self.declared_sizes[sort as usize]
    }

    /// Returns the name of a domain element of a distinct sort
    pub fn domain_constant_name(&self, ds: DistinctSort, element: u32) -> String {
        format!("d{}_{}", ds, element)
    }

    /// Returns the interpreted value of a constant
    pub fn constant(&self, f: FuncId) -> Option<u32> {
        self.constants.get(&f).copied()
    }

    /// Returns the interpreted value of a function at the given arguments
    pub fn function_value(&self, f: FuncId, args: &[u32]) -> Option<u32> {
        if args.is_empty() {
            self.constant(f)
        } else {
            self.functions.get(&f)?.get(args).copied()
        }
    }

    /// Returns the interpreted value of a propositional symbol
    pub fn proposition(&self, p: PredId) -> Option<bool> {
        self.propositions.get(&p).copied()
    }

    /// Returns the interpreted value of a predicate at the given arguments
    pub fn predicate_value(&self, p: PredId, args: &[u32]) -> Option<bool> {
        if args.is_empty() {
            self.proposition(p)
        } else {
            self.predicates.get(&p)?.get(args).copied()
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (sort, name) in self.sort_names.iter().enumerate() {
            let size = self.declared_sizes[sort];
            if size > 0 {
                writeln!(out, "sort {} has size {}", name, size)?;
            }
        }
        let mut constants: Vec<_> = self.constants.iter().collect();
        constants.sort_unstable();
        for (&f, &value) in constants {
            writeln!(out, "{} = {}", self.function_names[f as usize], value)?;
        }
        let mut functions: Vec<_> = self.functions.iter().collect();
        functions.sort_unstable_by_key(|(f, _)| **f);
        for (&f, table) in functions {
            let mut rows: Vec<_> = table.iter().collect();
            rows.sort_unstable();
            for (args, value) in rows {
                writeln!(
                    out,
                    "{}({}) = {}",
                    self.function_names[f as usize],
                    join(args),
                    value
                )?;
            }
        }
        let mut propositions: Vec<_> = self.propositions.iter().collect();
        propositions.sort_unstable();
        for (&p, &value) in propositions {
            writeln!(out, "{} = {}", self.predicate_names[p as usize], value)?;
        }
        let mut predicates: Vec<_> = self.predicates.iter().collect();
        predicates.sort_unstable_by_key(|(p, _)| **p);
        for (&p, table) in predicates {
            let mut rows: Vec<_> = table.iter().collect();
            rows.sort_unstable();
            for (args, value) in rows {
                writeln!(
                    out,
                    "{}({}) = {}",
                    self.predicate_names[p as usize],
                    join(args),
                    value
                )?;
            }
        }
        Ok(())
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_model() -> Interpretation {
        let mut model = Interpretation {
            distinct_sizes: vec![2],
            declared_sizes: vec![2],
            sort_names: vec!["S".to_string()],
            function_names: vec!["a".to_string(), "f".to_string()],
            predicate_names: vec!["=".to_string(), "p".to_string()],
            ..Interpretation::default()
        };
        model.constants.insert(0, 2);
        let mut f_table = FxHashMap::default();
        f_table.insert(vec![1], 2);
        f_table.insert(vec![2], 1);
        model.functions.insert(1, f_table);
        let mut p_table = FxHashMap::default();
        p_table.insert(vec![1], true);
        p_table.insert(vec![2], false);
        model.predicates.insert(1, p_table);
        model
    }

    #[test]
    fn term_evaluation_rewrites_to_values() {
        let model = manual_model();
        let env = FxHashMap::default();
        // f(f(a)) = f(f(2)) = f(1) = 2
        let term = Term::App(1, vec![Term::App(1, vec![Term::App(0, vec![])])]);
        assert_eq!(model.eval_term(&term, &env), Some(2));
    }

    #[test]
    fn formula_evaluation_respects_polarity() {
        let model = manual_model();
        let env = FxHashMap::default();
        // p(f(a)) with f(a) = 1: true
        let atom = DefFormula::Literal {
            positive: true,
            predicate: 1,
            args: vec![Term::App(1, vec![Term::App(0, vec![])])],
        };
        assert_eq!(model.eval_formula(&atom, &env), Some(true));
        assert_eq!(
            model.eval_formula(&DefFormula::Not(Box::new(atom)), &env),
            Some(false)
        );
        // a = f(1): both are 2
        let eq = DefFormula::Equality {
            positive: true,
            left: Term::App(0, vec![]),
            right: Term::App(1, vec![Term::Var(0)]),
        };
        let mut env = FxHashMap::default();
        env.insert(0, 1);
        assert_eq!(model.eval_formula(&eq, &env), Some(true));
    }

    #[test]
    fn missing_symbols_fail_softly() {
        let model = manual_model();
        let env = FxHashMap::default();
        let term = Term::App(7, vec![]);
        assert_eq!(model.eval_term(&term, &env), None);
        let formula = DefFormula::Literal {
            positive: true,
            predicate: 9,
            args: vec![Term::Var(0)],
        };
        assert_eq!(model.eval_formula(&formula, &env), None);
    }

    #[test]
    fn display_lists_tables() {
        let model = manual_model();
        let text = model.to_string();
        assert!(text.contains("sort S has size 2"));
        assert!(text.contains("a = 2"));
        assert!(text.contains("f(1) = 2"));
        assert!(text.contains("p(2) = false"));
    }
}
