//! Adapters for rustsat solver backends
//!
//! Wraps any incremental rustsat solver (batsat by default) behind the
//! [`SatSolver`] trait, including assumption solving and failed-assumption
//! extraction from the solver core.

use super::{SatSolver, SolveResult};
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal, Var};

/// Adapter that wraps rustsat solvers to implement our SatSolver trait
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let solver = RustSatAdapter::new(BasicSolver::default());
/// ```
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
    /// Which variables some clause has introduced to the backend
    mentioned: Vec<bool>,
    last_assumptions: Vec<i32>,
    last_core: Vec<Lit>,
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
            mentioned: Vec::new(),
            last_assumptions: Vec::new(),
            last_core: Vec::new(),
        }
    }
}

fn to_lit(lit: i32) -> Lit {
    let var_idx = lit.unsigned_abs() - 1;
    if var_idx > Var::MAX_IDX {
        panic!("variable index too high: {} > {}", var_idx, Var::MAX_IDX);
    }
    let var = Var::new(var_idx);
    if lit > 0 { var.pos_lit() } else { var.neg_lit() }
}

impl<S: SolveIncremental> SatSolver for RustSatAdapter<S> {
    fn new_var(&mut self) -> u32 {
        self.num_vars += 1;
        self.mentioned.resize(self.num_vars as usize, false);
        self.num_vars
    }

    fn ensure_var_count(&mut self, n: u32) {
        if n > self.num_vars {
            self.num_vars = n;
            self.mentioned.resize(n as usize, false);
        }
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let lits_vec: Vec<Lit> = lits.iter().map(|&lit| to_lit(lit)).collect();
        for &lit in lits {
            let var = lit.unsigned_abs();
            if var > self.num_vars {
                self.ensure_var_count(var);
            }
            self.mentioned[(var - 1) as usize] = true;
        }
        let clause = Clause::from(&lits_vec[..]);
        self.num_clauses += 1;
        self.solver.add_clause(clause).is_ok()
    }

    fn solve_under_assumptions(&mut self, assumptions: &[i32]) -> SolveResult {
        // Markers can be assumed before any clause mentions them; introduce
        // such variables to the backend with a tautology first
        for &lit in assumptions {
            let var = lit.unsigned_abs();
            if var > self.num_vars {
                self.ensure_var_count(var);
            }
            if !self.mentioned[(var - 1) as usize] {
                self.mentioned[(var - 1) as usize] = true;
                let v = to_lit(lit);
                let _ = self.solver.add_clause(Clause::from(&[v, !v][..]));
            }
        }
        let assumps: Vec<Lit> = assumptions.iter().map(|&lit| to_lit(lit)).collect();
        self.last_assumptions = assumptions.to_vec();
        self.last_core.clear();
        match self.solver.solve_assumps(&assumps) {
            Ok(SolverResult::Sat) => SolveResult::Sat,
            Ok(SolverResult::Unsat) => {
                if let Ok(core) = self.solver.core() {
                    self.last_core = core;
                }
                SolveResult::Unsat
            }
            Ok(SolverResult::Interrupted) | Err(_) => SolveResult::Unknown,
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            return false;
        }
        let v = Var::new(var - 1);
        match self.solver.solution(v) {
            Ok(assignment) => matches!(assignment.var_value(v), TernaryVal::True),
            Err(_) => false,
        }
    }

    fn failed_assumptions(&self) -> Vec<i32> {
        // The core is reported as a clause over the assumption variables;
        // match by variable and keep the assumed polarity
        self.last_assumptions
            .iter()
            .copied()
            .filter(|&a| {
                let v = Var::new(a.unsigned_abs() - 1);
                self.last_core.iter().any(|l| l.var() == v)
            })
            .collect()
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}
