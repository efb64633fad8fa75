//! SAT solver trait and implementations

pub mod rustsat_adapter;

pub use rustsat_adapter::RustSatAdapter;

/// Result of a SAT call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    /// A satisfying assignment was found
    Sat,
    /// The formula is unsatisfiable under the given assumptions
    Unsat,
    /// The solver gave up (internal limit or interruption)
    Unknown,
}

/// Core SAT solver trait
///
/// Variables are 1-indexed and literals are signed integers: positive for
/// the variable itself, negative for its negation. Callers are responsible
/// for removing duplicate literals before adding a clause.
pub trait SatSolver {
    /// Allocates a fresh variable and returns its index
    fn new_var(&mut self) -> u32;

    /// Ensures that variables `1..=n` exist
    fn ensure_var_count(&mut self, n: u32);

    /// Adds a clause to the solver
    ///
    /// Returns false if the clause is trivially unsatisfiable
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Solves the current formula without assumptions
    fn solve(&mut self) -> SolveResult {
        self.solve_under_assumptions(&[])
    }

    /// Solves the current formula under the given assumption literals
    fn solve_under_assumptions(&mut self, assumptions: &[i32]) -> SolveResult;

    /// Returns the assignment of a variable
    ///
    /// Only valid after a call returning [`SolveResult::Sat`].
    fn value_of(&self, var: u32) -> bool;

    /// Returns the subset of the last call's assumptions the solver used to
    /// derive unsatisfiability
    ///
    /// Only valid after a call returning [`SolveResult::Unsat`]. Literals
    /// are reported with the polarity they were assumed with.
    fn failed_assumptions(&self) -> Vec<i32>;

    /// Returns the number of variables in the solver
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added
    fn num_clauses(&self) -> u32;
}

/// A scripted in-memory solver for testing
///
/// Records every clause verbatim and replays a preset sequence of results,
/// failed-assumption sets, and assignments. With an empty script it reports
/// SAT with an all-false assignment.
pub struct MockSolver {
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    script: std::collections::VecDeque<ScriptedAnswer>,
    assignment: Vec<bool>,
    last_failed: Vec<i32>,
}

/// One preset answer for [`MockSolver`]
pub struct ScriptedAnswer {
    /// The result to report
    pub result: SolveResult,
    /// The failed assumptions to report on UNSAT
    pub failed: Vec<i32>,
    /// Variables to report true on SAT
    pub true_vars: Vec<u32>,
}

impl MockSolver {
    /// Creates a mock solver with an empty script
    pub fn new() -> Self {
        Self {
            num_vars: 0,
            clauses: Vec::new(),
            script: std::collections::VecDeque::new(),
            assignment: Vec::new(),
            last_failed: Vec::new(),
        }
    }

    /// Queues a scripted answer
    pub fn enqueue(&mut self, answer: ScriptedAnswer) {
        self.script.push_back(answer);
    }

    /// Returns the recorded clauses in submission order
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SatSolver for MockSolver {
    fn new_var(&mut self) -> u32 {
        self.num_vars += 1;
        self.assignment.push(false);
        self.num_vars
    }

    fn ensure_var_count(&mut self, n: u32) {
        if n > self.num_vars {
            self.num_vars = n;
            self.assignment.resize(n as usize, false);
        }
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        self.clauses.push(lits.to_vec());
        true
    }

    fn solve_under_assumptions(&mut self, _assumptions: &[i32]) -> SolveResult {
        match self.script.pop_front() {
            Some(answer) => {
                self.last_failed = answer.failed;
                for var in answer.true_vars {
                    self.ensure_var_count(var);
                    self.assignment[(var - 1) as usize] = true;
                }
                answer.result
            }
            None => SolveResult::Sat,
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            false
        } else {
            self.assignment[(var - 1) as usize]
        }
    }

    fn failed_assumptions(&self) -> Vec<i32> {
        self.last_failed.clone()
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.clauses.len() as u32
    }
}
