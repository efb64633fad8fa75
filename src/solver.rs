//! Main finder API
//!
//! Ties the pipeline together: monotonicity analysis and the optional sort
//! collapse, sort inference, bounds aggregation, and the search loop, all
//! against a caller-supplied or default SAT backend.

use std::time::{Duration, Instant};

use rustsat_batsat::BasicSolver;
use tracing::info;

use crate::encoder::{SymbolOrder, WidgetOrder};
use crate::engine::{RustSatAdapter, SatSolver};
use crate::error::{FmfError, Result};
use crate::fol::{Clause, Literal, Problem, Signature};
use crate::model::Interpretation;
use crate::search::{SearchDriver, SearchSettings};
use crate::sorts::bounds::{DistinctConstraints, SortBounds};
use crate::sorts::inference::SortInference;
use crate::sorts::monotonicity::{self, Monotonicity};

/// How non-monotonic sorts are collapsed before the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseMode {
    /// Leave the sort structure as inferred
    #[default]
    Off,
    /// Guard variables of non-monotonic sorts with fresh sort predicates
    Predicate,
    /// Wrap terms of non-monotonic sorts in fresh sort functions
    ///
    /// Rejected at init: the function rewrite un-flattens clauses and
    /// flattening is an upstream stage.
    Function,
}

/// Finder options
#[derive(Debug, Clone)]
pub struct Options {
    /// Initial cardinality of every distinct sort
    pub start_size: u32,
    /// Fraction of canonicity axioms to emit (0.0 disables them)
    pub symmetry_ratio: f32,
    /// Staircase-scheme growth alternation: out of every `ratio + 1` UNSAT
    /// answers, one picks the smallest sort and the rest minimize the
    /// estimated instance count
    pub size_weight_ratio: u32,
    /// Choose the staircase (XMass) marker scheme over the constraint-memo
    /// (Plain) scheme
    pub xmass: bool,
    /// In Plain mode, ignore failed markers and memoize EQ-only constraints
    pub ignore_markers: bool,
    /// Weight constraints by insertion order rather than batch size
    pub no_priority: bool,
    /// Omit instance/totality markers for sorts proved monotonic
    pub special_monot_encoding: bool,
    /// Shape of the grounded-term ordering for symmetry breaking
    pub widget_order: WidgetOrder,
    /// Sort key for symbols within the symmetry ordering
    pub symbol_order: SymbolOrder,
    /// Consume externally inferred sort equivalences and constraints
    pub detect_sort_bounds: bool,
    /// Monotonicity rewrite mode
    pub collapse_monotonic_sorts: CollapseMode,
    /// Wall-clock limit in milliseconds, checked between SAT calls
    pub timeout_ms: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            start_size: 1,
            symmetry_ratio: 1.0,
            size_weight_ratio: 1,
            xmass: false,
            ignore_markers: false,
            no_priority: false,
            special_monot_encoding: false,
            widget_order: WidgetOrder::FunctionFirst,
            symbol_order: SymbolOrder::Occurrence,
            detect_sort_bounds: false,
            collapse_monotonic_sorts: CollapseMode::Off,
            timeout_ms: None,
        }
    }
}

/// Why the finder gave up without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The upstream pipeline declared the input incomplete for finite model
    /// finding
    Incomplete,
    /// A size vector would need more than `u32::MAX` SAT variables
    Overflow,
    /// The SAT backend reported Unknown or ran out of memory
    SolverFailure,
    /// The configured time limit was reached between SAT calls
    TimeLimit,
}

impl Diagnostic {
    /// A short human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            Diagnostic::Incomplete => "input unsuitable for complete finite model finding",
            Diagnostic::Overflow => "cannot represent all propositional literals",
            Diagnostic::SolverFailure => "SAT solver gave up",
            Diagnostic::TimeLimit => "time limit reached",
        }
    }
}

/// Statistics collected during a search
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub(crate) encoding_time: Duration,
    pub(crate) solving_time: Duration,
    pub(crate) iterations: u32,
    pub(crate) num_variables: u32,
    pub(crate) num_clauses: u32,
}

impl Statistics {
    /// Returns encoding time in milliseconds
    pub fn encoding_time(&self) -> u64 {
        self.encoding_time.as_millis() as u64
    }

    /// Returns SAT solving time in milliseconds
    pub fn solving_time(&self) -> u64 {
        self.solving_time.as_millis() as u64
    }

    /// Returns the number of size vectors tried
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the SAT variable count of the last iteration
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns the clause-batch size of the last iteration
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}

/// Terminal result of a finite model search
#[derive(Debug)]
pub enum Outcome {
    /// A finite model was found
    Satisfiable {
        /// The interpretation witnessing satisfiability
        model: Interpretation,
        /// Search statistics
        stats: Statistics,
    },
    /// No finite model exists within the declared bounds
    Refutation {
        /// Search statistics
        stats: Statistics,
    },
    /// The search could not decide
    Unknown {
        /// Why the search gave up
        diagnostic: Diagnostic,
        /// Search statistics
        stats: Statistics,
    },
}

impl Outcome {
    /// Returns true if a model was found
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, Outcome::Satisfiable { .. })
    }

    /// Returns true if the clause set was refuted within its bounds
    pub fn is_refutation(&self) -> bool {
        matches!(self, Outcome::Refutation { .. })
    }

    /// Returns the model if one was found
    pub fn model(&self) -> Option<&Interpretation> {
        match self {
            Outcome::Satisfiable { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Returns the statistics
    pub fn statistics(&self) -> &Statistics {
        match self {
            Outcome::Satisfiable { stats, .. }
            | Outcome::Refutation { stats }
            | Outcome::Unknown { stats, .. } => stats,
        }
    }
}

/// The finite model finder (uses batsat by default)
pub struct Finder {
    options: Options,
}

impl Finder {
    /// Creates a finder, validating the option bag
    pub fn new(options: Options) -> Result<Self> {
        if options.start_size == 0 {
            return Err(FmfError::Configuration(
                "start size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&options.symmetry_ratio) {
            return Err(FmfError::Configuration(
                "symmetry ratio must lie in 0.0..=1.0".to_string(),
            ));
        }
        if options.collapse_monotonic_sorts == CollapseMode::Function {
            return Err(FmfError::Configuration(
                "sort functions require re-flattening; use predicate collapse".to_string(),
            ));
        }
        Ok(Self { options })
    }

    /// Searches for a finite model using the batsat backend
    pub fn solve(&self, problem: &Problem) -> Result<Outcome> {
        self.solve_with(problem, || RustSatAdapter::new(BasicSolver::default()))
    }

    /// Searches for a finite model with a custom SAT backend
    ///
    /// The factory is invoked once per monotonicity check and once per size
    /// vector; each solver is dropped before the next is created.
    pub fn solve_with<S, F>(&self, problem: &Problem, mut solver_factory: F) -> Result<Outcome>
    where
        S: SatSolver,
        F: FnMut() -> S,
    {
        if !problem.is_complete() {
            return Ok(Outcome::Unknown {
                diagnostic: Diagnostic::Incomplete,
                stats: Statistics::default(),
            });
        }
        if problem.has_empty_clause() {
            return Ok(Outcome::Refutation {
                stats: Statistics::default(),
            });
        }

        let mut signature = problem.signature().clone();
        let mut clauses = problem.clauses().to_vec();
        let mut del_f: Vec<bool> = (0..signature.function_count())
            .map(|f| problem.is_deleted_function(f))
            .collect();
        let mut del_p: Vec<bool> = (0..signature.predicate_count())
            .map(|p| problem.is_deleted_predicate(p))
            .collect();

        // Monotonicity analysis feeds both the collapse rewrite and the
        // special encoding; run it once on the incoming clause set
        let wants_monotonicity = self.options.special_monot_encoding
            || self.options.collapse_monotonic_sorts == CollapseMode::Predicate;
        let declared_monotonic: Vec<bool> = if wants_monotonicity {
            (0..signature.sort_count())
                .map(|s| Monotonicity::check(&signature, &clauses, s, solver_factory()))
                .collect()
        } else {
            Vec::new()
        };

        if self.options.collapse_monotonic_sorts == CollapseMode::Predicate {
            monotonicity::add_sort_predicates(
                &mut signature,
                &mut clauses,
                &declared_monotonic,
                &del_f,
            );
            del_f.resize(signature.function_count() as usize, false);
            del_p.resize(signature.predicate_count() as usize, false);
        }

        let equivalences = if self.options.detect_sort_bounds {
            problem.sort_equivalences().to_vec()
        } else {
            Vec::new()
        };
        let mut sorted = SortInference::apply(&signature, problem, &clauses, &equivalences);

        if wants_monotonicity && !declared_monotonic.is_empty() {
            // A distinct sort is monotonic when every merged declared sort is
            let flags: Vec<bool> = (0..sorted.distinct_count())
                .map(|ds| {
                    sorted
                        .distinct_to_declared(ds)
                        .iter()
                        .all(|&s| declared_monotonic[s as usize])
                })
                .collect();
            sorted.set_monotonic(flags);
        }

        match self.options.symbol_order {
            SymbolOrder::Occurrence => {}
            SymbolOrder::PreprocessedUsage => {
                let counts: Vec<u32> = signature
                    .function_ids()
                    .map(|f| signature.function(f).usage_count())
                    .collect();
                sorted.sort_symbols_by(|f| counts[f as usize]);
            }
            SymbolOrder::Usage => {
                let counts = recount_function_usage(&signature, &clauses);
                sorted.sort_symbols_by(|f| counts[f as usize]);
            }
        }

        let bounds = SortBounds::aggregate(problem, &sorted);
        if bounds.maxs().iter().any(|&max| max != u32::MAX) {
            info!(maxs = ?bounds.maxs(), "detected maximum model sizes");
        }
        let constraints = if self.options.detect_sort_bounds {
            DistinctConstraints::from_problem(problem, &sorted)
        } else {
            DistinctConstraints::default()
        };

        let settings = SearchSettings {
            start_size: self.options.start_size,
            xmass: self.options.xmass,
            ignore_markers: self.options.ignore_markers,
            no_priority: self.options.no_priority,
            special_monot_encoding: self.options.special_monot_encoding,
            size_weight_ratio: self.options.size_weight_ratio,
            symmetry_ratio: self.options.symmetry_ratio,
            widget_order: self.options.widget_order,
            deadline: self
                .options
                .timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        };
        let driver = SearchDriver::new(
            &signature, problem, &clauses, &sorted, &bounds, &constraints, &del_f, &del_p, settings,
        );
        Ok(driver.run(solver_factory))
    }
}

/// Counts function occurrences over the final clause set
///
/// Only function equalities are counted; that is where symmetry candidates
/// come from.
fn recount_function_usage(signature: &Signature, clauses: &[Clause]) -> Vec<u32> {
    let mut counts = vec![0u32; signature.function_count() as usize];
    for clause in clauses {
        for literal in clause.literals() {
            if let Literal::FunEq { function, .. } = literal {
                counts[*function as usize] += 1;
            }
        }
    }
    counts
}
