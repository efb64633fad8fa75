//! Grounded-term orderings for symmetry breaking
//!
//! Per refined sort, a canonical sequence of grounded terms: the constants
//! of the sort first, then uniform groundings ("widgets") of the functions
//! returning into it. The encoder turns the k-th term of the sequence into a
//! restricted-totality axiom at size k and into canonicity axioms forbidding
//! a constant from taking a fresh value while earlier terms left the
//! previous one unused.

use crate::fol::{FuncId, Signature};
use crate::sorts::bounds::DomainSizes;
use crate::sorts::inference::SortedSignature;

/// Shape of the function-widget portion of the ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetOrder {
    /// All groundings of one function before the next: f(1) f(2) g(1) g(2)
    #[default]
    FunctionFirst,
    /// All functions at one argument before the next: f(1) g(1) f(2) g(2)
    ArgumentFirst,
    /// Functions staggered across arguments: f(1) g(2) f(2) g(1)
    Diagonal,
}

/// Sort key for constants and functions within an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolOrder {
    /// Keep the order symbols occur in the signature
    #[default]
    Occurrence,
    /// Sort by descending usage count as recorded at clausification
    PreprocessedUsage,
    /// Sort by descending usage count recomputed over the final clause set
    Usage,
}

/// A function applied to a fixed argument grounding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundedTerm {
    /// The applied function
    pub function: FuncId,
    /// Argument values; empty for constants
    pub grounding: Vec<u32>,
}

/// Builds the grounded-term ordering of every refined sort
///
/// Must be rebuilt whenever the size vector changes: widget groundings are
/// clamped to the current per-sort sizes.
pub fn build_orderings(
    signature: &Signature,
    sorted: &SortedSignature,
    sizes: &DomainSizes,
    widget_order: WidgetOrder,
) -> Vec<Vec<GroundedTerm>> {
    let mut orderings = Vec::with_capacity(sorted.refined_count() as usize);
    for rs in 0..sorted.refined_count() {
        let size = sizes.refined(rs);
        let mut terms = Vec::new();

        for &constant in sorted.sorted_constants(rs) {
            terms.push(GroundedTerm {
                function: constant,
                grounding: Vec::new(),
            });
        }

        let functions = sorted.sorted_functions(rs);
        let widget = |f: FuncId, ground_with: u32| -> GroundedTerm {
            let fsig = sorted.function_signature(f);
            let arity = signature.function(f).arity();
            GroundedTerm {
                function: f,
                grounding: (0..arity)
                    .map(|i| ground_with.min(sizes.refined(fsig[i])))
                    .collect(),
            }
        };
        match widget_order {
            WidgetOrder::FunctionFirst => {
                for &f in functions {
                    for m in 1..=size {
                        terms.push(widget(f, m));
                    }
                }
            }
            WidgetOrder::ArgumentFirst => {
                for m in 1..=size {
                    for &f in functions {
                        terms.push(widget(f, m));
                    }
                }
            }
            WidgetOrder::Diagonal => {
                for m in 1..=size {
                    for (index, &f) in functions.iter().enumerate() {
                        let ground_with = 1 + (m + index as u32) % size;
                        terms.push(widget(f, ground_with));
                    }
                }
            }
        }
        orderings.push(terms);
    }
    orderings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fol::{Clause, Literal, Problem, Signature};
    use crate::sorts::inference::SortInference;

    fn setup() -> (Problem, SortedSignature) {
        // Constants a, b and unary functions f, g over one refined sort
        let mut sig = Signature::new();
        let s = sig.add_sort("S");
        let a = sig.add_function("a", &[], s);
        let b = sig.add_function("b", &[], s);
        let f = sig.add_function("f", &[s], s);
        let g = sig.add_function("g", &[s], s);
        let mut problem = Problem::new(sig);
        // { a != X | f(X) != X | g(X) != X | b != X } ties all result slots
        problem.add_clause(Clause::new(
            1,
            vec![
                Literal::fun_eq(false, a, vec![], 0),
                Literal::fun_eq(false, f, vec![0], 0),
                Literal::fun_eq(false, g, vec![0], 0),
                Literal::fun_eq(false, b, vec![], 0),
            ],
        ));
        let sorted = SortInference::apply(problem.signature(), &problem, problem.clauses(), &[]);
        (problem, sorted)
    }

    #[test]
    fn constants_come_first() {
        let (problem, sorted) = setup();
        let sizes = DomainSizes::new(&sorted, 2);
        let orderings =
            build_orderings(problem.signature(), &sorted, &sizes, WidgetOrder::FunctionFirst);
        let rs = sorted.function_signature(0)[0] as usize;
        let terms = &orderings[rs];

        // a, b, then f(1) f(2) g(1) g(2)
        assert_eq!(terms.len(), 6);
        assert_eq!(terms[0].function, 0);
        assert_eq!(terms[1].function, 1);
        assert_eq!(terms[2].function, 2);
        assert_eq!(terms[2].grounding, vec![1]);
        assert_eq!(terms[3].grounding, vec![2]);
        assert_eq!(terms[4].function, 3);
    }

    #[test]
    fn argument_first_interleaves_functions() {
        let (problem, sorted) = setup();
        let sizes = DomainSizes::new(&sorted, 2);
        let orderings =
            build_orderings(problem.signature(), &sorted, &sizes, WidgetOrder::ArgumentFirst);
        let rs = sorted.function_signature(0)[0] as usize;
        let widgets: Vec<(FuncId, Vec<u32>)> = orderings[rs][2..]
            .iter()
            .map(|t| (t.function, t.grounding.clone()))
            .collect();
        assert_eq!(
            widgets,
            vec![
                (2, vec![1]),
                (3, vec![1]),
                (2, vec![2]),
                (3, vec![2]),
            ]
        );
    }

    #[test]
    fn diagonal_staggers_groundings() {
        let (problem, sorted) = setup();
        let sizes = DomainSizes::new(&sorted, 2);
        let orderings =
            build_orderings(problem.signature(), &sorted, &sizes, WidgetOrder::Diagonal);
        let rs = sorted.function_signature(0)[0] as usize;
        let widgets: Vec<(FuncId, Vec<u32>)> = orderings[rs][2..]
            .iter()
            .map(|t| (t.function, t.grounding.clone()))
            .collect();
        // m=1: f at 1+(1+0)%2=2, g at 1+(1+1)%2=1; m=2: f at 1, g at 2
        assert_eq!(
            widgets,
            vec![
                (2, vec![2]),
                (3, vec![1]),
                (2, vec![1]),
                (3, vec![2]),
            ]
        );
    }
}
