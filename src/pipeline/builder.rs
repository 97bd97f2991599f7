//! Pipeline assembly from a classified operation sequence.
//!
//! Synthesizes a single-parameter function literal per non-terminal stage,
//! chains them onto the iterated source (inserting the explicit `.stream()`
//! view only when the chain needs it), and emits the terminal. The live
//! binding is threaded functionally: each stage may reference only the
//! binding produced by its immediate predecessor, and a violation is a
//! [`BuildError`]; the caller degrades to "no change", never to wrong
//! output.

use crate::core::ast::{Expr, ForEachLoop, Stmt};
use crate::errors::BuildError;
use crate::pipeline::{reduce, CandidateOp, Pipeline, Stage, TerminalKind};
use crate::resolve::FreshNameSource;
use im::HashSet as ImSet;

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Builds the pipeline for `ops` over the loop's source. `names` supplies
    /// collision-free parameter names for synthesized bindings.
    pub fn build(
        lp: &ForEachLoop,
        ops: &[CandidateOp],
        names: &mut dyn FreshNameSource,
    ) -> Result<Pipeline, BuildError> {
        let Some((terminal_op, stages_ops)) = ops.split_last() else {
            return Err(BuildError::EmptySequence);
        };
        if stages_ops.iter().any(CandidateOp::is_terminal) {
            return Err(if terminal_op.is_terminal() {
                BuildError::MultipleTerminals
            } else {
                BuildError::MisplacedTerminal
            });
        }
        if !terminal_op.is_terminal() {
            return Err(BuildError::MissingTerminal);
        }

        let mut live = lp.binding.clone();
        let mut retired: ImSet<String> = ImSet::new();
        let mut stages = Vec::new();

        for op in stages_ops {
            check_threading(op, &retired)?;
            match op {
                CandidateOp::Transform { expr, produced } => {
                    stages.push(Stage::new(
                        "map",
                        vec![Expr::lambda(vec![live.as_str()], expr.clone())],
                    ));
                    if *produced != live {
                        retired.insert(live.clone());
                        live = produced.clone();
                    }
                }
                CandidateOp::PassThrough { stmt } => {
                    // x -> { <stmt> return x; } keeps the effect in sequence
                    // order while re-emitting the element unchanged
                    let body = vec![stmt.clone(), Stmt::Return(Some(Expr::name(&live)))];
                    stages.push(Stage::new(
                        "map",
                        vec![Expr::lambda_block(vec![live.as_str()], body)],
                    ));
                }
                CandidateOp::Filter { predicate } => {
                    stages.push(Stage::new(
                        "filter",
                        vec![Expr::lambda(vec![live.as_str()], predicate.clone())],
                    ));
                }
                // split_last plus the is_terminal guard keep terminals out
                // of this loop
                CandidateOp::Consume { .. }
                | CandidateOp::Reduce { .. }
                | CandidateOp::AnyMatch { .. }
                | CandidateOp::NoneMatch { .. } => unreachable!(),
            }
        }

        check_threading(terminal_op, &retired)?;
        let (terminal, terminal_kind) = match terminal_op {
            CandidateOp::Consume { stmt } => {
                let lambda = consume_lambda(stmt, &live);
                let method = if stages.is_empty() {
                    "forEach"
                } else {
                    "forEachOrdered"
                };
                (Stage::new(method, vec![lambda]), TerminalKind::Consume)
            }
            CandidateOp::Reduce {
                kind,
                accumulator,
                acc_type,
                value,
            } => {
                if accumulator.is_empty() {
                    return Err(BuildError::MissingAccumulator);
                }
                if kind.is_counting() {
                    let unused = names.fresh("_item");
                    stages.push(Stage::new(
                        "map",
                        vec![Expr::lambda(
                            vec![unused.as_str()],
                            reduce::typed_one(acc_type.as_ref()),
                        )],
                    ));
                } else if let Some(value) = value {
                    if !matches!(value, Expr::Name(n) if *n == live) {
                        stages.push(Stage::new(
                            "map",
                            vec![Expr::lambda(vec![live.as_str()], value.clone())],
                        ));
                    }
                }
                let identity = Expr::name(accumulator);
                let folder = kind.accumulator_fn(acc_type.as_ref());
                (
                    Stage::new("reduce", vec![identity, folder]),
                    TerminalKind::Reduce {
                        accumulator: accumulator.clone(),
                    },
                )
            }
            CandidateOp::AnyMatch { predicate } => (
                Stage::new(
                    "anyMatch",
                    vec![Expr::lambda(vec![live.as_str()], predicate.clone())],
                ),
                TerminalKind::AnyMatch,
            ),
            CandidateOp::NoneMatch { predicate } => (
                Stage::new(
                    "noneMatch",
                    vec![Expr::lambda(vec![live.as_str()], predicate.clone())],
                ),
                TerminalKind::NoneMatch,
            ),
            _ => unreachable!(),
        };

        let explicit_view = !(stages.is_empty() && terminal_kind == TerminalKind::Consume);
        Ok(Pipeline {
            source: lp.source.clone(),
            explicit_view,
            stages,
            terminal,
            terminal_kind,
        })
    }
}

/// The threading rule: a stage may reference only the binding produced by
/// its immediate predecessor, never one an earlier transform retired.
fn check_threading(op: &CandidateOp, retired: &ImSet<String>) -> Result<(), BuildError> {
    if let Some(stale) = op.references().into_iter().find(|n| retired.contains(n)) {
        return Err(BuildError::StaleBinding { binding: stale });
    }
    Ok(())
}

fn consume_lambda(stmt: &Stmt, live: &str) -> Expr {
    match stmt {
        // the degenerate implicit consume: nothing left to do per element
        Stmt::Expr(Expr::Name(n)) if n == live => Expr::lambda_block(vec![live], vec![]),
        Stmt::Expr(e) => Expr::lambda(vec![live], e.clone()),
        other => Expr::lambda_block(vec![live], vec![other.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::{BinaryOp, TypeRef};
    use crate::core::LoopBuilder;
    use crate::pipeline::ReducerKind;
    use crate::resolve::SerialNames;

    fn lp() -> ForEachLoop {
        LoopBuilder::over("items", "x").build()
    }

    #[test]
    fn sole_consume_chains_directly_without_view() {
        let ops = vec![CandidateOp::Consume {
            stmt: Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])),
        }];
        let p = PipelineBuilder::build(&lp(), &ops, &mut SerialNames::new()).unwrap();
        assert!(!p.explicit_view);
        assert_eq!(p.terminal.method, "forEach");
    }

    #[test]
    fn chained_consume_is_ordered_and_viewed() {
        let ops = vec![
            CandidateOp::Filter {
                predicate: Expr::binary(BinaryOp::Gt, Expr::name("x"), Expr::int(0)),
            },
            CandidateOp::Consume {
                stmt: Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])),
            },
        ];
        let p = PipelineBuilder::build(&lp(), &ops, &mut SerialNames::new()).unwrap();
        assert!(p.explicit_view);
        assert_eq!(p.stages.len(), 1);
        assert_eq!(p.terminal.method, "forEachOrdered");
    }

    #[test]
    fn counting_reduce_inserts_map_to_literal_one() {
        let ops = vec![CandidateOp::Reduce {
            kind: ReducerKind::Increment,
            accumulator: "i".into(),
            acc_type: Some(TypeRef::named("int")),
            value: None,
        }];
        let p = PipelineBuilder::build(&lp(), &ops, &mut SerialNames::new()).unwrap();
        assert_eq!(p.stages.len(), 1);
        assert_eq!(p.stages[0].method, "map");
        assert_eq!(p.terminal.method, "reduce");
        assert_eq!(p.terminal.args[0], Expr::name("i"));
        assert_eq!(p.terminal.args[1], Expr::method_ref("Integer", "sum"));
    }

    #[test]
    fn value_reduce_maps_only_nontrivial_values() {
        let trivial = vec![CandidateOp::Reduce {
            kind: ReducerKind::Sum,
            accumulator: "sum".into(),
            acc_type: Some(TypeRef::named("int")),
            value: Some(Expr::name("x")),
        }];
        let p = PipelineBuilder::build(&lp(), &trivial, &mut SerialNames::new()).unwrap();
        assert!(p.stages.is_empty());

        let mapped = vec![CandidateOp::Reduce {
            kind: ReducerKind::Sum,
            accumulator: "sum".into(),
            acc_type: Some(TypeRef::named("int")),
            value: Some(Expr::call(Some(Expr::name("x")), "length", vec![])),
        }];
        let p = PipelineBuilder::build(&lp(), &mapped, &mut SerialNames::new()).unwrap();
        assert_eq!(p.stages.len(), 1);
        assert_eq!(p.stages[0].method, "map");
    }

    #[test]
    fn stale_binding_reference_is_an_inconsistency() {
        let ops = vec![
            CandidateOp::Transform {
                expr: Expr::call(Some(Expr::name("x")), "trim", vec![]),
                produced: "s".into(),
            },
            CandidateOp::Consume {
                // refers to x, which the transform retired
                stmt: Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])),
            },
        ];
        let err = PipelineBuilder::build(&lp(), &ops, &mut SerialNames::new()).unwrap_err();
        assert_eq!(
            err,
            BuildError::StaleBinding {
                binding: "x".into()
            }
        );
    }

    #[test]
    fn misplaced_and_multiple_terminals_are_inconsistencies() {
        let consume = CandidateOp::Consume {
            stmt: Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])),
        };
        let filter = CandidateOp::Filter {
            predicate: Expr::name("c"),
        };

        let err =
            PipelineBuilder::build(&lp(), &[consume.clone(), filter], &mut SerialNames::new())
                .unwrap_err();
        assert_eq!(err, BuildError::MisplacedTerminal);

        let err = PipelineBuilder::build(
            &lp(),
            &[consume.clone(), consume],
            &mut SerialNames::new(),
        )
        .unwrap_err();
        assert_eq!(err, BuildError::MultipleTerminals);
    }

    #[test]
    fn fresh_names_avoid_bindings_already_in_scope() {
        let ops = vec![CandidateOp::Reduce {
            kind: ReducerKind::Increment,
            accumulator: "i".into(),
            acc_type: Some(TypeRef::named("int")),
            value: None,
        }];
        let mut names = SerialNames::reserving(["_item".to_string()]);
        let p = PipelineBuilder::build(&lp(), &ops, &mut names).unwrap();
        match &p.stages[0].args[0] {
            Expr::Lambda { params, .. } => assert_eq!(params[0], "_item1"),
            other => panic!("expected lambda, got {other:?}"),
        }
    }
}
