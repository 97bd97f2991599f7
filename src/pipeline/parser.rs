//! Loop body parsing and operation classification.
//!
//! Walks body statements in source order against a live element binding that
//! updates as transform stages are discovered. Each statement classifies into
//! one of the candidate operation shapes; conditional bodies are parsed
//! recursively. The parser runs only on loops the safety analysis accepted;
//! shapes it cannot express degrade to `None`, never to a wrong sequence.
//!
//! Positional rules worth calling out:
//!
//! - A conditional that is not the last statement cannot become a filter (it
//!   would wrongly gate the statements after it), so it degrades
//!   to a pass-through transform. The trailing conditional becomes a filter
//!   with its then-branch parsed as the filtered continuation, including when
//!   that branch holds the trailing reduce.
//! - A continue-equivalent conditional becomes a negated filter and the rest
//!   of the body is parsed as its continuation.
//! - A guarded boolean-literal return classifies as a match terminal only in
//!   a boolean-search loop and only in trailing position.
//! - An accumulation update anywhere but trailing position aborts: the
//!   converted form would mutate an outer binding from inside a stage.

use crate::core::ast::{Expr, ForEachLoop, Literal, Stmt};
use crate::pipeline::{reduce, CandidateOp};
use crate::resolve::TypeResolver;
use im::HashSet as ImSet;

pub struct BodyParser<'a> {
    resolver: &'a dyn TypeResolver,
    boolean_search: bool,
}

impl<'a> BodyParser<'a> {
    pub fn new(resolver: &'a dyn TypeResolver, boolean_search: bool) -> Self {
        BodyParser {
            resolver,
            boolean_search,
        }
    }

    /// Classifies the loop body into an ordered operation sequence ending in
    /// exactly one terminal, or `None` when the body has no faithful
    /// pipeline rendering.
    pub fn parse(&self, lp: &ForEachLoop) -> Option<Vec<CandidateOp>> {
        let mut ops = Vec::new();
        let live = self.parse_stmts(&lp.body, lp.binding.clone(), ImSet::new(), &mut ops)?;

        if ops.is_empty() {
            return None;
        }
        if !ops.last().is_some_and(CandidateOp::is_terminal) {
            // degenerate tail (e.g. an empty filtered branch): consume the
            // live binding with an empty action to keep the chain terminal
            ops.push(CandidateOp::Consume {
                stmt: Stmt::Expr(Expr::name(&live)),
            });
        }
        if ops.iter().filter(|op| op.is_terminal()).count() != 1 {
            log::debug!("operation sequence has a non-trailing terminal; not converting");
            return None;
        }
        Some(ops)
    }

    /// Parses a tail slice of statements. Returns the live binding after the
    /// slice; `poisoned` carries locals that were declared but never became
    /// the live binding; any later reference to one aborts.
    fn parse_stmts(
        &self,
        stmts: &[Stmt],
        mut live: String,
        mut poisoned: ImSet<String>,
        ops: &mut Vec<CandidateOp>,
    ) -> Option<String> {
        for (i, stmt) in stmts.iter().enumerate() {
            let is_last = i + 1 == stmts.len();
            match stmt {
                Stmt::Local { name, init, .. } => {
                    if is_last {
                        self.push_checked(
                            CandidateOp::Consume { stmt: stmt.clone() },
                            &poisoned,
                            ops,
                        )?;
                    } else if init.is_pure() {
                        if name == &live {
                            // shadowing the live binding is ambiguous
                            return None;
                        }
                        self.push_checked(
                            CandidateOp::Transform {
                                expr: init.clone(),
                                produced: name.clone(),
                            },
                            &poisoned,
                            ops,
                        )?;
                        live = name.clone();
                    } else {
                        // effectful initializer: keep evaluation order, but
                        // the declared name never enters the pipeline
                        poisoned.insert(name.clone());
                        self.push_checked(
                            CandidateOp::PassThrough { stmt: stmt.clone() },
                            &poisoned,
                            ops,
                        )?;
                    }
                }

                Stmt::If {
                    cond,
                    then_body,
                    else_body,
                } => {
                    if else_body.is_none() && is_continue_branch(then_body) {
                        self.push_checked(
                            CandidateOp::Filter {
                                predicate: cond.clone().negate(),
                            },
                            &poisoned,
                            ops,
                        )?;
                        if is_last {
                            return Some(live);
                        }
                        return self.parse_stmts(&stmts[i + 1..], live, poisoned, ops);
                    }

                    if else_body.is_none() {
                        if let Some(returns) = boolean_return_branch(then_body) {
                            if !(self.boolean_search && is_last) {
                                return None;
                            }
                            let op = if returns {
                                CandidateOp::AnyMatch {
                                    predicate: cond.clone(),
                                }
                            } else {
                                CandidateOp::NoneMatch {
                                    predicate: cond.clone(),
                                }
                            };
                            self.push_checked(op, &poisoned, ops)?;
                            continue;
                        }

                        if is_last {
                            self.push_checked(
                                CandidateOp::Filter {
                                    predicate: cond.clone(),
                                },
                                &poisoned,
                                ops,
                            )?;
                            live = self.parse_stmts(then_body, live, poisoned.clone(), ops)?;
                            continue;
                        }
                    }

                    // else-carrying or mid-body conditional: evaluate in
                    // place; abort if it hides an accumulation update
                    if self.contains_reduce(then_body)
                        || else_body
                            .as_deref()
                            .is_some_and(|b| self.contains_reduce(b))
                    {
                        return None;
                    }
                    let op = if is_last {
                        CandidateOp::Consume { stmt: stmt.clone() }
                    } else {
                        CandidateOp::PassThrough { stmt: stmt.clone() }
                    };
                    self.push_checked(op, &poisoned, ops)?;
                }

                Stmt::Expr(_) => {
                    if let Some(pattern) = reduce::detect(stmt, self.resolver) {
                        if !is_last {
                            return None;
                        }
                        self.push_checked(
                            CandidateOp::Reduce {
                                kind: pattern.kind,
                                accumulator: pattern.accumulator,
                                acc_type: pattern.acc_type,
                                value: pattern.value,
                            },
                            &poisoned,
                            ops,
                        )?;
                    } else if is_last {
                        for op in decompose_consume(stmt, &live) {
                            self.push_checked(op, &poisoned, ops)?;
                        }
                    } else {
                        self.push_checked(
                            CandidateOp::PassThrough { stmt: stmt.clone() },
                            &poisoned,
                            ops,
                        )?;
                    }
                }

                // the safety analysis already rejected these; reaching one
                // here means the caller skipped the gate
                Stmt::Return(_) | Stmt::Break | Stmt::Continue => return None,
                Stmt::ForEach(_) | Stmt::While { .. } => return None,
            }
        }
        Some(live)
    }

    fn push_checked(
        &self,
        op: CandidateOp,
        poisoned: &ImSet<String>,
        ops: &mut Vec<CandidateOp>,
    ) -> Option<()> {
        if op.references().iter().any(|n| poisoned.contains(n)) {
            log::debug!("statement references a binding unavailable to the pipeline");
            return None;
        }
        ops.push(op);
        Some(())
    }

    fn contains_reduce(&self, stmts: &[Stmt]) -> bool {
        stmts.iter().any(|s| {
            if reduce::detect(s, self.resolver).is_some() {
                return true;
            }
            match s {
                Stmt::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.contains_reduce(then_body)
                        || else_body.as_deref().is_some_and(|b| self.contains_reduce(b))
                }
                _ => false,
            }
        })
    }
}

/// `{ continue; }`, the continue-equivalent then-branch.
fn is_continue_branch(then_body: &[Stmt]) -> bool {
    matches!(then_body, [Stmt::Continue])
}

/// `{ return true; }` / `{ return false; }`, the match-pattern then-branch.
fn boolean_return_branch(then_body: &[Stmt]) -> Option<bool> {
    match then_body {
        [Stmt::Return(Some(Expr::Lit(Literal::Bool(b))))] => Some(*b),
        _ => None,
    }
}

/// Splits a trailing single-argument call into transform + consume when the
/// argument is a nontrivial pure expression of the live binding:
/// `print(x.toString())` → `.map(x -> x.toString()).forEachOrdered(print)`.
fn decompose_consume(stmt: &Stmt, live: &str) -> Vec<CandidateOp> {
    if let Stmt::Expr(Expr::Call {
        receiver,
        method,
        args,
    }) = stmt
    {
        if let [arg] = args.as_slice() {
            let receiver_uses_live = receiver
                .as_ref()
                .is_some_and(|r| r.referenced_names().contains(live));
            let trivial = matches!(arg, Expr::Name(n) if n == live);
            if !receiver_uses_live
                && !trivial
                && arg.is_pure()
                && arg.referenced_names().contains(live)
            {
                let consume_call = Expr::Call {
                    receiver: receiver.clone(),
                    method: method.clone(),
                    args: vec![Expr::name(live)],
                };
                return vec![
                    CandidateOp::Transform {
                        expr: arg.clone(),
                        produced: live.to_string(),
                    },
                    CandidateOp::Consume {
                        stmt: Stmt::Expr(consume_call),
                    },
                ];
            }
        }
    }
    vec![CandidateOp::Consume { stmt: stmt.clone() }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::{AssignOp, BinaryOp, TypeRef, UnaryOp};
    use crate::core::LoopBuilder;
    use crate::pipeline::ReducerKind;
    use crate::resolve::ScopeTypes;

    fn scope() -> ScopeTypes {
        ScopeTypes::new()
            .with("items", TypeRef::generic("List", vec![TypeRef::named("String")]))
            .with("i", TypeRef::named("int"))
            .with("total", TypeRef::named("String"))
    }

    fn parse(lp: &ForEachLoop) -> Option<Vec<CandidateOp>> {
        let s = scope();
        BodyParser::new(&s, lp.boolean_search).parse(lp)
    }

    #[test]
    fn trailing_statement_becomes_consume() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])))
            .build();
        let ops = parse(&lp).unwrap();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], CandidateOp::Consume { .. }));
    }

    #[test]
    fn trailing_call_with_nontrivial_argument_decomposes() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Expr(Expr::call(
                None,
                "println",
                vec![Expr::call(Some(Expr::name("x")), "toString", vec![])],
            )))
            .build();
        let ops = parse(&lp).unwrap();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], CandidateOp::Transform { produced, .. } if produced == "x"));
        assert!(matches!(ops[1], CandidateOp::Consume { .. }));
    }

    #[test]
    fn local_binding_becomes_transform_with_new_live_binding() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Local {
                name: "s".into(),
                ty: Some(TypeRef::named("String")),
                init: Expr::call(Some(Expr::name("x")), "trim", vec![]),
            })
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("s")])))
            .build();
        let ops = parse(&lp).unwrap();
        assert_eq!(ops[0].produced_binding(), Some("s"));
        assert!(matches!(ops[1], CandidateOp::Consume { .. }));
    }

    #[test]
    fn trailing_conditional_becomes_filter_plus_continuation() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::binary(BinaryOp::Gt, Expr::name("x"), Expr::int(0)),
                then_body: vec![Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")]))],
                else_body: None,
            })
            .build();
        let ops = parse(&lp).unwrap();
        assert!(matches!(ops[0], CandidateOp::Filter { .. }));
        assert!(matches!(ops[1], CandidateOp::Consume { .. }));
    }

    #[test]
    fn mid_body_conditional_passes_through() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::name("verbose"),
                then_body: vec![Stmt::Expr(Expr::call(None, "trace", vec![Expr::name("x")]))],
                else_body: None,
            })
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])))
            .build();
        let ops = parse(&lp).unwrap();
        assert!(matches!(ops[0], CandidateOp::PassThrough { .. }));
        assert!(matches!(ops[1], CandidateOp::Consume { .. }));
    }

    #[test]
    fn continue_equivalent_becomes_negated_filter() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::binary(
                    BinaryOp::Eq,
                    Expr::name("x"),
                    Expr::Lit(Literal::Null),
                ),
                then_body: vec![Stmt::Continue],
                else_body: None,
            })
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])))
            .build();
        let ops = parse(&lp).unwrap();
        assert!(matches!(
            &ops[0],
            CandidateOp::Filter { predicate: Expr::Unary { op: UnaryOp::Not, .. } }
        ));
        assert!(matches!(ops[1], CandidateOp::Consume { .. }));
    }

    #[test]
    fn trailing_counting_update_becomes_reduce() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Expr(Expr::unary(UnaryOp::PostIncrement, Expr::name("i"))))
            .build();
        let ops = parse(&lp).unwrap();
        assert!(matches!(
            &ops[0],
            CandidateOp::Reduce { kind: ReducerKind::Increment, accumulator, .. } if accumulator == "i"
        ));
    }

    #[test]
    fn filtered_trailing_reduce_parses_as_filter_then_reduce() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::binary(BinaryOp::Gt, Expr::name("x"), Expr::int(0)),
                then_body: vec![Stmt::Expr(Expr::unary(
                    UnaryOp::PostIncrement,
                    Expr::name("i"),
                ))],
                else_body: None,
            })
            .build();
        let ops = parse(&lp).unwrap();
        assert!(matches!(ops[0], CandidateOp::Filter { .. }));
        assert!(matches!(ops[1], CandidateOp::Reduce { .. }));
    }

    #[test]
    fn mid_body_accumulation_aborts() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Expr(Expr::unary(UnaryOp::PostIncrement, Expr::name("i"))))
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")])))
            .build();
        assert!(parse(&lp).is_none());
    }

    #[test]
    fn guarded_boolean_return_classifies_by_literal() {
        let any = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::name("c"),
                then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(true))))],
                else_body: None,
            })
            .searches_boolean()
            .build();
        let ops = parse(&any).unwrap();
        assert!(matches!(ops[0], CandidateOp::AnyMatch { .. }));

        let none = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::name("c"),
                then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(false))))],
                else_body: None,
            })
            .searches_boolean()
            .build();
        let ops = parse(&none).unwrap();
        assert!(matches!(ops[0], CandidateOp::NoneMatch { .. }));
    }

    #[test]
    fn match_shape_without_search_hint_aborts() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::If {
                cond: Expr::name("c"),
                then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(true))))],
                else_body: None,
            })
            .build();
        assert!(parse(&lp).is_none());
    }

    #[test]
    fn pass_through_order_matches_source_order() {
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Expr(Expr::call(None, "first", vec![Expr::name("x")])))
            .stmt(Stmt::Expr(Expr::call(None, "second", vec![Expr::name("x")])))
            .stmt(Stmt::If {
                cond: Expr::name("c"),
                then_body: vec![Stmt::Expr(Expr::unary(
                    UnaryOp::PostIncrement,
                    Expr::name("i"),
                ))],
                else_body: None,
            })
            .build();
        let ops = parse(&lp).unwrap();
        let kinds: Vec<&str> = ops
            .iter()
            .map(|op| match op {
                CandidateOp::PassThrough { .. } => "pass",
                CandidateOp::Filter { .. } => "filter",
                CandidateOp::Reduce { .. } => "reduce",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["pass", "pass", "filter", "reduce"]);
    }

    #[test]
    fn reference_to_unthreaded_local_aborts() {
        // the local is declared with an effectful initializer, so it never
        // becomes the live binding; the consumer referencing it cannot be
        // expressed faithfully
        let lp = LoopBuilder::over("items", "x")
            .stmt(Stmt::Local {
                name: "n".into(),
                ty: Some(TypeRef::named("int")),
                init: Expr::unary(UnaryOp::PostIncrement, Expr::name("i")),
            })
            .stmt(Stmt::Expr(Expr::call(None, "println", vec![Expr::name("n")])))
            .build();
        assert!(parse(&lp).is_none());
    }

    #[test]
    fn string_accumulation_keeps_value_expression() {
        let lp = LoopBuilder::over("items", "l")
            .stmt(Stmt::Expr(Expr::assign(
                AssignOp::AddAssign,
                Expr::name("total"),
                Expr::call(None, "f", vec![Expr::name("l")]),
            )))
            .build();
        let ops = parse(&lp).unwrap();
        match &ops[0] {
            CandidateOp::Reduce {
                kind,
                accumulator,
                value,
                ..
            } => {
                assert_eq!(*kind, ReducerKind::StringConcat);
                assert_eq!(accumulator, "total");
                assert!(value.is_some());
            }
            other => panic!("expected reduce, got {other:?}"),
        }
    }
}
