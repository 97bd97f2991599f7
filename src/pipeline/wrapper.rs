//! Replacement-statement shaping.
//!
//! A built pipeline becomes exactly one statement, chosen by its terminal:
//! a bare expression statement for consumption, an assignment back into the
//! accumulator for reduction, or a guarded conditional reproducing the
//! original early return for the match terminals.

use crate::core::ast::{AssignOp, Expr, Literal, Stmt};
use crate::pipeline::{Pipeline, TerminalKind};

/// Wraps the pipeline expression into its replacement statement shape.
pub fn wrap(pipeline: Pipeline) -> Stmt {
    let kind = pipeline.terminal_kind.clone();
    let expr = pipeline.into_expr();
    match kind {
        TerminalKind::Consume => Stmt::Expr(expr),
        TerminalKind::Reduce { accumulator } => Stmt::Expr(Expr::assign(
            AssignOp::Set,
            Expr::name(accumulator),
            expr,
        )),
        TerminalKind::AnyMatch => Stmt::If {
            cond: expr,
            then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(true))))],
            else_body: None,
        },
        TerminalKind::NoneMatch => Stmt::If {
            cond: expr.negate(),
            then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(false))))],
            else_body: None,
        },
    }
}
