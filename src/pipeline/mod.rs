//! Operation model and pipeline value types.
//!
//! Body parsing classifies each loop statement into a [`CandidateOp`]; the
//! pipeline builder turns the ordered sequence into a [`Pipeline`], an
//! immutable value holding the chained stage expressions and the terminal
//! kind. Operation order always equals source statement order, and at most
//! one terminal appears, always last; the builder enforces both.

pub mod builder;
pub mod parser;
pub mod reduce;
pub mod wrapper;

use crate::core::ast::{Expr, Stmt, TypeRef};
use serde::{Deserialize, Serialize};

pub use builder::PipelineBuilder;
pub use parser::BodyParser;
pub use reduce::{ReducePattern, ReducerKind};

/// One classified loop-body operation.
///
/// `Transform` and `PassThrough` are the two transform flavors: the first is
/// a pure mapping out of a local binding and produces a new live binding; the
/// second evaluates a statement for effect and re-emits the live binding
/// unchanged, which keeps side-effect order intact relative to later stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CandidateOp {
    Transform {
        expr: Expr,
        produced: String,
    },
    PassThrough {
        stmt: Stmt,
    },
    Filter {
        predicate: Expr,
    },
    Consume {
        stmt: Stmt,
    },
    Reduce {
        kind: ReducerKind,
        accumulator: String,
        acc_type: Option<TypeRef>,
        /// The value folded per element: the update's right-hand side for
        /// arithmetic kinds, the non-accumulator argument for min/max. Absent
        /// for counting kinds, which fold a synthesized literal instead.
        value: Option<Expr>,
    },
    AnyMatch {
        predicate: Expr,
    },
    NoneMatch {
        predicate: Expr,
    },
}

impl CandidateOp {
    /// Terminal operations consume the sequence rather than producing one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CandidateOp::Consume { .. }
                | CandidateOp::Reduce { .. }
                | CandidateOp::AnyMatch { .. }
                | CandidateOp::NoneMatch { .. }
        )
    }

    /// The new live binding this operation introduces, if any.
    pub fn produced_binding(&self) -> Option<&str> {
        match self {
            CandidateOp::Transform { produced, .. } => Some(produced),
            _ => None,
        }
    }

    /// Every simple name this operation's carried source references. Used for
    /// the live-binding threading checks in the parser and builder.
    pub fn references(&self) -> std::collections::HashSet<String> {
        match self {
            CandidateOp::Transform { expr, .. } => expr.referenced_names(),
            CandidateOp::Filter { predicate }
            | CandidateOp::AnyMatch { predicate }
            | CandidateOp::NoneMatch { predicate } => predicate.referenced_names(),
            CandidateOp::PassThrough { stmt } | CandidateOp::Consume { stmt } => {
                let mut names = std::collections::HashSet::new();
                stmt.walk_exprs(&mut |e| {
                    if let Expr::Name(n) = e {
                        names.insert(n.clone());
                    }
                });
                names
            }
            CandidateOp::Reduce { value, .. } => value
                .as_ref()
                .map(Expr::referenced_names)
                .unwrap_or_default(),
        }
    }
}

/// Terminal flavor of a built pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalKind {
    Consume,
    Reduce { accumulator: String },
    AnyMatch,
    NoneMatch,
}

/// One chained stage call: method name plus argument expressions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub method: String,
    pub args: Vec<Expr>,
}

impl Stage {
    pub fn new(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Stage {
            method: method.into(),
            args,
        }
    }
}

/// A fully assembled pipeline: source, optional explicit sequence-view
/// conversion, ordered non-terminal stages, and the terminal stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub source: Expr,
    /// Whether an explicit `.stream()` view conversion is inserted. A lone
    /// consume terminal chains directly on the collection instead.
    pub explicit_view: bool,
    pub stages: Vec<Stage>,
    pub terminal: Stage,
    pub terminal_kind: TerminalKind,
}

impl Pipeline {
    /// Folds the pipeline into a single chained call expression.
    pub fn into_expr(self) -> Expr {
        let mut chain = self.source;
        if self.explicit_view {
            chain = Expr::call(Some(chain), "stream", vec![]);
        }
        for stage in self.stages {
            chain = Expr::call(Some(chain), stage.method, stage.args);
        }
        Expr::call(Some(chain), self.terminal.method, self.terminal.args)
    }
}
