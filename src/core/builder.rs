//! Fluent construction of candidate loops.
//!
//! The builder is the form in which a hosting dispatcher (and the test suite)
//! hands loops to the engine: it assembles a [`ForEachLoop`] from the iterated
//! source, the element binding, and body statements, without the engine ever
//! touching the host's own tree representation.
//!
//! ```
//! use streamliner::core::{Expr, LoopBuilder, Stmt, TypeRef};
//! use streamliner::core::ast::BinaryOp;
//!
//! let lp = LoopBuilder::iterating(Expr::name("items"), "x", TypeRef::named("String"))
//!     .stmt(Stmt::If {
//!         cond: Expr::binary(BinaryOp::Ne, Expr::name("x"), Expr::Lit(
//!             streamliner::core::Literal::Null)),
//!         then_body: vec![Stmt::Expr(Expr::call(None, "println", vec![Expr::name("x")]))],
//!         else_body: None,
//!     })
//!     .build();
//! assert_eq!(lp.binding, "x");
//! ```

use super::ast::{Expr, ForEachLoop, Stmt, TypeRef};

/// Builder for [`ForEachLoop`] values.
#[derive(Clone, Debug)]
pub struct LoopBuilder {
    source: Expr,
    binding: String,
    element_type: TypeRef,
    body: Vec<Stmt>,
    boolean_search: bool,
}

impl LoopBuilder {
    /// Starts a loop over `source`, binding each element as `binding`.
    pub fn iterating(source: Expr, binding: impl Into<String>, element_type: TypeRef) -> Self {
        LoopBuilder {
            source,
            binding: binding.into(),
            element_type,
            body: Vec::new(),
            boolean_search: false,
        }
    }

    /// Convenience for the common case of iterating a named collection.
    pub fn over(collection: impl Into<String>, binding: impl Into<String>) -> Self {
        Self::iterating(
            Expr::name(collection),
            binding,
            TypeRef::named("Object"),
        )
    }

    pub fn element_type(mut self, ty: TypeRef) -> Self {
        self.element_type = ty;
        self
    }

    /// Appends one body statement in source order.
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }

    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.body.extend(stmts);
        self
    }

    /// Marks the loop as a boolean search: the enclosing function returns a
    /// boolean result fed by guarded early returns out of this loop. Without
    /// this, any `return` in the body is an early-exit rejection.
    pub fn searches_boolean(mut self) -> Self {
        self.boolean_search = true;
        self
    }

    pub fn build(self) -> ForEachLoop {
        ForEachLoop {
            source: self.source,
            binding: self.binding,
            element_type: self.element_type,
            body: self.body,
            boolean_search: self.boolean_search,
        }
    }
}
