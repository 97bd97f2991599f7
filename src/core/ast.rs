//! Closed syntax model for loop bodies.
//!
//! The engine does not parse source text; the hosting dispatcher hands it an
//! already-built tree of these nodes, one candidate loop at a time. The model
//! is deliberately closed: every statement and expression shape the engine can
//! meet is a variant here, so the classifier is a set of exhaustive matches
//! the compiler checks for completeness.
//!
//! Nodes are plain owned data. Analysis never mutates an input tree; the
//! builder passes construct fresh nodes for the replacement statement.

use serde::{Deserialize, Serialize};

/// A reference to a declared type, e.g. `List<String>` or `int`.
///
/// Generic arguments are carried but comparisons in the analyses go through
/// [`TypeRef::raw_name`], the erased form, so `CopyOnWriteArrayList<Foo>`
/// matches the same table entry as the raw type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef {
            name: name.into(),
            args,
        }
    }

    /// The erased type name: generic arguments stripped, package qualifiers
    /// reduced to the final segment (`java.util.List<String>` → `List`).
    pub fn raw_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether this type is a textual accumulator target.
    pub fn is_textual(&self) -> bool {
        matches!(self.raw_name(), "String" | "CharSequence")
    }

    /// Whether this type is a primitive or boxed numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.raw_name(),
            "int" | "long"
                | "short"
                | "byte"
                | "char"
                | "float"
                | "double"
                | "Integer"
                | "Long"
                | "Short"
                | "Byte"
                | "Character"
                | "Float"
                | "Double"
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    /// Wide integer, rendered with the `L` suffix.
    Long(i64),
    Float(f64),
    /// Narrow floating literal, rendered with the `f` suffix.
    FloatSingle(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// Increment/decrement forms mutate their operand.
    pub fn is_step(self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Assignment operators. The compound forms are the accumulation shapes the
/// reduce detector recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Set,
    AddAssign,
    SubAssign,
    MulAssign,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A simple name reference.
    Name(String),
    /// The enclosing instance.
    This,
    /// Member access, e.g. `this.items` or `config.limit`.
    Field { receiver: Box<Expr>, name: String },
    Lit(Literal),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Method invocation. A `receiver` of `None` is an unqualified call on
    /// the enclosing instance, e.g. `getItems()`.
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    /// Function literal synthesized for pipeline stages.
    Lambda {
        params: Vec<String>,
        body: LambdaBody,
    },
    /// Named function reference, e.g. `Integer::sum`.
    MethodRef { owner: String, method: String },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression evaluated for effect.
    Expr(Expr),
    /// Local binding with initializer: `String s = l.toString();`
    Local {
        name: String,
        ty: Option<TypeRef>,
        init: Expr,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    /// Nested bounded iteration. Presence anywhere in a candidate body is a
    /// structural rejection; the variant exists so the checker can see it.
    ForEach(Box<ForEachLoop>),
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
}

/// One candidate loop: the iteration header plus its ordered body.
///
/// `boolean_search` is supplied by the caller when the enclosing function is
/// known to return a boolean result fed by early returns out of this loop;
/// it sanctions the guarded-return match shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForEachLoop {
    pub source: Expr,
    pub binding: String,
    pub element_type: TypeRef,
    pub body: Vec<Stmt>,
    pub boolean_search: bool,
}

impl Expr {
    pub fn name(n: impl Into<String>) -> Self {
        Expr::Name(n.into())
    }

    pub fn int(v: i64) -> Self {
        Expr::Lit(Literal::Int(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Lit(Literal::Str(s.into()))
    }

    pub fn field(receiver: Expr, name: impl Into<String>) -> Self {
        Expr::Field {
            receiver: Box::new(receiver),
            name: name.into(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(op: AssignOp, target: Expr, value: Expr) -> Self {
        Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn call(receiver: Option<Expr>, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: receiver.map(Box::new),
            method: method.into(),
            args,
        }
    }

    pub fn method_ref(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Expr::MethodRef {
            owner: owner.into(),
            method: method.into(),
        }
    }

    pub fn lambda(params: Vec<&str>, body: Expr) -> Self {
        Expr::Lambda {
            params: params.into_iter().map(String::from).collect(),
            body: LambdaBody::Expr(Box::new(body)),
        }
    }

    pub fn lambda_block(params: Vec<&str>, body: Vec<Stmt>) -> Self {
        Expr::Lambda {
            params: params.into_iter().map(String::from).collect(),
            body: LambdaBody::Block(body),
        }
    }

    pub fn negate(self) -> Self {
        Expr::unary(UnaryOp::Not, Expr::Paren(Box::new(self)))
    }

    /// Visits this expression and every nested sub-expression, outside-in.
    /// Lambda bodies are entered, including statement bodies.
    pub fn walk(&self, visit: &mut impl FnMut(&Expr)) {
        visit(self);
        match self {
            Expr::Name(_) | Expr::This | Expr::Lit(_) | Expr::MethodRef { .. } => {}
            Expr::Field { receiver, .. } => receiver.walk(visit),
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Expr::Assign { target, value, .. } => {
                target.walk(visit);
                value.walk(visit);
            }
            Expr::Call { receiver, args, .. } => {
                if let Some(r) = receiver {
                    r.walk(visit);
                }
                for a in args {
                    a.walk(visit);
                }
            }
            Expr::Lambda { body, .. } => match body {
                LambdaBody::Expr(e) => e.walk(visit),
                LambdaBody::Block(stmts) => {
                    for s in stmts {
                        s.walk_exprs(visit);
                    }
                }
            },
            Expr::Cast { expr, .. } => expr.walk(visit),
            Expr::Paren(inner) => inner.walk(visit),
        }
    }

    /// Collects every simple name referenced anywhere in the expression.
    pub fn referenced_names(&self) -> std::collections::HashSet<String> {
        let mut names = std::collections::HashSet::new();
        self.walk(&mut |e| {
            if let Expr::Name(n) = e {
                names.insert(n.clone());
            }
        });
        names
    }

    /// True when the expression contains no assignment or step operator.
    /// Calls are not inspected; statement-level effects are routed separately
    /// by the parser, which is where an effectful call gets classified.
    pub fn is_pure(&self) -> bool {
        let mut pure = true;
        self.walk(&mut |e| match e {
            Expr::Assign { .. } => pure = false,
            Expr::Unary { op, .. } if op.is_step() => pure = false,
            _ => {}
        });
        pure
    }
}

impl Stmt {
    /// Visits every expression in this statement, including those nested in
    /// conditional bodies. Nested loops are entered as well; the precondition
    /// checker rejects them before anything downstream relies on this.
    pub fn walk_exprs(&self, visit: &mut impl FnMut(&Expr)) {
        match self {
            Stmt::Expr(e) => e.walk(visit),
            Stmt::Local { init, .. } => init.walk(visit),
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                cond.walk(visit);
                for s in then_body {
                    s.walk_exprs(visit);
                }
                if let Some(else_body) = else_body {
                    for s in else_body {
                        s.walk_exprs(visit);
                    }
                }
            }
            Stmt::Return(Some(e)) => e.walk(visit),
            Stmt::Return(None) | Stmt::Break | Stmt::Continue => {}
            Stmt::ForEach(inner) => {
                inner.source.walk(visit);
                for s in &inner.body {
                    s.walk_exprs(visit);
                }
            }
            Stmt::While { cond, body } => {
                cond.walk(visit);
                for s in body {
                    s.walk_exprs(visit);
                }
            }
        }
    }

    /// Visits this statement and all nested statements, outside-in.
    pub fn walk(&self, visit: &mut impl FnMut(&Stmt)) {
        visit(self);
        match self {
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                for s in then_body {
                    s.walk(visit);
                }
                if let Some(else_body) = else_body {
                    for s in else_body {
                        s.walk(visit);
                    }
                }
            }
            Stmt::ForEach(inner) => {
                for s in &inner.body {
                    s.walk(visit);
                }
            }
            Stmt::While { body, .. } => {
                for s in body {
                    s.walk(visit);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_name_strips_generics_and_packages() {
        let ty = TypeRef::generic("java.util.List", vec![TypeRef::named("String")]);
        assert_eq!(ty.raw_name(), "List");
        assert_eq!(TypeRef::named("int").raw_name(), "int");
    }

    #[test]
    fn referenced_names_reaches_into_calls_and_lambdas() {
        let expr = Expr::call(
            Some(Expr::name("list")),
            "map",
            vec![Expr::lambda(
                vec!["x"],
                Expr::binary(BinaryOp::Add, Expr::name("x"), Expr::name("offset")),
            )],
        );
        let names = expr.referenced_names();
        assert!(names.contains("list"));
        assert!(names.contains("x"));
        assert!(names.contains("offset"));
    }

    #[test]
    fn purity_rejects_assignments_and_steps() {
        assert!(Expr::call(Some(Expr::name("l")), "toString", vec![]).is_pure());
        assert!(!Expr::assign(AssignOp::Set, Expr::name("a"), Expr::int(1)).is_pure());
        assert!(!Expr::unary(UnaryOp::PostIncrement, Expr::name("i")).is_pure());
    }

    #[test]
    fn stmt_walk_enters_conditional_bodies() {
        let stmt = Stmt::If {
            cond: Expr::name("c"),
            then_body: vec![Stmt::Expr(Expr::name("a")), Stmt::Continue],
            else_body: None,
        };
        let mut count = 0;
        stmt.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
    }
}
