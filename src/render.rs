//! Source-text rendering of the syntax model.
//!
//! Produces the flat textual form of expressions and statements: what tests
//! assert against and what hosts without their own pretty-printer can splice
//! into an edit. Blocks render inline with single spaces; precedence is
//! tracked so no redundant parentheses are emitted around the common chain
//! shapes.

use crate::core::ast::{AssignOp, BinaryOp, Expr, LambdaBody, Literal, Stmt, TypeRef, UnaryOp};
use std::fmt;

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Long(v) => write!(f, "{v}L"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::FloatSingle(v) => write!(f, "{v:?}f"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Char(c) => write!(f, "'{c}'"),
            Literal::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{op}")
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AssignOp::Set => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
        };
        write!(f, "{op}")
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Lambda { .. } => 0,
        Expr::Assign { .. } => 1,
        Expr::Binary { op, .. } => match op {
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
        },
        Expr::Unary { op, .. } if !op.is_step() => 8,
        Expr::Cast { .. } => 8,
        Expr::Unary { .. } | Expr::Call { .. } | Expr::Field { .. } => 9,
        Expr::Name(_) | Expr::This | Expr::Lit(_) | Expr::MethodRef { .. } | Expr::Paren(_) => 10,
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &Expr, min: u8) -> fmt::Result {
    if precedence(child) < min {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(n) => write!(f, "{n}"),
            Expr::This => write!(f, "this"),
            Expr::Field { receiver, name } => {
                write_child(f, receiver.as_ref(), 9)?;
                write!(f, ".{name}")
            }
            Expr::Lit(lit) => write!(f, "{lit}"),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => {
                    write!(f, "!")?;
                    write_child(f, operand.as_ref(), 8)
                }
                UnaryOp::Neg => {
                    write!(f, "-")?;
                    write_child(f, operand.as_ref(), 8)
                }
                UnaryOp::PreIncrement => {
                    write!(f, "++")?;
                    write_child(f, operand.as_ref(), 9)
                }
                UnaryOp::PreDecrement => {
                    write!(f, "--")?;
                    write_child(f, operand.as_ref(), 9)
                }
                UnaryOp::PostIncrement => {
                    write_child(f, operand.as_ref(), 9)?;
                    write!(f, "++")
                }
                UnaryOp::PostDecrement => {
                    write_child(f, operand.as_ref(), 9)?;
                    write!(f, "--")
                }
            },
            Expr::Binary { op, lhs, rhs } => {
                let prec = precedence(self);
                write_child(f, lhs.as_ref(), prec)?;
                write!(f, " {op} ")?;
                // right operand of a left-associative operator needs parens
                // at equal precedence when the operator is not commutative
                let rhs_min = match op {
                    BinaryOp::Sub | BinaryOp::Div | BinaryOp::Rem => prec + 1,
                    _ => prec,
                };
                write_child(f, rhs.as_ref(), rhs_min)
            }
            Expr::Assign { op, target, value } => {
                write!(f, "{target} {op} {value}")
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write_child(f, receiver.as_ref(), 9)?;
                    write!(f, ".")?;
                }
                write!(f, "{method}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Lambda { params, body } => {
                match params.as_slice() {
                    [single] => write!(f, "{single}")?,
                    many => {
                        write!(f, "(")?;
                        for (i, p) in many.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{p}")?;
                        }
                        write!(f, ")")?;
                    }
                }
                write!(f, " -> ")?;
                match body {
                    LambdaBody::Expr(e) => write!(f, "{e}"),
                    LambdaBody::Block(stmts) => write_block(f, stmts),
                }
            }
            Expr::MethodRef { owner, method } => write!(f, "{owner}::{method}"),
            Expr::Cast { ty, expr } => {
                write!(f, "({ty}) ")?;
                write_child(f, expr.as_ref(), 8)
            }
            Expr::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, stmts: &[Stmt]) -> fmt::Result {
    if stmts.is_empty() {
        return write!(f, "{{}}");
    }
    write!(f, "{{ ")?;
    for stmt in stmts {
        write!(f, "{stmt} ")?;
    }
    write!(f, "}}")
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(e) => write!(f, "{e};"),
            Stmt::Local { name, ty, init } => {
                match ty {
                    Some(ty) => write!(f, "{ty} {name} = {init};"),
                    None => write!(f, "var {name} = {init};"),
                }
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                write!(f, "if ({cond}) ")?;
                write_block(f, then_body)?;
                if let Some(else_body) = else_body {
                    write!(f, " else ")?;
                    write_block(f, else_body)?;
                }
                Ok(())
            }
            Stmt::Return(Some(e)) => write!(f, "return {e};"),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Break => write!(f, "break;"),
            Stmt::Continue => write!(f, "continue;"),
            Stmt::ForEach(lp) => {
                write!(f, "for ({} {} : {}) ", lp.element_type, lp.binding, lp.source)?;
                write_block(f, &lp.body)
            }
            Stmt::While { cond, body } => {
                write!(f, "while ({cond}) ")?;
                write_block(f, body)
            }
        }
    }
}

/// Renders a statement to its flat source form.
pub fn to_source(stmt: &Stmt) -> String {
    stmt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ast::{AssignOp, UnaryOp};

    #[test]
    fn renders_chained_calls_without_extra_parens() {
        let expr = Expr::call(
            Some(Expr::call(
                Some(Expr::call(Some(Expr::name("items")), "stream", vec![])),
                "filter",
                vec![Expr::lambda(
                    vec!["x"],
                    Expr::binary(BinaryOp::Gt, Expr::name("x"), Expr::int(0)),
                )],
            )),
            "forEachOrdered",
            vec![Expr::lambda(
                vec!["x"],
                Expr::call(None, "println", vec![Expr::name("x")]),
            )],
        );
        assert_eq!(
            expr.to_string(),
            "items.stream().filter(x -> x > 0).forEachOrdered(x -> println(x))"
        );
    }

    #[test]
    fn renders_typed_literals() {
        assert_eq!(Literal::Long(1).to_string(), "1L");
        assert_eq!(Literal::Float(1.0).to_string(), "1.0");
        assert_eq!(Literal::FloatSingle(1.0).to_string(), "1.0f");
        assert_eq!(Literal::Str("a\"b".into()).to_string(), "\"a\\\"b\"");
    }

    #[test]
    fn renders_cast_expressions() {
        let cast = Expr::Cast {
            ty: TypeRef::named("byte"),
            expr: Box::new(Expr::int(1)),
        };
        assert_eq!(cast.to_string(), "(byte) 1");
    }

    #[test]
    fn renders_multi_parameter_lambdas_and_method_refs() {
        let fold = Expr::lambda(
            vec!["a", "b"],
            Expr::binary(BinaryOp::Sub, Expr::name("a"), Expr::name("b")),
        );
        assert_eq!(fold.to_string(), "(a, b) -> a - b");
        assert_eq!(Expr::method_ref("Integer", "sum").to_string(), "Integer::sum");
    }

    #[test]
    fn renders_assignment_statement() {
        let stmt = Stmt::Expr(Expr::assign(
            AssignOp::Set,
            Expr::name("i"),
            Expr::call(Some(Expr::name("items")), "size", vec![]),
        ));
        assert_eq!(stmt.to_string(), "i = items.size();");
    }

    #[test]
    fn renders_guarded_return() {
        let stmt = Stmt::If {
            cond: Expr::unary(UnaryOp::Not, Expr::name("found")),
            then_body: vec![Stmt::Return(Some(Expr::Lit(Literal::Bool(false))))],
            else_body: None,
        };
        assert_eq!(stmt.to_string(), "if (!found) { return false; }");
    }

    #[test]
    fn binary_precedence_parenthesizes_only_when_needed() {
        let e = Expr::binary(
            BinaryOp::Mul,
            Expr::Paren(Box::new(Expr::binary(
                BinaryOp::Add,
                Expr::name("a"),
                Expr::name("b"),
            ))),
            Expr::name("c"),
        );
        assert_eq!(e.to_string(), "(a + b) * c");

        let e = Expr::binary(
            BinaryOp::Add,
            Expr::binary(BinaryOp::Mul, Expr::name("a"), Expr::name("b")),
            Expr::name("c"),
        );
        assert_eq!(e.to_string(), "a * b + c");
    }
}
