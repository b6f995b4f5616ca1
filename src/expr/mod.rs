//! Row-level expressions used by filters and derived columns.
//!
//! Expressions are built with [`col`] and [`lit`] plus the combinators on
//! [`Expr`], then bound against a [`Schema`](crate::table::Schema) before any
//! row is evaluated. Binding is where unknown columns and incompatible types
//! are reported, so evaluation itself cannot fail.

mod eval;

pub use eval::{bind, BoundExpr};

use std::{fmt, ops};

use crate::table::Value;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

/// Unbound expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Substring containment on a text expression.
    Contains {
        expr: Box<Expr>,
        pattern: String,
    },
    /// Set membership.
    IsIn {
        expr: Box<Expr>,
        list: Vec<Value>,
    },
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Numeric addition.
    Add(Box<Expr>, Box<Expr>),
    /// Integer cast that yields null when the input does not parse.
    TryCastInt(Box<Expr>),
}

/// Reference a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn compare(self, op: CompareOp, other: impl Into<Expr>) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    pub fn equals(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Eq, other)
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::NotEq, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lt, other)
    }

    pub fn lt_eq(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::LtEq, other)
    }

    /// Ordinal "greater than". On text this is plain byte-wise string order,
    /// so `"DAMAGED 5" > "DAMAGED 4"` holds but `"DAMAGED 10" > "DAMAGED 9"` does not.
    pub fn gt(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gt, other)
    }

    pub fn gt_eq(self, other: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::GtEq, other)
    }

    pub fn contains(self, pattern: impl Into<String>) -> Expr {
        Expr::Contains {
            expr: Box::new(self),
            pattern: pattern.into(),
        }
    }

    pub fn is_in<I, V>(self, list: I) -> Expr
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Expr::IsIn {
            expr: Box::new(self),
            list: list.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self))
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(Box::new(self))
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn try_cast_int(self) -> Expr {
        Expr::TryCastInt(Box::new(self))
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit(s)
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        lit(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        lit(v)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(Value::Str(s)) => write!(f, "{:?}", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Compare { op, left, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::Contains { expr, pattern } => write!(f, "{} contains {:?}", expr, pattern),
            Expr::IsIn { expr, list } => {
                let items: Vec<String> = list
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => format!("{:?}", s),
                        other => other.to_string(),
                    })
                    .collect();
                write!(f, "{} in [{}]", expr, items.join(", "))
            }
            Expr::IsNull(e) => write!(f, "{} is null", e),
            Expr::IsNotNull(e) => write!(f, "{} is not null", e),
            Expr::And(l, r) => write!(f, "({} and {})", l, r),
            Expr::Or(l, r) => write!(f, "({} or {})", l, r),
            Expr::Not(e) => write!(f, "not ({})", e),
            Expr::Add(l, r) => write!(f, "({} + {})", l, r),
            Expr::TryCastInt(e) => write!(f, "try_cast_int({})", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_readable_predicates() {
        let e = col("VEH_BODY_STYL_ID")
            .contains("MOTORCYCLE")
            .or(!col("VEH_MAKE_ID").is_in(["NA", "UNKNOWN"]));
        assert_eq!(
            e.to_string(),
            r#"(VEH_BODY_STYL_ID contains "MOTORCYCLE" or not (VEH_MAKE_ID in ["NA", "UNKNOWN"]))"#
        );
        assert_eq!(
            (col("TOT_INJRY_CNT") + col("DEATH_CNT")).to_string(),
            "(TOT_INJRY_CNT + DEATH_CNT)"
        );
    }
}
