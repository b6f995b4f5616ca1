use std::{borrow::Cow, cmp::Ordering, collections::HashSet};

use super::{CompareOp, Expr};
use crate::{
    error::{AnalyticsError, Result},
    table::{ColumnType, Schema, Value},
};

/// An expression with column names resolved to positions and literals
/// coerced to the types they are compared against.
#[derive(Debug, Clone)]
pub enum BoundExpr {
    Column {
        index: usize,
        ty: ColumnType,
    },
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },
    Contains {
        expr: Box<BoundExpr>,
        pattern: String,
    },
    IsIn {
        expr: Box<BoundExpr>,
        set: HashSet<Value>,
        has_null: bool,
    },
    IsNull(Box<BoundExpr>),
    IsNotNull(Box<BoundExpr>),
    And(Box<BoundExpr>, Box<BoundExpr>),
    Or(Box<BoundExpr>, Box<BoundExpr>),
    Not(Box<BoundExpr>),
    Add {
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
        ty: ColumnType,
    },
    TryCastInt(Box<BoundExpr>),
}

fn literal_type(v: &Value) -> Option<ColumnType> {
    match v {
        Value::Null => None,
        Value::Bool(_) => Some(ColumnType::Boolean),
        Value::Int(_) => Some(ColumnType::Integer),
        Value::Decimal(_) => Some(ColumnType::Decimal),
        Value::Str(_) => Some(ColumnType::String),
    }
}

fn type_label(ty: Option<ColumnType>) -> String {
    ty.map_or_else(|| "null".to_string(), |t| t.to_string())
}

/// Resolves `expr` against `schema` (belonging to table `table`).
///
/// Unknown columns fail with `SchemaMismatch`, unqualified names that match
/// several join-prefixed columns with `AmbiguousColumn`, and operands that
/// cannot be compared or combined with `TypeMismatch`.
pub fn bind(expr: &Expr, table: &str, schema: &Schema) -> Result<BoundExpr> {
    let bound = match expr {
        Expr::Column(name) => {
            let index = schema.index_of(table, name)?;
            BoundExpr::Column {
                index,
                ty: schema.column(index).ty,
            }
        }
        Expr::Literal(v) => BoundExpr::Literal(v.clone()),
        Expr::Compare { op, left, right } => {
            let left = bind(left, table, schema)?;
            let right = bind(right, table, schema)?;
            let (left, right) = unify_operands(left, right, || {
                format!("`{}` in table `{}`", expr, table)
            })?;
            BoundExpr::Compare {
                op: *op,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        Expr::Contains { expr: inner, pattern } => {
            let bound = bind(inner, table, schema)?;
            match bound.data_type() {
                None => {}
                Some(t) if t.is_textual() => {}
                Some(t) => {
                    return Err(AnalyticsError::type_mismatch(
                        format!("`{}` in table `{}`", expr, table),
                        "string",
                        t.to_string(),
                    ))
                }
            }
            BoundExpr::Contains {
                expr: Box::new(bound),
                pattern: pattern.clone(),
            }
        }
        Expr::IsIn { expr: inner, list } => {
            let bound = bind(inner, table, schema)?;
            let target = bound.data_type();
            let mut set = HashSet::with_capacity(list.len());
            let mut has_null = false;
            for v in list {
                if v.is_null() {
                    has_null = true;
                    continue;
                }
                let coerced = match target {
                    Some(t) => v.coerce_to(t).ok_or_else(|| {
                        AnalyticsError::type_mismatch(
                            format!("`{}` in table `{}`", expr, table),
                            t.to_string(),
                            v.type_name(),
                        )
                    })?,
                    None => v.clone(),
                };
                set.insert(coerced);
            }
            BoundExpr::IsIn {
                expr: Box::new(bound),
                set,
                has_null,
            }
        }
        Expr::IsNull(inner) => BoundExpr::IsNull(Box::new(bind(inner, table, schema)?)),
        Expr::IsNotNull(inner) => BoundExpr::IsNotNull(Box::new(bind(inner, table, schema)?)),
        Expr::And(l, r) | Expr::Or(l, r) => {
            let l = boolean_operand(bind(l, table, schema)?, expr, table)?;
            let r = boolean_operand(bind(r, table, schema)?, expr, table)?;
            if matches!(expr, Expr::And(..)) {
                BoundExpr::And(Box::new(l), Box::new(r))
            } else {
                BoundExpr::Or(Box::new(l), Box::new(r))
            }
        }
        Expr::Not(inner) => {
            BoundExpr::Not(Box::new(boolean_operand(bind(inner, table, schema)?, expr, table)?))
        }
        Expr::Add(l, r) => {
            let l = bind(l, table, schema)?;
            let r = bind(r, table, schema)?;
            let ty = match (l.data_type(), r.data_type()) {
                (Some(ColumnType::Decimal), Some(b)) | (Some(b), Some(ColumnType::Decimal))
                    if b.is_numeric() =>
                {
                    ColumnType::Decimal
                }
                (Some(ColumnType::Decimal), None) | (None, Some(ColumnType::Decimal)) => {
                    ColumnType::Decimal
                }
                (Some(ColumnType::Integer), Some(ColumnType::Integer))
                | (Some(ColumnType::Integer), None)
                | (None, Some(ColumnType::Integer))
                | (None, None) => ColumnType::Integer,
                (a, b) => {
                    return Err(AnalyticsError::type_mismatch(
                        format!("`{}` in table `{}`", expr, table),
                        "numeric operands",
                        format!("{} + {}", type_label(a), type_label(b)),
                    ))
                }
            };
            BoundExpr::Add {
                left: Box::new(l),
                right: Box::new(r),
                ty,
            }
        }
        Expr::TryCastInt(inner) => {
            let bound = bind(inner, table, schema)?;
            if bound.data_type() == Some(ColumnType::Boolean) {
                return Err(AnalyticsError::type_mismatch(
                    format!("`{}` in table `{}`", expr, table),
                    "string or numeric",
                    "boolean",
                ));
            }
            BoundExpr::TryCastInt(Box::new(bound))
        }
    };
    Ok(bound)
}

fn boolean_operand(bound: BoundExpr, expr: &Expr, table: &str) -> Result<BoundExpr> {
    match bound.data_type() {
        None | Some(ColumnType::Boolean) => Ok(bound),
        Some(t) => Err(AnalyticsError::type_mismatch(
            format!("`{}` in table `{}`", expr, table),
            "boolean",
            t.to_string(),
        )),
    }
}

/// Makes two comparison operands type-compatible, coercing a literal side to
/// the other side's type when possible.
fn unify_operands(
    left: BoundExpr,
    right: BoundExpr,
    context: impl Fn() -> String,
) -> Result<(BoundExpr, BoundExpr)> {
    let (lt, rt) = match (left.data_type(), right.data_type()) {
        (Some(lt), Some(rt)) => (lt, rt),
        _ => return Ok((left, right)),
    };
    if lt.comparable_with(rt) {
        return Ok((left, right));
    }
    let mismatch = || AnalyticsError::type_mismatch(context(), lt.to_string(), rt.to_string());
    if let BoundExpr::Literal(v) = &right {
        let coerced = v.coerce_to(lt).ok_or_else(&mismatch)?;
        return Ok((left, BoundExpr::Literal(coerced)));
    }
    if let BoundExpr::Literal(v) = &left {
        let coerced = v.coerce_to(rt).ok_or_else(&mismatch)?;
        return Ok((BoundExpr::Literal(coerced), right));
    }
    Err(mismatch())
}

impl BoundExpr {
    /// Result type; `None` for an untyped null literal.
    pub fn data_type(&self) -> Option<ColumnType> {
        match self {
            BoundExpr::Column { ty, .. } => Some(*ty),
            BoundExpr::Literal(v) => literal_type(v),
            BoundExpr::Add { ty, .. } => Some(*ty),
            BoundExpr::TryCastInt(_) => Some(ColumnType::Integer),
            BoundExpr::Compare { .. }
            | BoundExpr::Contains { .. }
            | BoundExpr::IsIn { .. }
            | BoundExpr::IsNull(_)
            | BoundExpr::IsNotNull(_)
            | BoundExpr::And(..)
            | BoundExpr::Or(..)
            | BoundExpr::Not(_) => Some(ColumnType::Boolean),
        }
    }

    /// Evaluates against one row. Null operands propagate; `AND`/`OR` use
    /// three-valued logic.
    pub fn eval<'a>(&'a self, row: &'a [Value]) -> Cow<'a, Value> {
        match self {
            BoundExpr::Column { index, .. } => Cow::Borrowed(&row[*index]),
            BoundExpr::Literal(v) => Cow::Borrowed(v),
            BoundExpr::Compare { op, left, right } => {
                let (l, r) = (left.eval(row), right.eval(row));
                if l.is_null() || r.is_null() {
                    return Cow::Owned(Value::Null);
                }
                let ord = l.total_cmp(&r);
                let hit = match op {
                    CompareOp::Eq => ord == Ordering::Equal,
                    CompareOp::NotEq => ord != Ordering::Equal,
                    CompareOp::Lt => ord == Ordering::Less,
                    CompareOp::LtEq => ord != Ordering::Greater,
                    CompareOp::Gt => ord == Ordering::Greater,
                    CompareOp::GtEq => ord != Ordering::Less,
                };
                Cow::Owned(Value::Bool(hit))
            }
            BoundExpr::Contains { expr, pattern } => match expr.eval(row).as_ref() {
                Value::Str(s) => Cow::Owned(Value::Bool(s.contains(pattern.as_str()))),
                _ => Cow::Owned(Value::Null),
            },
            BoundExpr::IsIn {
                expr,
                set,
                has_null,
            } => {
                let v = expr.eval(row);
                let out = if v.is_null() {
                    Value::Null
                } else if set.contains(v.as_ref()) {
                    Value::Bool(true)
                } else if *has_null {
                    Value::Null
                } else {
                    Value::Bool(false)
                };
                Cow::Owned(out)
            }
            BoundExpr::IsNull(e) => Cow::Owned(Value::Bool(e.eval(row).is_null())),
            BoundExpr::IsNotNull(e) => Cow::Owned(Value::Bool(!e.eval(row).is_null())),
            BoundExpr::And(l, r) => {
                let out = match (l.eval(row).as_bool(), r.eval(row).as_bool()) {
                    (Some(false), _) | (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                };
                Cow::Owned(out)
            }
            BoundExpr::Or(l, r) => {
                let out = match (l.eval(row).as_bool(), r.eval(row).as_bool()) {
                    (Some(true), _) | (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                };
                Cow::Owned(out)
            }
            BoundExpr::Not(e) => Cow::Owned(match e.eval(row).as_bool() {
                Some(b) => Value::Bool(!b),
                None => Value::Null,
            }),
            BoundExpr::Add { left, right, ty } => {
                let (l, r) = (left.eval(row), right.eval(row));
                let out = match (l.as_ref(), r.as_ref(), ty) {
                    (Value::Null, _, _) | (_, Value::Null, _) => Value::Null,
                    (Value::Int(a), Value::Int(b), ColumnType::Integer) => {
                        Value::Int(a.wrapping_add(*b))
                    }
                    (a, b, _) => match (a.as_f64(), b.as_f64()) {
                        (Some(x), Some(y)) => Value::Decimal(x + y),
                        _ => Value::Null,
                    },
                };
                Cow::Owned(out)
            }
            BoundExpr::TryCastInt(e) => {
                let out = match e.eval(row).as_ref() {
                    Value::Int(v) => Value::Int(*v),
                    Value::Decimal(v) if v.is_finite() => Value::Int(v.trunc() as i64),
                    Value::Str(s) => parse_int_truncating(s).map_or(Value::Null, Value::Int),
                    _ => Value::Null,
                };
                Cow::Owned(out)
            }
        }
    }

    /// A row passes a predicate only when it evaluates to `true`.
    pub fn matches(&self, row: &[Value]) -> bool {
        matches!(self.eval(row).as_ref(), Value::Bool(true))
    }
}

/// Integer value of `s`, dropping a fractional part: `"98.0"` and `"98."`
/// give 98. Exponents, `inf` and `NaN` are not integers.
fn parse_int_truncating(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let (whole, fraction) = s.split_once('.')?;
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match whole {
        "" | "+" | "-" => None,
        w => w.parse::<i64>().ok(),
    }
}
