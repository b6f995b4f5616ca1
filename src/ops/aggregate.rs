use std::{collections::HashMap, sync::Arc};

use tracing::trace;

use crate::{
    error::{AnalyticsError, Result},
    table::{Column, ColumnType, Row, Schema, Table, Value},
};

/// Aggregate functions supported by [`group_by_aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    /// Number of rows in the group, nulls included.
    Count,
    /// Sum of the non-null values of a numeric column.
    Sum,
}

/// One output column of a grouping: `op(input) AS output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub op: AggregateOp,
    pub input: Option<String>,
    pub output: String,
}

impl Aggregate {
    /// Row count, written to a column named `count`.
    pub fn count() -> Self {
        Self {
            op: AggregateOp::Count,
            input: None,
            output: "count".to_string(),
        }
    }

    /// Sum of `input`, written to `sum(<input>)` unless aliased.
    pub fn sum(input: impl Into<String>) -> Self {
        let input = input.into();
        Self {
            op: AggregateOp::Sum,
            output: format!("sum({})", input),
            input: Some(input),
        }
    }

    pub fn alias(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

enum Acc {
    Count(i64),
    IntSum(Option<i64>),
    DecimalSum(Option<f64>),
}

impl Acc {
    fn update(&mut self, value: Option<&Value>) {
        match self {
            Acc::Count(n) => *n += 1,
            Acc::IntSum(total) => {
                if let Some(v) = value.and_then(Value::as_i64) {
                    *total = Some(total.unwrap_or(0).wrapping_add(v));
                }
            }
            Acc::DecimalSum(total) => {
                if let Some(v) = value.and_then(Value::as_f64) {
                    *total = Some(total.unwrap_or(0.0) + v);
                }
            }
        }
    }

    fn finish(&self) -> Value {
        match self {
            Acc::Count(n) => Value::Int(*n),
            Acc::IntSum(total) => total.map_or(Value::Null, Value::Int),
            Acc::DecimalSum(total) => total.map_or(Value::Null, Value::Decimal),
        }
    }
}

struct Plan {
    input: Option<usize>,
    ty: ColumnType,
}

impl Plan {
    fn accumulator(&self) -> Acc {
        match (self.input, self.ty) {
            (None, _) => Acc::Count(0),
            (Some(_), ColumnType::Decimal) => Acc::DecimalSum(None),
            (Some(_), _) => Acc::IntSum(None),
        }
    }
}

/// Groups `table` by `group_cols` and computes `aggs` per group.
///
/// The result holds the group columns followed by one column per aggregate.
/// Groups appear in order of their first row; null keys form a group of
/// their own. Without group columns the whole table is one group, so an
/// empty input still yields a single row.
pub fn group_by_aggregate(table: &Table, group_cols: &[&str], aggs: &[Aggregate]) -> Result<Table> {
    let keys = group_cols
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;

    // 1) resolve aggregate inputs and output types
    let mut plans = Vec::with_capacity(aggs.len());
    for agg in aggs {
        let plan = match (agg.op, agg.input.as_deref()) {
            (AggregateOp::Count, _) => Plan {
                input: None,
                ty: ColumnType::Integer,
            },
            (AggregateOp::Sum, Some(input)) => {
                let idx = table.column_index(input)?;
                let ty = table.schema().column(idx).ty;
                if !ty.is_numeric() {
                    return Err(AnalyticsError::type_mismatch(
                        format!("sum({}) over {}", input, table.name()),
                        "integer or decimal",
                        ty.to_string(),
                    ));
                }
                Plan { input: Some(idx), ty }
            }
            (AggregateOp::Sum, None) => {
                return Err(AnalyticsError::SchemaMismatch {
                    table: table.name().to_string(),
                    column: agg.output.clone(),
                })
            }
        };
        plans.push(plan);
    }

    // 2) one pass, groups indexed in first-seen order
    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, Vec<Acc>)> = Vec::new();
    for row in table.rows() {
        let key: Vec<Value> = keys.iter().map(|&i| row[i].clone()).collect();
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                groups.push((key.clone(), plans.iter().map(Plan::accumulator).collect()));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        for (acc, plan) in groups[slot].1.iter_mut().zip(&plans) {
            acc.update(plan.input.map(|i| &row[i]));
        }
    }
    if keys.is_empty() && groups.is_empty() {
        groups.push((Vec::new(), plans.iter().map(Plan::accumulator).collect()));
    }

    // 3) assemble
    let mut columns: Vec<Column> = keys
        .iter()
        .map(|&i| table.schema().column(i).clone())
        .collect();
    columns.extend(
        aggs.iter()
            .zip(&plans)
            .map(|(agg, plan)| Column::new(&agg.output, plan.ty)),
    );
    let rows: Vec<Row> = groups
        .into_iter()
        .map(|(mut key, accs)| {
            key.extend(accs.iter().map(Acc::finish));
            key
        })
        .collect();

    trace!(table = table.name(), groups = rows.len(), "group by");
    Ok(Table::from_parts(table.name(), Arc::new(Schema::new(columns)), rows))
}
