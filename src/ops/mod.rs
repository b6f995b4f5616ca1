//! Relational operators over [`Table`]s.
//!
//! Every operator borrows its inputs and returns a fresh table. Row order is
//! preserved by the row-wise operators (`filter`, `derive`, `project`,
//! `distinct`, `limit`); `inner_join` and `group_by_aggregate` document their
//! own order, and callers sort when order matters.

mod aggregate;
mod join;
mod set;
mod sort;
mod window;

pub use aggregate::{group_by_aggregate, Aggregate, AggregateOp};
pub use join::{inner_join, inner_join_on};
pub use set::set_difference_by_key;
pub use sort::{limit, sort, sort_by, SortKey};
pub use window::window_rank;

use std::{collections::HashSet, sync::Arc};

use rayon::prelude::*;
use tracing::trace;

use crate::{
    error::Result,
    expr::{bind, Expr},
    table::{Column, ColumnType, Row, Schema, Table},
};

/// Keeps the rows for which `predicate` evaluates to `true`.
pub fn filter(table: &Table, predicate: &Expr) -> Result<Table> {
    let bound = bind(predicate, table.name(), table.schema())?;
    let rows: Vec<Row> = table
        .rows()
        .par_iter()
        .filter(|row| bound.matches(row))
        .cloned()
        .collect();
    trace!(table = table.name(), %predicate, kept = rows.len(), of = table.num_rows(), "filter");
    Ok(Table::from_parts(table.name(), table.schema_arc(), rows))
}

/// Adds column `name` computed from `expr`, or overwrites it in place when
/// a column with exactly that name already exists.
pub fn derive(table: &Table, name: &str, expr: &Expr) -> Result<Table> {
    let bound = bind(expr, table.name(), table.schema())?;
    let ty = bound.data_type().unwrap_or(ColumnType::String);
    let existing = table.schema().names().position(|n| n == name);

    let mut columns = table.schema().columns().to_vec();
    match existing {
        Some(idx) => columns[idx] = Column::new(name, ty),
        None => columns.push(Column::new(name, ty)),
    }

    let rows: Vec<Row> = table
        .rows()
        .par_iter()
        .map(|row| {
            let value = bound.eval(row).into_owned();
            let mut out = row.clone();
            match existing {
                Some(idx) => out[idx] = value,
                None => out.push(value),
            }
            out
        })
        .collect();
    Ok(Table::from_parts(
        table.name(),
        Arc::new(Schema::new(columns)),
        rows,
    ))
}

/// Keeps only `columns`, in the given order.
pub fn project(table: &Table, columns: &[&str]) -> Result<Table> {
    let indices = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let schema = Schema::new(
        indices
            .iter()
            .map(|&i| table.schema().column(i).clone())
            .collect(),
    );
    let rows = table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(Table::from_parts(table.name(), Arc::new(schema), rows))
}

/// Removes `columns`; every name must exist.
pub fn drop_columns(table: &Table, columns: &[&str]) -> Result<Table> {
    let dropped = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<HashSet<_>>>()?;
    let keep: Vec<&str> = table
        .schema()
        .names()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, n)| n)
        .collect();
    project(table, &keep)
}

/// Drops every row that has a null in any of `columns`.
pub fn drop_nulls(table: &Table, columns: &[&str]) -> Result<Table> {
    let indices = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let rows: Vec<Row> = table
        .rows()
        .iter()
        .filter(|row| indices.iter().all(|&i| !row[i].is_null()))
        .cloned()
        .collect();
    Ok(Table::from_parts(table.name(), table.schema_arc(), rows))
}

/// Keeps the first occurrence of every distinct row.
pub fn distinct(table: &Table) -> Table {
    let mut seen: HashSet<&Row> = HashSet::with_capacity(table.num_rows());
    let rows: Vec<Row> = table
        .rows()
        .iter()
        .filter(|row| seen.insert(row))
        .cloned()
        .collect();
    Table::from_parts(table.name(), table.schema_arc(), rows)
}
