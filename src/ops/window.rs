use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;

use super::sort::compare_values;
use crate::{
    error::Result,
    table::{Column, ColumnType, Row, Schema, Table, Value},
};

/// Numbers the rows of every partition `1..=n` by `order_col`.
///
/// This is a row number, not a dense rank: ties get distinct numbers in
/// input order, so each partition has exactly one row numbered 1. The
/// result keeps the input row order and carries the number in an integer
/// column `output`, appended or overwritten in place.
pub fn window_rank(
    table: &Table,
    partition_cols: &[&str],
    order_col: &str,
    descending: bool,
    output: &str,
) -> Result<Table> {
    let parts = partition_cols
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let order = table.column_index(order_col)?;

    // 1) row positions per partition
    let mut partitions: HashMap<Vec<&Value>, Vec<usize>> = HashMap::new();
    for (pos, row) in table.rows().iter().enumerate() {
        let key: Vec<&Value> = parts.iter().map(|&i| &row[i]).collect();
        partitions.entry(key).or_default().push(pos);
    }

    // 2) order inside each partition; positions are ascending so the sort is
    //    stable with respect to input order
    let rows = table.rows();
    let numbered: Vec<(usize, i64)> = partitions
        .into_par_iter()
        .flat_map_iter(|(_, mut positions)| {
            positions.sort_by(|&a, &b| compare_values(&rows[a][order], &rows[b][order], descending));
            positions
                .into_iter()
                .enumerate()
                .map(|(n, pos)| (pos, n as i64 + 1))
        })
        .collect();
    let mut rank = vec![0i64; table.num_rows()];
    for (pos, n) in numbered {
        rank[pos] = n;
    }

    // 3) attach
    let existing = table.schema().names().position(|n| n == output);
    let mut columns = table.schema().columns().to_vec();
    match existing {
        Some(idx) => columns[idx] = Column::new(output, ColumnType::Integer),
        None => columns.push(Column::new(output, ColumnType::Integer)),
    }
    let out: Vec<Row> = rows
        .iter()
        .zip(rank)
        .map(|(row, n)| {
            let mut row = row.clone();
            match existing {
                Some(idx) => row[idx] = Value::Int(n),
                None => row.push(Value::Int(n)),
            }
            row
        })
        .collect();
    Ok(Table::from_parts(table.name(), Arc::new(Schema::new(columns)), out))
}
