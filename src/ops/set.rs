use std::collections::HashSet;

use crate::{
    error::{AnalyticsError, Result},
    table::{Table, Value},
};

/// Rows of `a` whose `key_cols` tuple does not occur in `b`.
///
/// Duplicates in `a` are kept and order is preserved. Both tables must have
/// the key columns with comparable types.
pub fn set_difference_by_key(a: &Table, b: &Table, key_cols: &[&str]) -> Result<Table> {
    let mut a_idx = Vec::with_capacity(key_cols.len());
    let mut b_idx = Vec::with_capacity(key_cols.len());
    for col in key_cols {
        let (ai, bi) = (a.column_index(col)?, b.column_index(col)?);
        let (at, bt) = (a.schema().column(ai).ty, b.schema().column(bi).ty);
        if !at.comparable_with(bt) {
            return Err(AnalyticsError::type_mismatch(
                format!("set difference key {}", col),
                at.to_string(),
                bt.to_string(),
            ));
        }
        a_idx.push(ai);
        b_idx.push(bi);
    }

    let exclude: HashSet<Vec<&Value>> = b
        .rows()
        .iter()
        .map(|row| b_idx.iter().map(|&i| &row[i]).collect())
        .collect();
    let rows = a
        .rows()
        .iter()
        .filter(|row| {
            let key: Vec<&Value> = a_idx.iter().map(|&i| &row[i]).collect();
            !exclude.contains(&key)
        })
        .cloned()
        .collect();
    Ok(Table::from_parts(a.name(), a.schema_arc(), rows))
}
