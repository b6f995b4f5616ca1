use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{AnalyticsError, Result},
    table::{Column, ColumnType, Row, Schema, Table, Value},
};

/// Equi-join of `left` and `right` on a column both tables call `key`.
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    inner_join_on(left, right, key, key)
}

/// Hash equi-join on `left_key == right_key`.
///
/// Emits one row per matching pair, so `k1` left rows and `k2` right rows
/// sharing a key produce `k1 * k2` rows. Null keys never match. The output
/// holds the key once (under the left name), then the remaining left columns,
/// then the remaining right columns; names present on both sides are
/// prefixed with their table name (`Units.UNIT_NBR`). Rows come out in left
/// order, and in right order within one left row.
pub fn inner_join_on(left: &Table, right: &Table, left_key: &str, right_key: &str) -> Result<Table> {
    let li = left.column_index(left_key)?;
    let ri = right.column_index(right_key)?;
    let (lt, rt) = (left.schema().column(li).ty, right.schema().column(ri).ty);
    if !lt.comparable_with(rt) {
        return Err(AnalyticsError::type_mismatch(
            format!(
                "join key {}.{} = {}.{}",
                left.name(),
                left_key,
                right.name(),
                right_key
            ),
            lt.to_string(),
            rt.to_string(),
        ));
    }
    // integer keys joined against decimal keys compare as decimals
    let widen = lt != rt && lt.is_numeric();
    let join_key = |v: &Value| -> Option<Value> {
        match v {
            Value::Null => None,
            Value::Int(i) if widen => Some(Value::Decimal(*i as f64)),
            other => Some(other.clone()),
        }
    };

    // 1) build side: right key → row positions, in right order
    let mut build: HashMap<Value, Vec<usize>> = HashMap::new();
    for (pos, row) in right.rows().iter().enumerate() {
        if let Some(k) = join_key(&row[ri]) {
            build.entry(k).or_default().push(pos);
        }
    }

    let schema = joined_schema(left, li, right, ri);

    // 2) probe with the left side; collect keeps left order
    let rows: Vec<Row> = left
        .rows()
        .par_iter()
        .flat_map_iter(|lrow| {
            // the key cell carries the widened value so the column stays homogeneous
            let key = join_key(&lrow[li]);
            let matches = key
                .as_ref()
                .and_then(|k| build.get(k))
                .map(Vec::as_slice)
                .unwrap_or_default();
            matches.iter().map(move |&rpos| {
                let rrow = &right.rows()[rpos];
                let mut out = Vec::with_capacity(lrow.len() + rrow.len() - 1);
                out.push(key.clone().unwrap_or(Value::Null));
                out.extend(
                    lrow.iter()
                        .enumerate()
                        .filter(|(i, _)| *i != li)
                        .map(|(_, v)| v.clone()),
                );
                out.extend(
                    rrow.iter()
                        .enumerate()
                        .filter(|(i, _)| *i != ri)
                        .map(|(_, v)| v.clone()),
                );
                out
            })
        })
        .collect();

    let name = format!("{}_{}", left.name(), right.name());
    debug!(
        table = %name,
        left = left.num_rows(),
        right = right.num_rows(),
        joined = rows.len(),
        "inner join"
    );
    Ok(Table::from_parts(name, Arc::new(schema), rows))
}

fn joined_schema(left: &Table, li: usize, right: &Table, ri: usize) -> Schema {
    let key = left.schema().column(li);
    let key_ty = if key.ty == right.schema().column(ri).ty {
        key.ty
    } else if key.ty.is_numeric() {
        ColumnType::Decimal
    } else {
        ColumnType::String
    };

    let mut sourced: Vec<(&str, Column)> = vec![(left.name(), Column::new(&key.name, key_ty))];
    sourced.extend(
        left.schema()
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != li)
            .map(|(_, c)| (left.name(), c.clone())),
    );
    sourced.extend(
        right
            .schema()
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != ri)
            .map(|(_, c)| (right.name(), c.clone())),
    );

    let duplicated: HashSet<String> = {
        let mut seen = HashSet::new();
        sourced
            .iter()
            .filter(|(_, c)| !seen.insert(c.name.as_str()))
            .map(|(_, c)| c.name.clone())
            .collect()
    };

    Schema::new(
        sourced
            .into_iter()
            .map(|(source, mut c)| {
                if duplicated.contains(&c.name) {
                    c.name = format!("{}.{}", source, c.name);
                }
                c
            })
            .collect(),
    )
}
