use std::cmp::Ordering;

use rayon::prelude::*;

use crate::{
    error::Result,
    table::{Row, Table, Value},
};

/// One ordering criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Compares two cells in the direction of one key.
///
/// Nulls come first ascending and last descending, which is simply the
/// reverse of [`Value::total_cmp`].
pub(crate) fn compare_values(a: &Value, b: &Value, descending: bool) -> Ordering {
    let ord = a.total_cmp(b);
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

/// Stable sort on a single column.
pub fn sort(table: &Table, column: &str, descending: bool) -> Result<Table> {
    let key = SortKey {
        column: column.to_string(),
        descending,
    };
    sort_by(table, std::slice::from_ref(&key))
}

/// Stable sort on several keys, most significant first. Rows that tie on
/// every key keep their input order.
pub fn sort_by(table: &Table, keys: &[SortKey]) -> Result<Table> {
    let resolved = keys
        .iter()
        .map(|k| Ok((table.column_index(&k.column)?, k.descending)))
        .collect::<Result<Vec<_>>>()?;

    let mut rows: Vec<Row> = table.rows().to_vec();
    rows.par_sort_by(|a, b| {
        resolved
            .iter()
            .map(|&(i, desc)| compare_values(&a[i], &b[i], desc))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(Table::from_parts(table.name(), table.schema_arc(), rows))
}

/// First `n` rows in current order.
pub fn limit(table: &Table, n: usize) -> Table {
    let rows = table.rows().iter().take(n).cloned().collect();
    Table::from_parts(table.name(), table.schema_arc(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::tests::units;

    fn makes(t: &Table) -> Vec<Value> {
        t.column_values("VEH_MAKE_ID").unwrap()
    }

    #[test]
    fn nulls_first_ascending_last_descending() {
        let t = units(&[
            (1, "VAN", Some("KIA"), 0, 0),
            (2, "VAN", None, 0, 0),
            (3, "VAN", Some("FORD"), 0, 0),
        ]);
        assert_eq!(
            makes(&sort(&t, "VEH_MAKE_ID", false).unwrap()),
            vec![Value::Null, Value::from("FORD"), Value::from("KIA")]
        );
        assert_eq!(
            makes(&sort(&t, "VEH_MAKE_ID", true).unwrap()),
            vec![Value::from("KIA"), Value::from("FORD"), Value::Null]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let t = units(&[
            (1, "VAN", Some("A"), 5, 0),
            (2, "VAN", Some("B"), 7, 0),
            (3, "VAN", Some("C"), 5, 0),
            (4, "VAN", Some("D"), 7, 0),
        ]);
        let sorted = sort_by(
            &t,
            &[SortKey::desc("TOT_INJRY_CNT"), SortKey::asc("DEATH_CNT")],
        )
        .unwrap();
        assert_eq!(
            sorted.column_values("CRASH_ID").unwrap(),
            vec![Value::Int(2), Value::Int(4), Value::Int(1), Value::Int(3)]
        );
    }

    #[test]
    fn limit_takes_prefix() {
        let t = units(&[(1, "VAN", None, 0, 0), (2, "VAN", None, 0, 0)]);
        assert_eq!(limit(&t, 1).num_rows(), 1);
        assert_eq!(limit(&t, 10).num_rows(), 2);
        assert_eq!(limit(&t, 0).num_rows(), 0);
    }
}
