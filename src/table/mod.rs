//! Immutable in-memory relations.

mod value;

pub use value::Value;

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Free text.
    String,
    /// Label drawn from a closed vocabulary (states, makes, damage scales).
    Categorical,
    Integer,
    Decimal,
    /// Only produced by derived columns.
    Boolean,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }

    pub fn is_textual(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Categorical)
    }

    /// Two column types can be compared with each other.
    pub fn comparable_with(self, other: ColumnType) -> bool {
        self == other
            || (self.is_numeric() && other.is_numeric())
            || (self.is_textual() && other.is_textual())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::String => "string",
            ColumnType::Categorical => "categorical",
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered column list of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, idx: usize) -> &Column {
        &self.columns[idx]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Resolves `name` to a column position.
    ///
    /// An exact name wins. Otherwise an unqualified name matches a single
    /// `<table>.<name>` column produced by a join; several such matches are
    /// ambiguous.
    pub fn index_of(&self, table: &str, name: &str) -> Result<usize> {
        if let Some(idx) = self.columns.iter().position(|c| c.name == name) {
            return Ok(idx);
        }
        let suffix = format!(".{}", name);
        let mut matches = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some((idx, _)), None) => Ok(idx),
            (Some(_), Some(_)) => Err(AnalyticsError::AmbiguousColumn {
                table: table.to_string(),
                column: name.to_string(),
            }),
            _ => Err(AnalyticsError::SchemaMismatch {
                table: table.to_string(),
                column: name.to_string(),
            }),
        }
    }
}

pub type Row = Vec<Value>;

/// An immutable relation: a name, a schema and rows in insertion order.
///
/// Every operator returns a new `Table`; schema and rows are shared behind
/// `Arc`s so cloning a table is cheap.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: Arc<Schema>,
    rows: Arc<Vec<Row>>,
}

impl Table {
    /// Builds a table from positional rows.
    ///
    /// Fails with `SchemaMismatch` when a row is wider or narrower than the
    /// schema, and with `TypeMismatch` when a cell cannot be stored in its
    /// column. Cells are coerced to the column's physical type.
    pub fn new(name: impl Into<String>, schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let name = name.into();
        let mut checked = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != schema.len() {
                let column = if row.len() > schema.len() {
                    format!("#{}", schema.len())
                } else {
                    schema.column(row.len()).name.clone()
                };
                return Err(AnalyticsError::SchemaMismatch { table: name, column });
            }
            let row = row
                .into_iter()
                .zip(schema.columns())
                .map(|(value, column)| {
                    value.coerce_to(column.ty).ok_or_else(|| {
                        AnalyticsError::type_mismatch(
                            format!("{}.{} row {}", name, column.name, row_idx),
                            column.ty.to_string(),
                            value.type_name(),
                        )
                    })
                })
                .collect::<Result<Row>>()?;
            checked.push(row);
        }
        Ok(Self::from_parts(name, Arc::new(schema), checked))
    }

    /// Builds a table from name → value records.
    ///
    /// A record key absent from `columns` is a `SchemaMismatch`; columns a
    /// record does not mention are null.
    pub fn from_records<K, I>(name: impl Into<String>, columns: Vec<Column>, records: I) -> Result<Self>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = Vec<(K, Value)>>,
    {
        let name = name.into();
        let schema = Schema::new(columns);
        let mut rows = Vec::new();
        for record in records {
            let mut row = vec![Value::Null; schema.len()];
            for (key, value) in record {
                let idx = schema
                    .columns()
                    .iter()
                    .position(|c| c.name == key.as_ref())
                    .ok_or_else(|| AnalyticsError::SchemaMismatch {
                        table: name.clone(),
                        column: key.as_ref().to_string(),
                    })?;
                row[idx] = value;
            }
            rows.push(row);
        }
        Self::new(name, schema, rows)
    }

    /// Assembles a table whose rows are already known to match `schema`.
    pub(crate) fn from_parts(name: impl Into<String>, schema: Arc<Schema>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == schema.len()));
        Self {
            name: name.into(),
            schema,
            rows: Arc::new(rows),
        }
    }

    pub fn empty(name: impl Into<String>, schema: Schema) -> Self {
        Self::from_parts(name, Arc::new(schema), Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.index_of(&self.name, name)
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].clone()).collect())
    }

    /// Value of `name` in the first row, if any.
    pub fn first_value(&self, name: &str) -> Result<Option<Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.first().map(|r| r[idx].clone()))
    }

    /// Row as a column-name → value map, mostly for assertions.
    pub fn record(&self, row: usize) -> Option<BTreeMap<&str, &Value>> {
        let values = self.rows.get(row)?;
        Some(self.schema.names().zip(values.iter()).collect())
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: Arc::clone(&self.schema),
            rows: Arc::clone(&self.rows),
        }
    }
}

/// Renders the table as aligned text, one line per row plus a header.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .schema
            .names()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .schema
            .names()
            .zip(&widths)
            .map(|(n, w)| format!("{:<w$}", n, w = *w))
            .collect();
        writeln!(f, "|{}|", header.join("|"))?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<w$}", c, w = *w))
                .collect();
            writeln!(f, "|{}|", line.join("|"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persons_columns() -> Vec<Column> {
        vec![
            Column::new("CRASH_ID", ColumnType::Integer),
            Column::new("PRSN_GNDR_ID", ColumnType::Categorical),
        ]
    }

    #[test]
    fn unknown_record_key_is_schema_mismatch() {
        let err = Table::from_records(
            "Primary_Person",
            persons_columns(),
            vec![vec![("CRASH_ID", Value::Int(1)), ("DRVR_ZIP", Value::from("78701"))]],
        )
        .unwrap_err();
        assert!(
            matches!(err, AnalyticsError::SchemaMismatch { ref column, .. } if column == "DRVR_ZIP")
        );
    }

    #[test]
    fn missing_record_keys_are_null() {
        let t = Table::from_records(
            "Primary_Person",
            persons_columns(),
            vec![vec![("CRASH_ID", Value::Int(1))]],
        )
        .unwrap();
        assert_eq!(t.rows()[0], vec![Value::Int(1), Value::Null]);
    }

    #[test]
    fn cells_must_fit_their_column() {
        let err = Table::new(
            "Primary_Person",
            Schema::new(persons_columns()),
            vec![vec![Value::from("abc"), Value::from("MALE")]],
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::TypeMismatch { .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::new(
            "Primary_Person",
            Schema::new(persons_columns()),
            vec![vec![Value::Int(1)]],
        )
        .unwrap_err();
        assert!(
            matches!(err, AnalyticsError::SchemaMismatch { ref column, .. } if column == "PRSN_GNDR_ID")
        );
    }

    #[test]
    fn unqualified_names_resolve_through_join_prefixes() {
        let schema = Schema::new(vec![
            Column::new("CRASH_ID", ColumnType::Integer),
            Column::new("Units.UNIT_NBR", ColumnType::Integer),
            Column::new("Primary_Person.UNIT_NBR", ColumnType::Integer),
            Column::new("Units.DEATH_CNT", ColumnType::Integer),
        ]);
        assert_eq!(schema.index_of("t", "CRASH_ID").unwrap(), 0);
        assert_eq!(schema.index_of("t", "DEATH_CNT").unwrap(), 3);
        assert_eq!(schema.index_of("t", "Primary_Person.UNIT_NBR").unwrap(), 2);
        assert!(matches!(
            schema.index_of("t", "UNIT_NBR"),
            Err(AnalyticsError::AmbiguousColumn { .. })
        ));
        assert!(matches!(
            schema.index_of("t", "VEH_MAKE_ID"),
            Err(AnalyticsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn display_aligns_columns() {
        let t = Table::from_records(
            "Primary_Person",
            persons_columns(),
            vec![vec![("CRASH_ID", Value::Int(10)), ("PRSN_GNDR_ID", Value::from("MALE"))]],
        )
        .unwrap();
        let text = t.to_string();
        assert_eq!(text, "|CRASH_ID|PRSN_GNDR_ID|\n|10      |MALE        |\n");
    }
}
