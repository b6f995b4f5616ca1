// src/schema/arrow.rs

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray},
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::{
    error::{AnalyticsError, Result},
    table::{ColumnType, Schema, Table, Value},
};

/// Map a semantic column type to the Arrow type used on disk.
///
/// - String, Categorical → Utf8
/// - Integer             → Int64
/// - Decimal             → Float64
/// - Boolean             → Boolean
pub fn map_to_arrow_type(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::String | ColumnType::Categorical => DataType::Utf8,
        ColumnType::Integer => DataType::Int64,
        ColumnType::Decimal => DataType::Float64,
        ColumnType::Boolean => DataType::Boolean,
    }
}

/// Build an ArrowSchema (inside an Arc) from a table schema. Every field is nullable.
pub fn build_arrow_schema(schema: &Schema) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = schema
        .columns()
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.ty), true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// All-Utf8 schema used to read CSV text before typed conversion.
pub fn utf8_schema(names: &[String]) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = names
        .iter()
        .map(|name| ArrowField::new(name, DataType::Utf8, true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// Convert a table into a single columnar batch.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let schema = build_arrow_schema(table.schema());
    let columns: Vec<ArrayRef> = table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let cells = table.rows().iter().map(|row| &row[idx]);
            let array: ArrayRef = match col.ty {
                ColumnType::String | ColumnType::Categorical => Arc::new(
                    cells
                        .map(|v| match v {
                            Value::Null => None,
                            other => Some(other.to_string()),
                        })
                        .collect::<StringArray>(),
                ),
                ColumnType::Integer => Arc::new(cells.map(Value::as_i64).collect::<Int64Array>()),
                ColumnType::Decimal => Arc::new(cells.map(Value::as_f64).collect::<Float64Array>()),
                ColumnType::Boolean => Arc::new(cells.map(Value::as_bool).collect::<BooleanArray>()),
            };
            array
        })
        .collect();

    RecordBatch::try_new(schema, columns)
        .map_err(|e| AnalyticsError::write(table.name(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use arrow::array::Array;

    #[test]
    fn batch_mirrors_table() {
        let t = Table::from_records(
            "Units",
            vec![
                Column::new("CRASH_ID", ColumnType::Integer),
                Column::new("VEH_MAKE_ID", ColumnType::Categorical),
                Column::new("share", ColumnType::Decimal),
            ],
            vec![
                vec![("CRASH_ID", Value::Int(1)), ("VEH_MAKE_ID", Value::from("FORD"))],
                vec![("CRASH_ID", Value::Int(2)), ("share", Value::Decimal(0.5))],
            ],
        )
        .unwrap();

        let batch = to_record_batch(&t).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);

        let makes = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(makes.value(0), "FORD");
        assert!(makes.is_null(1));
        assert_eq!(batch.column(2).null_count(), 1);
    }
}
