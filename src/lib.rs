pub mod analysis;
pub mod config;
pub mod error;
pub mod expr;
pub mod io;
pub mod ops;
pub mod report;
pub mod schema;
pub mod table;

pub use error::{AnalyticsError, Result};
pub use expr::{col, lit, Expr};
pub use table::{Column, ColumnType, Schema, Table, Value};
