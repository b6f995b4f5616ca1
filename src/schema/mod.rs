pub mod arrow;
pub mod types;

pub use self::arrow::{build_arrow_schema, map_to_arrow_type, to_record_batch, utf8_schema};
pub use types::Dataset;
