//! Reading base datasets from CSV and writing result tables.

pub mod loader;
pub mod sink;

pub use loader::load_dataset;
pub use sink::{OutputFormat, Sink};
