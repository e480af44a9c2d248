mod aggregation;
mod dml;
mod query;
mod query_row;
mod schema;

pub use aggregation::*;
pub use dml::*;
pub use query::*;
pub use query_row::*;
pub use quarry_core::*;
pub use schema::*;
