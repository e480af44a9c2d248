mod argument;
mod as_value;
mod database;
mod dialect;
mod driver;
mod error;
mod expression;
mod keywords;
mod row;
mod sql_type;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use argument::*;
pub use as_value::*;
pub use database::*;
pub use dialect::*;
pub use driver::*;
pub use error::*;
pub use expression::*;
pub use keywords::*;
pub use row::*;
pub use sql_type::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericSqlFormatter, SqlFormatter};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
