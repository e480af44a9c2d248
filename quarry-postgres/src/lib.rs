mod dialect;
mod sql_formatter;

pub use dialect::*;
pub use sql_formatter::*;
