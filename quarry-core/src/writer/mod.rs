mod context;
mod sql_formatter;

pub use context::*;
pub use sql_formatter::*;
