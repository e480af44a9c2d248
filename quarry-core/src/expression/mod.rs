mod expression;
mod operator;
mod statement;

pub use expression::*;
pub use operator::*;
pub use statement::*;
