use crate::{ColumnDeclaring, ScalarExpression};
use quarry_core::{AggregateType, Expression, SqlType, sql_types};
use std::sync::Arc;

fn aggregate<R>(
    kind: AggregateType,
    argument: Option<Expression>,
    distinct: bool,
    sql_type: Arc<dyn SqlType<R>>,
) -> ScalarExpression<R> {
    ScalarExpression::new(
        Expression::aggregate(kind, argument, distinct, sql_type.prototype()),
        sql_type,
    )
}

/// `MIN(column)`.
pub fn min<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Min, Some(column.as_expression()), false, column.sql_type())
}

pub fn min_distinct<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Min, Some(column.as_expression()), true, column.sql_type())
}

/// `MAX(column)`.
pub fn max<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Max, Some(column.as_expression()), false, column.sql_type())
}

pub fn max_distinct<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Max, Some(column.as_expression()), true, column.sql_type())
}

/// `AVG(column)`, always read back as a double.
pub fn avg<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<f64> {
    aggregate(
        AggregateType::Avg,
        Some(column.as_expression()),
        false,
        Arc::new(sql_types::DOUBLE),
    )
}

pub fn avg_distinct<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<f64> {
    aggregate(
        AggregateType::Avg,
        Some(column.as_expression()),
        true,
        Arc::new(sql_types::DOUBLE),
    )
}

/// `SUM(column)`.
pub fn sum<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Sum, Some(column.as_expression()), false, column.sql_type())
}

pub fn sum_distinct<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<T> {
    aggregate(AggregateType::Sum, Some(column.as_expression()), true, column.sql_type())
}

/// `COUNT(column)`.
pub fn count<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<i64> {
    aggregate(
        AggregateType::Count,
        Some(column.as_expression()),
        false,
        Arc::new(sql_types::LONG),
    )
}

/// `COUNT(*)`.
pub fn count_all() -> ScalarExpression<i64> {
    aggregate(AggregateType::Count, None, false, Arc::new(sql_types::LONG))
}

/// `COUNT(DISTINCT column)`.
pub fn count_distinct<T>(column: &impl ColumnDeclaring<T>) -> ScalarExpression<i64> {
    aggregate(
        AggregateType::Count,
        Some(column.as_expression()),
        true,
        Arc::new(sql_types::LONG),
    )
}
