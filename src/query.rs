use crate::{ColumnDeclaring, QueryRow, Selectable, Table, count_all};
use async_stream::try_stream;
use quarry_core::{
    ConnectionFactory, Database, Expression, Join, JoinType, OrderByExpression, QueryExpression,
    QuerySource, Result, SelectExpression, SqlError, SqlType, TransactionManager,
    UnionExpression, sql_types,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::{
    fmt::{self, Debug, Formatter},
    pin::pin,
};

/// Alias of the derived table a union is wrapped in when it gets filtered or grouped.
const UNION_ALIAS: &str = "t_union";
const COUNT_ALIAS: &str = "tmp_count";

/// Query building and DML on top of a [`Database`].
pub trait DatabaseExt<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    /// Start a query reading from `table`.
    fn from(&self, table: &Table) -> QuerySourceBuilder<'_, F, M>;
}

impl<F, M> DatabaseExt<F, M> for Database<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn from(&self, table: &Table) -> QuerySourceBuilder<'_, F, M> {
        QuerySourceBuilder {
            database: self,
            source: QuerySource::Table(table.reference().clone()),
            joins: Vec::new(),
        }
    }
}

/// The `FROM` part of a query, tables joined so far.
pub struct QuerySourceBuilder<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    database: &'a Database<F, M>,
    source: QuerySource,
    joins: Vec<Join>,
}

impl<'a, F, M> QuerySourceBuilder<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn join(mut self, kind: JoinType, table: &Table, on: Option<Expression>) -> Self {
        self.joins.push(Join {
            kind,
            source: QuerySource::Table(table.reference().clone()),
            on,
        });
        self
    }

    pub fn inner_join(self, table: &Table, on: impl Into<Expression>) -> Self {
        self.join(JoinType::Inner, table, Some(on.into()))
    }

    pub fn left_join(self, table: &Table, on: impl Into<Expression>) -> Self {
        self.join(JoinType::Left, table, Some(on.into()))
    }

    pub fn right_join(self, table: &Table, on: impl Into<Expression>) -> Self {
        self.join(JoinType::Right, table, Some(on.into()))
    }

    pub fn full_join(self, table: &Table, on: impl Into<Expression>) -> Self {
        self.join(JoinType::Full, table, Some(on.into()))
    }

    pub fn cross_join(self, table: &Table) -> Self {
        self.join(JoinType::Cross, table, None)
    }

    /// Select the given columns, all of them when empty.
    pub fn select(self, columns: &[&dyn Selectable]) -> Query<'a, F, M> {
        let mut select = SelectExpression::new(self.source)
            .with_columns(columns.iter().map(|v| v.declaring_expression()));
        for join in self.joins {
            select = select.with_join(join);
        }
        Query {
            database: self.database,
            expression: select.into(),
        }
    }

    pub fn select_distinct(self, columns: &[&dyn Selectable]) -> Query<'a, F, M> {
        self.select(columns).distinct(true)
    }
}

/// An immutable query. Every method returns a new query sharing the untouched
/// parts of this one.
pub struct Query<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    database: &'a Database<F, M>,
    expression: QueryExpression,
}

impl<'a, F, M> Query<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    pub fn expression(&self) -> &QueryExpression {
        &self.expression
    }

    fn with_expression(&self, expression: impl Into<QueryExpression>) -> Self {
        Self {
            database: self.database,
            expression: expression.into(),
        }
    }

    /// The query as a select, a union is wrapped as a derived table.
    fn as_select(&self) -> SelectExpression {
        match &self.expression {
            QueryExpression::Select(select) => (**select).clone(),
            QueryExpression::Union(..) => SelectExpression::new(QuerySource::Subquery {
                query: self.expression.clone(),
                alias: UNION_ALIAS.into(),
            }),
        }
    }

    /// Replace the `WHERE` condition.
    pub fn where_(&self, condition: impl Into<Expression>) -> Self {
        self.with_expression(SelectExpression {
            condition: Some(condition.into()),
            ..self.as_select()
        })
    }

    /// Combine the condition with the current one using `AND`.
    pub fn and_where(&self, condition: impl Into<Expression>) -> Self {
        self.with_expression(self.as_select().with_where(condition.into()))
    }

    pub fn group_by(&self, columns: &[&dyn Selectable]) -> Self {
        self.with_expression(
            self.as_select()
                .with_group_by(columns.iter().map(|v| v.expression())),
        )
    }

    pub fn having(&self, condition: impl Into<Expression>) -> Self {
        self.with_expression(self.as_select().with_having(condition.into()))
    }

    pub fn order_by(&self, order_by: impl IntoIterator<Item = OrderByExpression>) -> Self {
        self.with_expression(self.expression.with_order_by(order_by))
    }

    pub fn limit(&self, limit: u32) -> Self {
        self.with_expression(self.expression.with_limit(Some(limit)))
    }

    pub fn offset(&self, offset: u32) -> Self {
        self.with_expression(self.expression.with_offset(Some(offset)))
    }

    pub fn distinct(&self, distinct: bool) -> Self {
        self.with_expression(self.as_select().with_distinct(distinct))
    }

    pub fn union(&self, other: &Query<'a, F, M>) -> Self {
        self.with_expression(UnionExpression::new(
            self.expression.clone(),
            other.expression.clone(),
            false,
        ))
    }

    pub fn union_all(&self, other: &Query<'a, F, M>) -> Self {
        self.with_expression(UnionExpression::new(
            self.expression.clone(),
            other.expression.clone(),
            true,
        ))
    }

    /// The SQL text the query executes.
    pub fn sql(&self) -> Result<String> {
        Ok(self
            .database
            .format(&self.expression.clone().into())?
            .0)
    }

    /// Execute the query, rows are fetched while the stream is consumed.
    pub fn rows(&self) -> impl Stream<Item = Result<QueryRow>> + Send + '_ {
        let expression = Expression::from(self.expression.clone());
        try_stream! {
            let mut rows = pin!(self.database.execute_query(&expression));
            while let Some(row) = rows.next().await.transpose()? {
                yield QueryRow::new(row);
            }
        }
    }

    /// Number of records of the query ignoring its ordering and pagination.
    pub async fn total_records(&self) -> Result<i64> {
        let expression: Expression = SelectExpression::new(QuerySource::Subquery {
            query: self.expression.unordered(),
            alias: COUNT_ALIAS.into(),
        })
        .with_columns([count_all().as_expression()])
        .into();
        let rows = self
            .database
            .execute_query(&expression)
            .try_collect::<Vec<_>>()
            .await?;
        let Some(row) = rows.first() else {
            return Err(SqlError::ColumnNotFound("COUNT(*)".into()).into());
        };
        Ok(sql_types::LONG.get_result(row, 0)?.unwrap_or_default())
    }
}

impl<'a, F, M> Clone for Query<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn clone(&self) -> Self {
        Self {
            database: self.database,
            expression: self.expression.clone(),
        }
    }
}

impl<'a, F, M> Debug for Query<'a, F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.expression).finish()
    }
}

impl<'a, F, M> From<&Query<'a, F, M>> for QueryExpression
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn from(value: &Query<'a, F, M>) -> Self {
        value.expression.clone()
    }
}
