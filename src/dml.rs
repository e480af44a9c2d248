use crate::{Column, ColumnDeclaring, Operand, Table};
use quarry_core::{
    ColumnAssignment, ConnectionFactory, Database, DeleteExpression, Expression,
    InsertExpression, Result, TableReference, TransactionManager, UpdateExpression, Value,
    stream::TryStreamExt,
};
use std::{
    future::Future,
    ops::{Deref, DerefMut},
};

/// Column values of an insert or an update.
#[derive(Debug, Default, Clone)]
pub struct AssignmentsBuilder {
    assignments: Vec<ColumnAssignment>,
}

impl AssignmentsBuilder {
    /// Assign a value, or the result of an expression, to the column.
    pub fn set<T>(&mut self, column: &Column<T>, value: impl Operand<T>) -> &mut Self {
        let expression = value.into_expression(&column.sql_type());
        self.assignments.push(ColumnAssignment {
            column: column.reference(),
            expression,
        });
        self
    }

    pub fn set_null<T: Clone + Send + Sync + 'static>(&mut self, column: &Column<T>) -> &mut Self {
        self.assignments.push(ColumnAssignment {
            column: column.reference(),
            expression: column.wrap_argument(None),
        });
        self
    }

    pub fn assignments(&self) -> &[ColumnAssignment] {
        &self.assignments
    }
}

/// Assignments and condition of an update.
#[derive(Debug, Default, Clone)]
pub struct UpdateBuilder {
    assignments: AssignmentsBuilder,
    condition: Option<Expression>,
}

impl UpdateBuilder {
    /// Rows to update, all of them when never called. Conditions are combined with `AND`.
    pub fn where_(&mut self, condition: impl Into<Expression>) -> &mut Self {
        let condition = condition.into();
        self.condition = Some(match self.condition.take() {
            Some(current) => current.and(condition),
            None => condition,
        });
        self
    }
}

impl Deref for UpdateBuilder {
    type Target = AssignmentsBuilder;
    fn deref(&self) -> &Self::Target {
        &self.assignments
    }
}

impl DerefMut for UpdateBuilder {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.assignments
    }
}

/// DML statements target the table itself, never an alias.
fn target(table: &Table) -> TableReference {
    TableReference {
        alias: "".into(),
        ..table.reference().clone()
    }
}

fn insert_expression(table: &Table, assignments: AssignmentsBuilder) -> Expression {
    InsertExpression {
        table: target(table),
        assignments: assignments.assignments.into(),
    }
    .into()
}

fn update_expression(table: &Table, builder: UpdateBuilder) -> Expression {
    UpdateExpression {
        table: target(table),
        assignments: builder.assignments.assignments.into(),
        condition: builder.condition,
    }
    .into()
}

/// Items of a batch insert.
#[derive(Debug)]
pub struct BatchInsertBuilder<'t> {
    table: &'t Table,
    items: Vec<Expression>,
}

impl<'t> BatchInsertBuilder<'t> {
    pub fn item(&mut self, assign: impl FnOnce(&mut AssignmentsBuilder)) -> &mut Self {
        let mut assignments = AssignmentsBuilder::default();
        assign(&mut assignments);
        self.items.push(insert_expression(self.table, assignments));
        self
    }
}

/// Items of a batch update.
#[derive(Debug)]
pub struct BatchUpdateBuilder<'t> {
    table: &'t Table,
    items: Vec<Expression>,
}

impl<'t> BatchUpdateBuilder<'t> {
    pub fn item(&mut self, assign: impl FnOnce(&mut UpdateBuilder)) -> &mut Self {
        let mut builder = UpdateBuilder::default();
        assign(&mut builder);
        self.items.push(update_expression(self.table, builder));
        self
    }
}

/// Insert, update and delete on top of a [`Database`].
///
/// ```rust,ignore
/// database
///     .insert(&employees, |v| {
///         v.set(&name, "jerry").set(&salary, 50);
///     })
///     .await?;
/// ```
pub trait DatabaseDml {
    /// Insert a row, returns the number of inserted rows.
    fn insert(
        &self,
        table: &Table,
        assign: impl FnOnce(&mut AssignmentsBuilder),
    ) -> impl Future<Output = Result<u64>>;

    /// Insert a row and return the first generated key, if the driver reported one.
    fn insert_and_generate_key(
        &self,
        table: &Table,
        assign: impl FnOnce(&mut AssignmentsBuilder),
    ) -> impl Future<Output = Result<Option<Value>>>;

    /// Update the rows matching the condition set in `assign`.
    fn update(
        &self,
        table: &Table,
        assign: impl FnOnce(&mut UpdateBuilder),
    ) -> impl Future<Output = Result<u64>>;

    fn delete(
        &self,
        table: &Table,
        condition: impl Into<Expression>,
    ) -> impl Future<Output = Result<u64>>;

    fn delete_all(&self, table: &Table) -> impl Future<Output = Result<u64>>;

    /// Insert every item in a single batch, returns the inserted rows of each item.
    fn batch_insert(
        &self,
        table: &Table,
        items: impl FnOnce(&mut BatchInsertBuilder),
    ) -> impl Future<Output = Result<Vec<u64>>>;

    /// Update every item in a single batch, returns the updated rows of each item.
    fn batch_update(
        &self,
        table: &Table,
        items: impl FnOnce(&mut BatchUpdateBuilder),
    ) -> impl Future<Output = Result<Vec<u64>>>;
}

impl<F, M> DatabaseDml for Database<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    async fn insert(
        &self,
        table: &Table,
        assign: impl FnOnce(&mut AssignmentsBuilder),
    ) -> Result<u64> {
        let mut assignments = AssignmentsBuilder::default();
        assign(&mut assignments);
        self.execute_update(&insert_expression(table, assignments))
            .await
    }

    async fn insert_and_generate_key(
        &self,
        table: &Table,
        assign: impl FnOnce(&mut AssignmentsBuilder),
    ) -> Result<Option<Value>> {
        let mut assignments = AssignmentsBuilder::default();
        assign(&mut assignments);
        let (_, keys) = self
            .execute_update_and_retrieve_keys(&insert_expression(table, assignments))
            .await?;
        let keys = keys.try_collect::<Vec<_>>().await?;
        Ok(keys
            .into_iter()
            .next()
            .and_then(|row| row.values.into_vec().into_iter().next()))
    }

    async fn update(&self, table: &Table, assign: impl FnOnce(&mut UpdateBuilder)) -> Result<u64> {
        let mut builder = UpdateBuilder::default();
        assign(&mut builder);
        self.execute_update(&update_expression(table, builder))
            .await
    }

    async fn delete(&self, table: &Table, condition: impl Into<Expression>) -> Result<u64> {
        self.execute_update(
            &DeleteExpression {
                table: target(table),
                condition: Some(condition.into()),
            }
            .into(),
        )
        .await
    }

    async fn delete_all(&self, table: &Table) -> Result<u64> {
        self.execute_update(
            &DeleteExpression {
                table: target(table),
                condition: None,
            }
            .into(),
        )
        .await
    }

    async fn batch_insert(
        &self,
        table: &Table,
        items: impl FnOnce(&mut BatchInsertBuilder),
    ) -> Result<Vec<u64>> {
        let mut builder = BatchInsertBuilder {
            table,
            items: Vec::new(),
        };
        items(&mut builder);
        self.execute_batch(&builder.items).await
    }

    async fn batch_update(
        &self,
        table: &Table,
        items: impl FnOnce(&mut BatchUpdateBuilder),
    ) -> Result<Vec<u64>> {
        let mut builder = BatchUpdateBuilder {
            table,
            items: Vec::new(),
        };
        items(&mut builder);
        self.execute_batch(&builder.items).await
    }
}
