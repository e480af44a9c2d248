use quarry_core::{
    ArgumentBinding, BinaryOpType, ColumnReference, Expression, InListValues, OrderByExpression,
    QueryExpression, SqlType, TableReference, UnaryOpType, Value, sql_types,
};
use std::{
    borrow::Cow,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// A database table, the owner of its [`Column`]s.
///
/// ```rust
/// use quarry::{Table, sql_types};
/// let employees = Table::new("t_employee");
/// let id = employees.column("id", sql_types::INT);
/// let name = employees.column("name", sql_types::VARCHAR);
/// # let _ = (id, name);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    reference: TableReference,
}

impl Table {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reference: TableReference::new(name),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.reference.schema = schema.into();
        self
    }

    /// The same table under another name, to reference it more than once in a query.
    /// Columns are rebound to it with [`Column::of`].
    pub fn aliased(&self, alias: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reference: self.reference.clone().with_alias(alias),
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn schema(&self) -> Option<&str> {
        Some(self.reference.schema.as_ref()).filter(|v| !v.is_empty())
    }

    pub fn alias(&self) -> Option<&str> {
        Some(self.reference.alias.as_ref()).filter(|v| !v.is_empty())
    }

    pub fn reference(&self) -> &TableReference {
        &self.reference
    }

    pub fn column<T, S>(&self, name: impl Into<Cow<'static, str>>, sql_type: S) -> Column<T>
    where
        S: SqlType<T> + 'static,
    {
        Column {
            table: self.reference.clone(),
            name: name.into(),
            sql_type: Arc::new(sql_type),
        }
    }
}

/// Right hand side of a column operator: a plain value, bound as an argument
/// with the column type, or another typed expression.
pub trait Operand<T> {
    fn into_expression(self, sql_type: &Arc<dyn SqlType<T>>) -> Expression;
}

impl<T: Clone + Send + Sync + 'static> Operand<T> for T {
    fn into_expression(self, sql_type: &Arc<dyn SqlType<T>>) -> Expression {
        ArgumentBinding::new(Some(self), sql_type.clone()).into()
    }
}

impl Operand<String> for &str {
    fn into_expression(self, sql_type: &Arc<dyn SqlType<String>>) -> Expression {
        ArgumentBinding::new(Some(self.to_string()), sql_type.clone()).into()
    }
}

impl<T> Operand<T> for &Column<T> {
    fn into_expression(self, _sql_type: &Arc<dyn SqlType<T>>) -> Expression {
        self.as_expression()
    }
}

impl<T> Operand<T> for ScalarExpression<T> {
    fn into_expression(self, _sql_type: &Arc<dyn SqlType<T>>) -> Expression {
        self.expression
    }
}

impl<T> Operand<T> for &ScalarExpression<T> {
    fn into_expression(self, _sql_type: &Arc<dyn SqlType<T>>) -> Expression {
        self.expression.clone()
    }
}

/// Something with a SQL type `T` that can be used in a query: a column, an
/// aggregate, an arithmetic or boolean expression.
pub trait ColumnDeclaring<T> {
    fn sql_type(&self) -> Arc<dyn SqlType<T>>;

    fn as_expression(&self) -> Expression;

    /// Label the value is selected with, if any.
    fn label(&self) -> Option<Cow<'static, str>> {
        None
    }

    /// The expression as written in a column list.
    fn as_declaring_expression(&self) -> Expression {
        Expression::declaring(self.as_expression(), self.label())
    }

    /// Select this value under the given label, `expression AS label`.
    fn aliased(&self, label: impl Into<Cow<'static, str>>) -> DeclaredColumn<T> {
        DeclaredColumn {
            expression: self.as_expression(),
            label: label.into(),
            sql_type: self.sql_type(),
        }
    }

    /// Argument of the same SQL type as this expression.
    fn wrap_argument(&self, value: Option<T>) -> Expression
    where
        T: Clone + Send + Sync + 'static,
    {
        ArgumentBinding::new(value, self.sql_type()).into()
    }

    fn eq(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::Equal, other))
    }

    fn not_eq(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::NotEqual, other))
    }

    fn less(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::Less, other))
    }

    fn less_eq(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::LessEqual, other))
    }

    fn greater(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::Greater, other))
    }

    fn greater_eq(&self, other: impl Operand<T>) -> ScalarExpression<bool> {
        predicate(self.binary(BinaryOpType::GreaterEqual, other))
    }

    /// `LIKE` with a pattern argument, `%` and `_` are the usual wildcards.
    fn like(&self, pattern: impl Into<String>) -> ScalarExpression<bool> {
        predicate(Expression::binary(
            BinaryOpType::Like,
            self.as_expression(),
            ArgumentBinding::new(Some(pattern.into()), Arc::new(sql_types::VARCHAR)),
            Value::Boolean(None),
        ))
    }

    fn not_like(&self, pattern: impl Into<String>) -> ScalarExpression<bool> {
        predicate(Expression::binary(
            BinaryOpType::NotLike,
            self.as_expression(),
            ArgumentBinding::new(Some(pattern.into()), Arc::new(sql_types::VARCHAR)),
            Value::Boolean(None),
        ))
    }

    fn is_null(&self) -> ScalarExpression<bool> {
        predicate(self.as_expression().is_null())
    }

    fn is_not_null(&self) -> ScalarExpression<bool> {
        predicate(self.as_expression().is_not_null())
    }

    fn in_list(&self, values: impl IntoIterator<Item = T>) -> ScalarExpression<bool>
    where
        T: Clone + Send + Sync + 'static,
    {
        let values = values
            .into_iter()
            .map(|v| self.wrap_argument(Some(v)))
            .collect();
        predicate(
            self.as_expression()
                .in_list(InListValues::Values(values), false),
        )
    }

    fn not_in_list(&self, values: impl IntoIterator<Item = T>) -> ScalarExpression<bool>
    where
        T: Clone + Send + Sync + 'static,
    {
        let values = values
            .into_iter()
            .map(|v| self.wrap_argument(Some(v)))
            .collect();
        predicate(
            self.as_expression()
                .in_list(InListValues::Values(values), true),
        )
    }

    /// `IN` a subquery.
    fn in_query(&self, query: impl Into<QueryExpression>) -> ScalarExpression<bool> {
        predicate(
            self.as_expression()
                .in_list(InListValues::Query(query.into()), false),
        )
    }

    fn not_in_query(&self, query: impl Into<QueryExpression>) -> ScalarExpression<bool> {
        predicate(
            self.as_expression()
                .in_list(InListValues::Query(query.into()), true),
        )
    }

    fn between(&self, lower: impl Operand<T>, upper: impl Operand<T>) -> ScalarExpression<bool> {
        let sql_type = self.sql_type();
        predicate(self.as_expression().between(
            lower.into_expression(&sql_type),
            upper.into_expression(&sql_type),
        ))
    }

    fn not_between(
        &self,
        lower: impl Operand<T>,
        upper: impl Operand<T>,
    ) -> ScalarExpression<bool> {
        let sql_type = self.sql_type();
        predicate(self.as_expression().not_between(
            lower.into_expression(&sql_type),
            upper.into_expression(&sql_type),
        ))
    }

    fn plus(&self, other: impl Operand<T>) -> ScalarExpression<T> {
        self.arithmetic(BinaryOpType::Addition, other)
    }

    fn minus(&self, other: impl Operand<T>) -> ScalarExpression<T> {
        self.arithmetic(BinaryOpType::Subtraction, other)
    }

    fn times(&self, other: impl Operand<T>) -> ScalarExpression<T> {
        self.arithmetic(BinaryOpType::Multiplication, other)
    }

    fn div(&self, other: impl Operand<T>) -> ScalarExpression<T> {
        self.arithmetic(BinaryOpType::Division, other)
    }

    fn rem(&self, other: impl Operand<T>) -> ScalarExpression<T> {
        self.arithmetic(BinaryOpType::Remainder, other)
    }

    /// Arithmetic negation, `-value`.
    fn negative(&self) -> ScalarExpression<T> {
        let sql_type = self.sql_type();
        ScalarExpression::new(
            Expression::unary(UnaryOpType::Negative, self.as_expression(), sql_type.prototype()),
            sql_type,
        )
    }

    fn asc(&self) -> OrderByExpression {
        self.as_expression().asc()
    }

    fn desc(&self) -> OrderByExpression {
        self.as_expression().desc()
    }

    #[doc(hidden)]
    fn binary(&self, op: BinaryOpType, other: impl Operand<T>) -> Expression {
        Expression::binary(
            op,
            self.as_expression(),
            other.into_expression(&self.sql_type()),
            Value::Boolean(None),
        )
    }

    #[doc(hidden)]
    fn arithmetic(&self, op: BinaryOpType, other: impl Operand<T>) -> ScalarExpression<T> {
        let sql_type = self.sql_type();
        ScalarExpression::new(
            Expression::binary(
                op,
                self.as_expression(),
                other.into_expression(&sql_type),
                sql_type.prototype(),
            ),
            sql_type,
        )
    }
}

fn predicate(expression: Expression) -> ScalarExpression<bool> {
    ScalarExpression::new(expression, Arc::new(sql_types::BOOLEAN))
}

/// A column of a [`Table`].
pub struct Column<T> {
    table: TableReference,
    name: Cow<'static, str>,
    sql_type: Arc<dyn SqlType<T>>,
}

impl<T> Column<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TableReference {
        &self.table
    }

    /// The same column read from another instance of its table, usually an aliased one.
    pub fn of(&self, table: &Table) -> Self {
        Self {
            table: table.reference().clone(),
            name: self.name.clone(),
            sql_type: self.sql_type.clone(),
        }
    }

    pub fn reference(&self) -> ColumnReference {
        ColumnReference {
            table: Some(self.table.clone()),
            name: self.name.clone(),
            sql_type: self.sql_type.prototype(),
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            name: self.name.clone(),
            sql_type: self.sql_type.clone(),
        }
    }
}

impl<T> Debug for Column<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("table", &self.table.name)
            .field("name", &self.name)
            .field("sql_type", &self.sql_type.type_name())
            .finish()
    }
}

impl<T> ColumnDeclaring<T> for Column<T> {
    fn sql_type(&self) -> Arc<dyn SqlType<T>> {
        self.sql_type.clone()
    }
    fn as_expression(&self) -> Expression {
        self.reference().into()
    }
}

/// A typed expression that is not a plain column: predicates, arithmetic, aggregates.
pub struct ScalarExpression<T> {
    expression: Expression,
    sql_type: Arc<dyn SqlType<T>>,
}

impl<T> ScalarExpression<T> {
    pub fn new(expression: Expression, sql_type: Arc<dyn SqlType<T>>) -> Self {
        Self {
            expression,
            sql_type,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl ScalarExpression<bool> {
    pub fn and(self, other: impl Into<Expression>) -> Self {
        predicate(self.expression.and(other))
    }

    pub fn or(self, other: impl Into<Expression>) -> Self {
        predicate(self.expression.or(other))
    }

    pub fn not(self) -> Self {
        predicate(self.expression.not())
    }
}

impl<T> Clone for ScalarExpression<T> {
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            sql_type: self.sql_type.clone(),
        }
    }
}

impl<T> Debug for ScalarExpression<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScalarExpression")
            .field(&self.expression)
            .finish()
    }
}

impl<T> ColumnDeclaring<T> for ScalarExpression<T> {
    fn sql_type(&self) -> Arc<dyn SqlType<T>> {
        self.sql_type.clone()
    }
    fn as_expression(&self) -> Expression {
        self.expression.clone()
    }
}

/// A value selected under a label, `expression AS label`.
pub struct DeclaredColumn<T> {
    expression: Expression,
    label: Cow<'static, str>,
    sql_type: Arc<dyn SqlType<T>>,
}

impl<T> DeclaredColumn<T> {
    pub fn declared_name(&self) -> &str {
        &self.label
    }
}

impl<T> Clone for DeclaredColumn<T> {
    fn clone(&self) -> Self {
        Self {
            expression: self.expression.clone(),
            label: self.label.clone(),
            sql_type: self.sql_type.clone(),
        }
    }
}

impl<T> Debug for DeclaredColumn<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredColumn")
            .field("expression", &self.expression)
            .field("label", &self.label)
            .finish()
    }
}

impl<T> ColumnDeclaring<T> for DeclaredColumn<T> {
    fn sql_type(&self) -> Arc<dyn SqlType<T>> {
        self.sql_type.clone()
    }
    /// Ordering by a declared column references its label.
    fn as_expression(&self) -> Expression {
        Expression::declaring(self.expression.clone(), Some(self.label.clone()))
    }
    fn label(&self) -> Option<Cow<'static, str>> {
        Some(self.label.clone())
    }
    fn as_declaring_expression(&self) -> Expression {
        self.as_expression()
    }
    fn aliased(&self, label: impl Into<Cow<'static, str>>) -> DeclaredColumn<T> {
        DeclaredColumn {
            expression: self.expression.clone(),
            label: label.into(),
            sql_type: self.sql_type.clone(),
        }
    }
}

/// Anything that can appear in the column list of a query.
pub trait Selectable {
    fn declaring_expression(&self) -> Expression;
    fn expression(&self) -> Expression;
}

macro_rules! impl_selectable {
    ($($ty:ident),+) => {
        $(
            impl<T> Selectable for $ty<T> {
                fn declaring_expression(&self) -> Expression {
                    self.as_declaring_expression()
                }
                fn expression(&self) -> Expression {
                    self.as_expression()
                }
            }
        )+
    };
}

impl_selectable!(Column, ScalarExpression, DeclaredColumn);

impl<T> From<Column<T>> for Expression {
    fn from(value: Column<T>) -> Self {
        value.as_expression()
    }
}

impl<T> From<&Column<T>> for Expression {
    fn from(value: &Column<T>) -> Self {
        value.as_expression()
    }
}

impl<T> From<ScalarExpression<T>> for Expression {
    fn from(value: ScalarExpression<T>) -> Self {
        value.expression
    }
}

impl<T> From<&ScalarExpression<T>> for Expression {
    fn from(value: &ScalarExpression<T>) -> Self {
        value.expression.clone()
    }
}

impl<T> From<DeclaredColumn<T>> for Expression {
    fn from(value: DeclaredColumn<T>) -> Self {
        value.as_declaring_expression()
    }
}
