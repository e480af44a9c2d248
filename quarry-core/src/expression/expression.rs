use crate::{
    AggregateType, ArgumentBinding, BinaryOpType, DeleteExpression, InsertExpression, Order,
    QueryExpression, SelectExpression, UnaryOpType, UnionExpression, UpdateExpression, Value,
};
use std::{borrow::Cow, sync::Arc};

/// Node of the SQL expression tree.
///
/// The tree is immutable, composite nodes are behind `Arc` so that cloning an
/// expression, or deriving a new one from it, shares every untouched subtree.
#[derive(Debug, Clone)]
pub enum Expression {
    Column(ColumnReference),
    Argument(ArgumentBinding),
    Binary(Arc<BinaryExpression>),
    Unary(Arc<UnaryExpression>),
    Function(Arc<FunctionExpression>),
    Aggregate(Arc<AggregateExpression>),
    Declaring(Arc<ColumnDeclaringExpression>),
    OrderBy(Arc<OrderByExpression>),
    InList(Arc<InListExpression>),
    Exists(Arc<ExistsExpression>),
    Between(Arc<BetweenExpression>),
    Select(Arc<SelectExpression>),
    Union(Arc<UnionExpression>),
    Insert(Arc<InsertExpression>),
    Update(Arc<UpdateExpression>),
    Delete(Arc<DeleteExpression>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableReference {
    pub name: Cow<'static, str>,
    /// Empty when not specified.
    pub schema: Cow<'static, str>,
    /// Empty when not specified.
    pub alias: Cow<'static, str>,
}

impl TableReference {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn with_schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.schema = schema.into();
        self
    }
    pub fn with_alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = alias.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReference {
    /// Owner table, used to qualify the column when the query joins more tables.
    pub table: Option<TableReference>,
    pub name: Cow<'static, str>,
    pub sql_type: Value,
}

#[derive(Debug)]
pub struct BinaryExpression {
    pub op: BinaryOpType,
    pub left: Expression,
    pub right: Expression,
    pub sql_type: Value,
}

#[derive(Debug)]
pub struct UnaryExpression {
    pub op: UnaryOpType,
    pub operand: Expression,
    pub sql_type: Value,
}

#[derive(Debug)]
pub struct FunctionExpression {
    pub name: Cow<'static, str>,
    pub arguments: Vec<Expression>,
    pub sql_type: Value,
}

#[derive(Debug)]
pub struct AggregateExpression {
    pub kind: AggregateType,
    /// `None` renders `COUNT(*)`.
    pub argument: Option<Expression>,
    pub distinct: bool,
    pub sql_type: Value,
}

/// Expression with an optional label, rendered as `expression AS label` in the column list.
#[derive(Debug)]
pub struct ColumnDeclaringExpression {
    pub expression: Expression,
    pub label: Option<Cow<'static, str>>,
}

#[derive(Debug, Clone)]
pub struct OrderByExpression {
    pub expression: Expression,
    pub order: Order,
}

#[derive(Debug)]
pub struct InListExpression {
    pub left: Expression,
    pub values: InListValues,
    pub not: bool,
}

#[derive(Debug)]
pub enum InListValues {
    Values(Vec<Expression>),
    Query(QueryExpression),
}

#[derive(Debug)]
pub struct ExistsExpression {
    pub query: QueryExpression,
    pub not: bool,
}

#[derive(Debug)]
pub struct BetweenExpression {
    pub expression: Expression,
    pub lower: Expression,
    pub upper: Expression,
    pub not: bool,
}

impl Expression {
    pub fn binary(
        op: BinaryOpType,
        left: impl Into<Expression>,
        right: impl Into<Expression>,
        sql_type: Value,
    ) -> Self {
        Expression::Binary(Arc::new(BinaryExpression {
            op,
            left: left.into(),
            right: right.into(),
            sql_type,
        }))
    }

    pub fn unary(op: UnaryOpType, operand: impl Into<Expression>, sql_type: Value) -> Self {
        Expression::Unary(Arc::new(UnaryExpression {
            op,
            operand: operand.into(),
            sql_type,
        }))
    }

    pub fn function(
        name: impl Into<Cow<'static, str>>,
        arguments: Vec<Expression>,
        sql_type: Value,
    ) -> Self {
        Expression::Function(Arc::new(FunctionExpression {
            name: name.into(),
            arguments,
            sql_type,
        }))
    }

    pub fn aggregate(
        kind: AggregateType,
        argument: Option<Expression>,
        distinct: bool,
        sql_type: Value,
    ) -> Self {
        Expression::Aggregate(Arc::new(AggregateExpression {
            kind,
            argument,
            distinct,
            sql_type,
        }))
    }

    pub fn declaring(
        expression: impl Into<Expression>,
        label: Option<Cow<'static, str>>,
    ) -> Self {
        Expression::Declaring(Arc::new(ColumnDeclaringExpression {
            expression: expression.into(),
            label,
        }))
    }

    pub fn column(
        table: Option<TableReference>,
        name: impl Into<Cow<'static, str>>,
        sql_type: Value,
    ) -> Self {
        Expression::Column(ColumnReference {
            table,
            name: name.into(),
            sql_type,
        })
    }

    /// Parameter carrying a dynamic value.
    pub fn value(value: impl Into<Value>) -> Self {
        Expression::Argument(ArgumentBinding::from_value(value.into()))
    }

    pub fn and(self, other: impl Into<Expression>) -> Self {
        Expression::binary(BinaryOpType::And, self, other, Value::Boolean(None))
    }

    pub fn or(self, other: impl Into<Expression>) -> Self {
        Expression::binary(BinaryOpType::Or, self, other, Value::Boolean(None))
    }

    pub fn not(self) -> Self {
        Expression::unary(UnaryOpType::Not, self, Value::Boolean(None))
    }

    pub fn is_null(self) -> Self {
        Expression::unary(UnaryOpType::IsNull, self, Value::Boolean(None))
    }

    pub fn is_not_null(self) -> Self {
        Expression::unary(UnaryOpType::IsNotNull, self, Value::Boolean(None))
    }

    pub fn between(self, lower: impl Into<Expression>, upper: impl Into<Expression>) -> Self {
        Expression::Between(Arc::new(BetweenExpression {
            expression: self,
            lower: lower.into(),
            upper: upper.into(),
            not: false,
        }))
    }

    pub fn not_between(self, lower: impl Into<Expression>, upper: impl Into<Expression>) -> Self {
        Expression::Between(Arc::new(BetweenExpression {
            expression: self,
            lower: lower.into(),
            upper: upper.into(),
            not: true,
        }))
    }

    pub fn in_list(self, values: InListValues, not: bool) -> Self {
        Expression::InList(Arc::new(InListExpression {
            left: self,
            values,
            not,
        }))
    }

    pub fn exists(query: impl Into<QueryExpression>) -> Self {
        Expression::Exists(Arc::new(ExistsExpression {
            query: query.into(),
            not: false,
        }))
    }

    pub fn not_exists(query: impl Into<QueryExpression>) -> Self {
        Expression::Exists(Arc::new(ExistsExpression {
            query: query.into(),
            not: true,
        }))
    }

    pub fn asc(self) -> OrderByExpression {
        OrderByExpression {
            expression: self,
            order: Order::Asc,
        }
    }

    pub fn desc(self) -> OrderByExpression {
        OrderByExpression {
            expression: self,
            order: Order::Desc,
        }
    }

    /// The SQL type of the value this expression produces, as a typed NULL.
    pub fn sql_type(&self) -> Value {
        match self {
            Expression::Column(v) => v.sql_type.clone(),
            Expression::Argument(v) => v.prototype(),
            Expression::Binary(v) => v.sql_type.clone(),
            Expression::Unary(v) => v.sql_type.clone(),
            Expression::Function(v) => v.sql_type.clone(),
            Expression::Aggregate(v) => v.sql_type.clone(),
            Expression::Declaring(v) => v.expression.sql_type(),
            Expression::OrderBy(v) => v.expression.sql_type(),
            Expression::InList(..) | Expression::Exists(..) | Expression::Between(..) => {
                Value::Boolean(None)
            }
            Expression::Select(v) => v
                .columns
                .first()
                .map(Expression::sql_type)
                .unwrap_or_default(),
            Expression::Union(v) => Expression::from(v.left.clone()).sql_type(),
            Expression::Insert(..) | Expression::Update(..) | Expression::Delete(..) => {
                Value::Int64(None)
            }
        }
    }
}

impl From<ColumnReference> for Expression {
    fn from(value: ColumnReference) -> Self {
        Expression::Column(value)
    }
}

impl From<ArgumentBinding> for Expression {
    fn from(value: ArgumentBinding) -> Self {
        Expression::Argument(value)
    }
}

impl From<OrderByExpression> for Expression {
    fn from(value: OrderByExpression) -> Self {
        Expression::OrderBy(Arc::new(value))
    }
}

impl From<QueryExpression> for Expression {
    fn from(value: QueryExpression) -> Self {
        match value {
            QueryExpression::Select(v) => Expression::Select(v),
            QueryExpression::Union(v) => Expression::Union(v),
        }
    }
}

impl From<SelectExpression> for Expression {
    fn from(value: SelectExpression) -> Self {
        Expression::Select(Arc::new(value))
    }
}

impl From<UnionExpression> for Expression {
    fn from(value: UnionExpression) -> Self {
        Expression::Union(Arc::new(value))
    }
}

impl From<InsertExpression> for Expression {
    fn from(value: InsertExpression) -> Self {
        Expression::Insert(Arc::new(value))
    }
}

impl From<UpdateExpression> for Expression {
    fn from(value: UpdateExpression) -> Self {
        Expression::Update(Arc::new(value))
    }
}

impl From<DeleteExpression> for Expression {
    fn from(value: DeleteExpression) -> Self {
        Expression::Delete(Arc::new(value))
    }
}
