use crate::{ColumnReference, Expression, JoinType, OrderByExpression, TableReference};
use std::{borrow::Cow, sync::Arc};

/// Data source of a select: a table or a derived table.
#[derive(Debug, Clone)]
pub enum QuerySource {
    Table(TableReference),
    Subquery {
        query: QueryExpression,
        alias: Cow<'static, str>,
    },
}

impl From<TableReference> for QuerySource {
    fn from(value: TableReference) -> Self {
        QuerySource::Table(value)
    }
}

#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinType,
    pub source: QuerySource,
    pub on: Option<Expression>,
}

/// A statement producing rows: a select or a set operation between selects.
#[derive(Debug, Clone)]
pub enum QueryExpression {
    Select(Arc<SelectExpression>),
    Union(Arc<UnionExpression>),
}

impl QueryExpression {
    pub fn order_by(&self) -> &[OrderByExpression] {
        match self {
            QueryExpression::Select(v) => &v.order_by,
            QueryExpression::Union(v) => &v.order_by,
        }
    }
    pub fn limit(&self) -> Option<u32> {
        match self {
            QueryExpression::Select(v) => v.limit,
            QueryExpression::Union(v) => v.limit,
        }
    }
    pub fn offset(&self) -> Option<u32> {
        match self {
            QueryExpression::Select(v) => v.offset,
            QueryExpression::Union(v) => v.offset,
        }
    }
    pub fn has_pagination(&self) -> bool {
        self.limit().is_some() || self.offset().is_some()
    }
    pub fn with_order_by(&self, order_by: impl IntoIterator<Item = OrderByExpression>) -> Self {
        match self {
            QueryExpression::Select(v) => v.with_order_by(order_by).into(),
            QueryExpression::Union(v) => v.with_order_by(order_by).into(),
        }
    }
    pub fn with_limit(&self, limit: Option<u32>) -> Self {
        match self {
            QueryExpression::Select(v) => v.with_limit(limit).into(),
            QueryExpression::Union(v) => v.with_limit(limit).into(),
        }
    }
    pub fn with_offset(&self, offset: Option<u32>) -> Self {
        match self {
            QueryExpression::Select(v) => v.with_offset(offset).into(),
            QueryExpression::Union(v) => v.with_offset(offset).into(),
        }
    }
    /// Same query without ordering and pagination.
    pub fn unordered(&self) -> Self {
        self.with_order_by([]).with_limit(None).with_offset(None)
    }
}

impl From<SelectExpression> for QueryExpression {
    fn from(value: SelectExpression) -> Self {
        QueryExpression::Select(Arc::new(value))
    }
}

impl From<UnionExpression> for QueryExpression {
    fn from(value: UnionExpression) -> Self {
        QueryExpression::Union(Arc::new(value))
    }
}

#[derive(Debug, Clone)]
pub struct SelectExpression {
    /// Empty means `*`.
    pub columns: Arc<[Expression]>,
    pub from: QuerySource,
    pub joins: Arc<[Join]>,
    pub condition: Option<Expression>,
    pub group_by: Arc<[Expression]>,
    pub having: Option<Expression>,
    pub order_by: Arc<[OrderByExpression]>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub distinct: bool,
}

impl SelectExpression {
    pub fn new(from: impl Into<QuerySource>) -> Self {
        Self {
            columns: Arc::new([]),
            from: from.into(),
            joins: Arc::new([]),
            condition: None,
            group_by: Arc::new([]),
            having: None,
            order_by: Arc::new([]),
            offset: None,
            limit: None,
            distinct: false,
        }
    }
    pub fn with_columns(&self, columns: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            ..self.clone()
        }
    }
    pub fn with_join(&self, join: Join) -> Self {
        Self {
            joins: self.joins.iter().cloned().chain([join]).collect(),
            ..self.clone()
        }
    }
    /// Combines the condition with the existing one using `AND`.
    pub fn with_where(&self, condition: Expression) -> Self {
        Self {
            condition: Some(match &self.condition {
                Some(current) => current.clone().and(condition),
                None => condition,
            }),
            ..self.clone()
        }
    }
    pub fn with_group_by(&self, group_by: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            group_by: group_by.into_iter().collect(),
            ..self.clone()
        }
    }
    pub fn with_having(&self, having: Expression) -> Self {
        Self {
            having: Some(having),
            ..self.clone()
        }
    }
    pub fn with_order_by(&self, order_by: impl IntoIterator<Item = OrderByExpression>) -> Self {
        Self {
            order_by: order_by.into_iter().collect(),
            ..self.clone()
        }
    }
    pub fn with_limit(&self, limit: Option<u32>) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }
    pub fn with_offset(&self, offset: Option<u32>) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
    pub fn with_distinct(&self, distinct: bool) -> Self {
        Self {
            distinct,
            ..self.clone()
        }
    }
}

/// `UNION` or `UNION ALL` of two queries, with its own ordering and pagination.
#[derive(Debug, Clone)]
pub struct UnionExpression {
    pub left: QueryExpression,
    pub right: QueryExpression,
    pub all: bool,
    pub order_by: Arc<[OrderByExpression]>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl UnionExpression {
    pub fn new(left: impl Into<QueryExpression>, right: impl Into<QueryExpression>, all: bool) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            all,
            order_by: Arc::new([]),
            offset: None,
            limit: None,
        }
    }
    pub fn with_order_by(&self, order_by: impl IntoIterator<Item = OrderByExpression>) -> Self {
        Self {
            order_by: order_by.into_iter().collect(),
            ..self.clone()
        }
    }
    pub fn with_limit(&self, limit: Option<u32>) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }
    pub fn with_offset(&self, offset: Option<u32>) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnAssignment {
    pub column: ColumnReference,
    pub expression: Expression,
}

#[derive(Debug, Clone)]
pub struct InsertExpression {
    pub table: TableReference,
    pub assignments: Arc<[ColumnAssignment]>,
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub table: TableReference,
    pub assignments: Arc<[ColumnAssignment]>,
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct DeleteExpression {
    pub table: TableReference,
    pub condition: Option<Expression>,
}
