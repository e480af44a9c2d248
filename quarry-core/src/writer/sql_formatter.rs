use crate::{
    AggregateExpression, ArgumentBinding, BetweenExpression, BinaryExpression, BinaryOpType,
    ColumnAssignment, ColumnDeclaringExpression, ColumnReference, DatabaseMetadata,
    DeleteExpression, ExistsExpression, Expression, FormatterSettings, FunctionExpression,
    InListExpression, InListValues, InsertExpression, Join, JoinType, Order, OrderByExpression,
    QueryExpression, QuerySource, Result, SelectExpression, SqlError, TableReference,
    UnaryExpression, UnaryOpType, UnionExpression, UpdateExpression, possibly_parenthesized,
    sql_types, try_separated_by,
    writer::{Context, Fragment},
};
use std::sync::Arc;

/// Renders an [`Expression`] tree to SQL text plus the ordered list of arguments.
///
/// One method per node kind, all with a default rendering of standard SQL. A
/// dialect overrides the methods it renders differently (quoting, placeholders,
/// pagination) and inherits the rest.
pub trait SqlFormatter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlFormatter;

    fn settings(&self) -> &FormatterSettings;

    fn metadata(&self) -> &DatabaseMetadata {
        &self.settings().metadata
    }

    /// Format a complete statement.
    fn format(&self, expression: &Expression) -> Result<(String, Vec<ArgumentBinding>)> {
        let mut context = Context::default();
        let mut out = String::with_capacity(128);
        self.write_expression(&mut context, &mut out, expression)?;
        Ok((out, context.arguments))
    }

    /// Write a keyword given in upper case, in the case the database prefers.
    fn write_keyword(&self, _context: &mut Context, out: &mut String, keyword: &str) {
        if self.metadata().upper_case_keywords() {
            out.push_str(keyword);
        } else {
            out.extend(keyword.chars().map(|c| c.to_ascii_lowercase()));
        }
    }

    fn write_indent(&self, context: &mut Context, out: &mut String) {
        let size = context.depth * self.settings().indent_size;
        out.extend(std::iter::repeat_n(' ', size));
    }

    /// Separator before a clause: a space, or a new indented line when beautifying.
    fn write_clause_break(&self, context: &mut Context, out: &mut String) {
        if self.settings().beautify {
            out.push('\n');
            self.write_indent(context, out);
        } else {
            out.push(' ');
        }
    }

    /// New indented line when beautifying, nothing otherwise.
    fn write_line_break(&self, context: &mut Context, out: &mut String) {
        if self.settings().beautify {
            out.push('\n');
            self.write_indent(context, out);
        }
    }

    /// Escape occurrences of `search` with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: &str,
        replace: &str,
    ) {
        if search.is_empty() {
            out.push_str(value);
            return;
        }
        let mut position = 0;
        for (i, _) in value.match_indices(search) {
            out.push_str(&value[position..i]);
            out.push_str(replace);
            position = i + search.len();
        }
        out.push_str(&value[position..]);
    }

    fn should_quote_identifier(&self, identifier: &str) -> bool {
        let metadata = self.metadata();
        if metadata.always_quote_identifiers
            || !metadata.is_valid_identifier(identifier)
            || metadata.is_keyword(identifier)
        {
            return true;
        }
        let mixed_case = identifier.chars().any(char::is_uppercase)
            && identifier.chars().any(char::is_lowercase);
        mixed_case
            && !metadata.supports_mixed_case_identifiers
            && metadata.supports_mixed_case_quoted_identifiers
    }

    fn write_identifier(&self, context: &mut Context, out: &mut String, value: &str) -> Result<()> {
        let max = self.metadata().max_column_name_length;
        if max > 0 && value.chars().count() > max {
            return Err(SqlError::IdentifierTooLong {
                identifier: value.to_string(),
                max,
            }
            .into());
        }
        if self.should_quote_identifier(value) {
            self.write_identifier_quoted(context, out, value);
        } else {
            out.push_str(value);
        }
        Ok(())
    }

    /// Quote identifier doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        let quote = self.metadata().identifier_quote_string.clone();
        let escaped = format!("{quote}{quote}");
        out.push_str(&quote);
        self.write_escaped(context, out, value, &quote, &escaped);
        out.push_str(&quote);
    }

    /// Render a table reference with optional schema and alias.
    fn write_table_reference(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &TableReference,
    ) -> Result<()> {
        if !value.schema.is_empty() {
            self.write_identifier(context, out, &value.schema)?;
            out.push('.');
        }
        self.write_identifier(context, out, &value.name)?;
        if !value.alias.is_empty() {
            out.push(' ');
            self.write_identifier(context, out, &value.alias)?;
        }
        Ok(())
    }

    /// Render a column reference, qualified by the table alias or name when the
    /// query involves more than one table or the column belongs to an enclosing
    /// statement.
    fn write_column_reference(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ColumnReference,
    ) -> Result<()> {
        let qualifier = match &value.table {
            Some(table) if context.qualify_columns => Some(table.clone()),
            Some(table) => context.outer_table(table),
            None => None,
        };
        if let Some(table) = &qualifier {
            if !table.alias.is_empty() {
                self.write_identifier(context, out, &table.alias)?;
            } else {
                if !table.schema.is_empty() {
                    self.write_identifier(context, out, &table.schema)?;
                    out.push('.');
                }
                self.write_identifier(context, out, &table.name)?;
            }
            out.push('.');
        }
        self.write_identifier(context, out, &value.name)
    }

    /// Render parameter placeholder number `position`, counting from 1.
    fn write_placeholder(&self, _context: &mut Context, out: &mut String, _position: usize) {
        out.push('?');
    }

    fn write_argument(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ArgumentBinding,
    ) -> Result<()> {
        let position = context.push_argument(value.clone());
        self.write_placeholder(context, out, position);
        Ok(())
    }

    /// Precedence table for unary operators.
    fn expression_unary_op_precedence(&self, value: &UnaryOpType) -> i32 {
        match value {
            UnaryOpType::Negative => 1250,
            UnaryOpType::Not => 250,
            UnaryOpType::IsNull => 400,
            UnaryOpType::IsNotNull => 400,
        }
    }

    /// Precedence table for binary operators.
    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Like => 400,
            BinaryOpType::NotLike => 400,
            BinaryOpType::Subtraction => 800,
            BinaryOpType::Addition => 800,
            BinaryOpType::Multiplication => 900,
            BinaryOpType::Division => 900,
            BinaryOpType::Remainder => 900,
        }
    }

    fn expression_precedence(&self, value: &Expression) -> i32 {
        match value {
            Expression::Binary(v) => self.expression_binary_op_precedence(&v.op),
            Expression::Unary(v) => self.expression_unary_op_precedence(&v.op),
            Expression::InList(..) | Expression::Between(..) => 400,
            _ => 1_000_000,
        }
    }

    fn write_expression(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Expression,
    ) -> Result<()> {
        match value {
            Expression::Column(v) => self.write_column_reference(context, out, v),
            Expression::Argument(v) => self.write_argument(context, out, v),
            Expression::Binary(v) => self.write_binary(context, out, v),
            Expression::Unary(v) => self.write_unary(context, out, v),
            Expression::Function(v) => self.write_function(context, out, v),
            Expression::Aggregate(v) => self.write_aggregate(context, out, v),
            Expression::Declaring(v) => self.write_column_declaring(context, out, v),
            Expression::OrderBy(v) => self.write_order_by(context, out, v),
            Expression::InList(v) => self.write_in_list(context, out, v),
            Expression::Exists(v) => self.write_exists(context, out, v),
            Expression::Between(v) => self.write_between(context, out, v),
            Expression::Select(v) => {
                let query = QueryExpression::Select(v.clone());
                if context.fragment == Fragment::None {
                    self.write_query(context, out, &query)
                } else {
                    self.write_subquery(context, out, &query)
                }
            }
            Expression::Union(v) => {
                let query = QueryExpression::Union(v.clone());
                if context.fragment == Fragment::None {
                    self.write_query(context, out, &query)
                } else {
                    self.write_subquery(context, out, &query)
                }
            }
            Expression::Insert(v) => self.write_insert(context, out, v),
            Expression::Update(v) => self.write_update(context, out, v),
            Expression::Delete(v) => self.write_delete(context, out, v),
        }
    }

    /// Render operand, parenthesized when its precedence is not higher than `precedence`.
    fn write_operand(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &Expression,
        precedence: i32,
    ) -> Result<()> {
        possibly_parenthesized!(
            out,
            self.expression_precedence(value) <= precedence,
            self.write_expression(context, out, value)?
        );
        Ok(())
    }

    fn write_unary(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &UnaryExpression,
    ) -> Result<()> {
        let precedence = self.expression_unary_op_precedence(&value.op);
        match value.op {
            UnaryOpType::Negative => {
                out.push('-');
                self.write_operand(context, out, &value.operand, precedence)
            }
            UnaryOpType::Not => {
                self.write_keyword(context, out, "NOT ");
                self.write_operand(context, out, &value.operand, precedence)
            }
            UnaryOpType::IsNull | UnaryOpType::IsNotNull => {
                self.write_operand(context, out, &value.operand, precedence)?;
                self.write_keyword(
                    context,
                    out,
                    if value.op == UnaryOpType::IsNull {
                        " IS NULL"
                    } else {
                        " IS NOT NULL"
                    },
                );
                Ok(())
            }
        }
    }

    /// Render binary operator expression handling precedence / parenthesis.
    fn write_binary(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &BinaryExpression,
    ) -> Result<()> {
        let infix = match value.op {
            BinaryOpType::Multiplication => " * ",
            BinaryOpType::Division => " / ",
            BinaryOpType::Remainder => " % ",
            BinaryOpType::Addition => " + ",
            BinaryOpType::Subtraction => " - ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " <> ",
            BinaryOpType::Less => " < ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        };
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            self.expression_precedence(&value.left) < precedence,
            self.write_expression(context, out, &value.left)?
        );
        self.write_keyword(context, out, infix);
        self.write_operand(context, out, &value.right, precedence)
    }

    fn write_function(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &FunctionExpression,
    ) -> Result<()> {
        out.push_str(&value.name);
        out.push('(');
        try_separated_by(
            out,
            &value.arguments,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    fn write_aggregate(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &AggregateExpression,
    ) -> Result<()> {
        self.write_keyword(context, out, value.kind.keyword());
        out.push('(');
        if value.distinct {
            self.write_keyword(context, out, "DISTINCT ");
        }
        match &value.argument {
            Some(argument) => self.write_expression(context, out, argument)?,
            None => out.push('*'),
        }
        out.push(')');
        Ok(())
    }

    /// `expression AS label` in the column list, the label alone when ordering.
    fn write_column_declaring(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ColumnDeclaringExpression,
    ) -> Result<()> {
        match (&value.label, context.fragment) {
            (Some(label), Fragment::SqlSelect) => {
                self.write_expression(context, out, &value.expression)?;
                self.write_keyword(context, out, " AS ");
                self.write_identifier(context, out, label)
            }
            (Some(label), Fragment::SqlSelectOrderBy) => self.write_identifier(context, out, label),
            _ => self.write_expression(context, out, &value.expression),
        }
    }

    /// Render ordered expression inside ORDER BY.
    fn write_order_by(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &OrderByExpression,
    ) -> Result<()> {
        self.write_expression(context, out, &value.expression)?;
        self.write_keyword(
            context,
            out,
            match value.order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            },
        );
        Ok(())
    }

    fn write_in_list(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &InListExpression,
    ) -> Result<()> {
        self.write_operand(context, out, &value.left, 400)?;
        self.write_keyword(context, out, if value.not { " NOT IN " } else { " IN " });
        match &value.values {
            InListValues::Values(values) => {
                out.push('(');
                try_separated_by(
                    out,
                    values,
                    |out, v| self.write_expression(context, out, v),
                    ", ",
                )?;
                out.push(')');
                Ok(())
            }
            InListValues::Query(query) => self.write_subquery(context, out, query),
        }
    }

    fn write_exists(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ExistsExpression,
    ) -> Result<()> {
        self.write_keyword(context, out, if value.not { "NOT EXISTS " } else { "EXISTS " });
        self.write_subquery(context, out, &value.query)
    }

    fn write_between(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &BetweenExpression,
    ) -> Result<()> {
        self.write_operand(context, out, &value.expression, 400)?;
        self.write_keyword(
            context,
            out,
            if value.not { " NOT BETWEEN " } else { " BETWEEN " },
        );
        self.write_operand(context, out, &value.lower, 400)?;
        self.write_keyword(context, out, " AND ");
        self.write_operand(context, out, &value.upper, 400)
    }

    fn write_query(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &QueryExpression,
    ) -> Result<()> {
        match value {
            QueryExpression::Select(v) => self.write_select(context, out, v),
            QueryExpression::Union(v) => self.write_union(context, out, v),
        }
    }

    /// Parenthesized query, one indentation level deeper.
    fn write_subquery(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &QueryExpression,
    ) -> Result<()> {
        out.push('(');
        {
            let mut context = context.nested(Fragment::None);
            self.write_line_break(&mut context, out);
            self.write_query(&mut context, out, value)?;
        }
        self.write_line_break(context, out);
        out.push(')');
        Ok(())
    }

    fn write_query_source(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &QuerySource,
    ) -> Result<()> {
        match value {
            QuerySource::Table(table) => self.write_table_reference(context, out, table),
            QuerySource::Subquery { query, alias } => {
                self.write_subquery(context, out, query)?;
                out.push(' ');
                self.write_identifier(context, out, alias)
            }
        }
    }

    /// Render join keyword(s) for the given join type.
    fn write_join_type(&self, context: &mut Context, out: &mut String, join_type: &JoinType) {
        self.write_keyword(
            context,
            out,
            match join_type {
                JoinType::Inner => "INNER JOIN",
                JoinType::Left => "LEFT JOIN",
                JoinType::Right => "RIGHT JOIN",
                JoinType::Full => "FULL OUTER JOIN",
                JoinType::Cross => "CROSS JOIN",
            },
        );
    }

    /// Render a JOIN clause.
    fn write_join(&self, context: &mut Context, out: &mut String, join: &Join) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_join_type(&mut context, out, &join.kind);
        out.push(' ');
        self.write_query_source(&mut context, out, &join.source)?;
        if let Some(on) = &join.on {
            self.write_keyword(&mut context, out, " ON ");
            self.write_expression(&mut context, out, on)?;
        }
        Ok(())
    }

    fn write_order_by_clause(
        &self,
        context: &mut Context,
        out: &mut String,
        order_by: &[OrderByExpression],
    ) -> Result<()> {
        if order_by.is_empty() {
            return Ok(());
        }
        let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
        self.write_clause_break(&mut context, out);
        self.write_keyword(&mut context, out, "ORDER BY ");
        try_separated_by(
            out,
            order_by,
            |out, v| self.write_order_by(&mut context, out, v),
            ", ",
        )
    }

    fn write_pagination_clause(
        &self,
        context: &mut Context,
        out: &mut String,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<()> {
        if limit.is_none() && offset.is_none() {
            return Ok(());
        }
        let mut context = context.switch_fragment(Fragment::SqlPagination);
        self.write_clause_break(&mut context, out);
        self.write_pagination(&mut context, out, limit, offset)
    }

    /// Render the pagination of a query. Standard SQL has none: dialects override this.
    fn write_pagination(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _limit: Option<u32>,
        _offset: Option<u32>,
    ) -> Result<()> {
        Err(SqlError::UnsupportedFeature(format!(
            "Pagination is not supported by the {} dialect, please configure a dialect implementation for your database",
            self.metadata().dialect_name
        ))
        .into())
    }

    /// Bind a pagination number as an argument.
    fn write_pagination_argument(
        &self,
        context: &mut Context,
        out: &mut String,
        value: i64,
    ) -> Result<()> {
        self.write_argument(
            context,
            out,
            &ArgumentBinding::new(Some(value), Arc::new(sql_types::LONG)),
        )
    }

    /// Emit SELECT statement.
    fn write_select(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &SelectExpression,
    ) -> Result<()> {
        let tables = std::iter::once(&value.from)
            .chain(value.joins.iter().map(|v| &v.source))
            .map(|v| match v {
                QuerySource::Table(table) => table.clone(),
                QuerySource::Subquery { alias, .. } => TableReference::new(alias.clone()),
            })
            .collect();
        let mut context = context.enter_scope(Fragment::SqlSelect, tables);
        context.qualify_columns = !value.joins.is_empty();
        self.write_keyword(&mut context, out, "SELECT ");
        if value.distinct {
            self.write_keyword(&mut context, out, "DISTINCT ");
        }
        if value.columns.is_empty() {
            out.push('*');
        } else {
            try_separated_by(
                out,
                value.columns.iter(),
                |out, v| self.write_expression(&mut context, out, v),
                ", ",
            )?;
        }
        {
            let mut context = context.switch_fragment(Fragment::SqlSelectFrom);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "FROM ");
            self.write_query_source(&mut context, out, &value.from)?;
        }
        for join in value.joins.iter() {
            self.write_clause_break(&mut context, out);
            self.write_join(&mut context, out, join)?;
        }
        if let Some(condition) = &value.condition {
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "WHERE ");
            self.write_expression(&mut context, out, condition)?;
        }
        if !value.group_by.is_empty() {
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "GROUP BY ");
            try_separated_by(
                out,
                value.group_by.iter(),
                |out, v| self.write_expression(&mut context, out, v),
                ", ",
            )?;
        }
        if let Some(having) = &value.having {
            let mut context = context.switch_fragment(Fragment::SqlSelectHaving);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "HAVING ");
            self.write_expression(&mut context, out, having)?;
        }
        self.write_order_by_clause(&mut context, out, &value.order_by)?;
        self.write_pagination_clause(&mut context, out, value.limit, value.offset)
    }

    /// Operand of a set operation, parenthesized when its own ordering, pagination
    /// or nesting would otherwise change the meaning.
    fn write_union_operand(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &QueryExpression,
        right: bool,
    ) -> Result<()> {
        let parenthesized = match value {
            QueryExpression::Select(..) => !value.order_by().is_empty() || value.has_pagination(),
            QueryExpression::Union(..) => {
                right || !value.order_by().is_empty() || value.has_pagination()
            }
        };
        if parenthesized {
            self.write_subquery(context, out, value)
        } else {
            self.write_query(context, out, value)
        }
    }

    fn write_union(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &UnionExpression,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlUnion);
        self.write_union_operand(&mut context, out, &value.left, false)?;
        self.write_clause_break(&mut context, out);
        self.write_keyword(
            &mut context,
            out,
            if value.all { "UNION ALL" } else { "UNION" },
        );
        self.write_clause_break(&mut context, out);
        self.write_union_operand(&mut context, out, &value.right, true)?;
        self.write_order_by_clause(&mut context, out, &value.order_by)?;
        self.write_pagination_clause(&mut context, out, value.limit, value.offset)
    }

    fn write_assignment(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &ColumnAssignment,
    ) -> Result<()> {
        self.write_identifier(context, out, &value.column.name)?;
        out.push_str(" = ");
        self.write_expression(context, out, &value.expression)
    }

    /// Emit INSERT statement.
    fn write_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &InsertExpression,
    ) -> Result<()> {
        let mut context = context.enter_scope(Fragment::SqlInsertInto, vec![value.table.clone()]);
        context.qualify_columns = false;
        self.write_keyword(&mut context, out, "INSERT INTO ");
        self.write_table_reference(&mut context, out, &value.table)?;
        out.push_str(" (");
        try_separated_by(
            out,
            value.assignments.iter(),
            |out, v| self.write_identifier(&mut context, out, &v.column.name),
            ", ",
        )?;
        out.push(')');
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        self.write_clause_break(&mut context, out);
        self.write_keyword(&mut context, out, "VALUES ");
        out.push('(');
        try_separated_by(
            out,
            value.assignments.iter(),
            |out, v| self.write_expression(&mut context, out, &v.expression),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    /// Emit UPDATE statement.
    fn write_update(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &UpdateExpression,
    ) -> Result<()> {
        let mut context = context.enter_scope(Fragment::SqlUpdate, vec![value.table.clone()]);
        context.qualify_columns = false;
        self.write_keyword(&mut context, out, "UPDATE ");
        self.write_table_reference(&mut context, out, &value.table)?;
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "SET ");
            try_separated_by(
                out,
                value.assignments.iter(),
                |out, v| self.write_assignment(&mut context, out, v),
                ", ",
            )?;
        }
        if let Some(condition) = &value.condition {
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "WHERE ");
            self.write_expression(&mut context, out, condition)?;
        }
        Ok(())
    }

    /// Emit DELETE statement.
    fn write_delete(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &DeleteExpression,
    ) -> Result<()> {
        let mut context = context.enter_scope(Fragment::SqlDeleteFrom, vec![value.table.clone()]);
        context.qualify_columns = false;
        self.write_keyword(&mut context, out, "DELETE FROM ");
        self.write_table_reference(&mut context, out, &value.table)?;
        if let Some(condition) = &value.condition {
            let mut context = context.switch_fragment(Fragment::SqlDeleteFromWhere);
            self.write_clause_break(&mut context, out);
            self.write_keyword(&mut context, out, "WHERE ");
            self.write_expression(&mut context, out, condition)?;
        }
        Ok(())
    }
}

/// Formatter of the standard dialect, renders plain SQL without pagination.
pub struct GenericSqlFormatter {
    settings: FormatterSettings,
}

impl GenericSqlFormatter {
    pub fn new(settings: FormatterSettings) -> Self {
        Self { settings }
    }
}

impl SqlFormatter for GenericSqlFormatter {
    fn as_dyn(&self) -> &dyn SqlFormatter {
        self
    }
    fn settings(&self) -> &FormatterSettings {
        &self.settings
    }
}
