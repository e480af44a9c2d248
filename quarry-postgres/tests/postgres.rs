#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        ArgumentBinding, BinaryOpType, ColumnAssignment, ColumnReference, Database, Expression,
        InListValues, QueryExpression, SelectExpression, TableReference, UpdateExpression, Value,
        sql_types,
    };
    use quarry_postgres::PostgresDialect;
    use quarry_tests::{Event, MockConnectionFactory};
    use std::sync::Arc;

    async fn database(
        factory: &MockConnectionFactory,
        upper_case: Option<bool>,
    ) -> Database<MockConnectionFactory> {
        Database::builder(factory.clone())
            .dialect(Arc::new(PostgresDialect))
            .generate_sql_in_upper_case(upper_case)
            .connect()
            .await
            .expect("Could not create the database")
    }

    fn column(table: &TableReference, name: &'static str) -> Expression {
        Expression::column(Some(table.clone()), name, Value::Int32(None))
    }

    fn int(value: i32) -> Expression {
        ArgumentBinding::new(Some(value), Arc::new(sql_types::INT)).into()
    }

    #[tokio::test]
    async fn numbered_placeholders() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory, None).await;
        let employee = TableReference::new("employee");
        let query: Expression = SelectExpression::new(employee.clone())
            .with_columns([column(&employee, "name")])
            .with_where(
                column(&employee, "id")
                    .in_list(InListValues::Values(vec![int(1), int(2), int(3)]), false)
                    .and(column(&employee, "salary").between(int(10), int(20))),
            )
            .with_limit(Some(5))
            .with_offset(Some(10))
            .into();
        let (sql, arguments) = database.format(&query).unwrap();
        assert_eq!(
            sql,
            "select name from employee where id in ($1, $2, $3) and salary between $4 and $5 limit $6 offset $7"
        );
        assert_eq!(arguments.len(), 7);
        assert_eq!(arguments[5].value(), Value::Int64(Some(5)));
        assert_eq!(arguments[6].value(), Value::Int64(Some(10)));
    }

    #[tokio::test]
    async fn pagination_parts() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory, Some(true)).await;
        let employee = TableReference::new("employee");
        let base = SelectExpression::new(employee.clone()).with_columns([column(&employee, "id")]);

        let query: Expression = base.with_limit(Some(3)).into();
        assert_eq!(
            database.format(&query).unwrap().0,
            "SELECT id FROM employee LIMIT $1"
        );

        let query: Expression = base.with_offset(Some(3)).into();
        assert_eq!(
            database.format(&query).unwrap().0,
            "SELECT id FROM employee OFFSET $1"
        );

        let query: Expression = base.into();
        assert_eq!(database.format(&query).unwrap().0, "SELECT id FROM employee");
    }

    #[tokio::test]
    async fn placeholders_number_across_subqueries() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory, None).await;
        let employee = TableReference::new("employee");
        let manager = TableReference::new("manager");
        let managers: QueryExpression = SelectExpression::new(manager.clone())
            .with_columns([column(&manager, "employee_id")])
            .with_where(Expression::binary(
                BinaryOpType::Greater,
                column(&manager, "level"),
                int(2),
                Value::Boolean(None),
            ))
            .into();
        let update: Expression = UpdateExpression {
            table: employee.clone(),
            assignments: [ColumnAssignment {
                column: ColumnReference {
                    table: Some(employee.clone()),
                    name: "salary".into(),
                    sql_type: Value::Int32(None),
                },
                expression: int(1000),
            }]
            .into(),
            condition: Some(
                column(&employee, "id").in_list(InListValues::Query(managers), false),
            ),
        }
        .into();
        let affected = database.execute_update(&update).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            factory.executed(),
            ["update employee set salary = $1 where id in (select employee_id from manager where level > $2)"]
        );
        assert!(factory.events().contains(&Event::Bind(1, Value::Int32(Some(2)))));
    }

    #[tokio::test]
    async fn identifiers() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory, None).await;
        let table = TableReference::new("user").with_schema("public");
        let query: Expression = SelectExpression::new(table.clone())
            .with_columns([column(&table, "userName"), column(&table, "offset")])
            .into();
        assert_eq!(
            database.format(&query).unwrap().0,
            r#"select "userName", "offset" from public."user""#
        );
        assert_eq!(database.dialect().name(), "postgresql");
    }

    #[tokio::test]
    async fn beautify() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory, None).await;
        let employee = TableReference::new("employee");
        let query: Expression = SelectExpression::new(employee.clone())
            .with_columns([column(&employee, "id")])
            .with_where(Expression::binary(
                BinaryOpType::Equal,
                column(&employee, "id"),
                int(7),
                Value::Boolean(None),
            ))
            .with_limit(Some(1))
            .into();
        let (sql, _) = database.format_expression(&query, true, 2).unwrap();
        assert_eq!(
            sql,
            indoc! {"
                select id
                from employee
                where id = $1
                limit $2"}
        );
    }
}
