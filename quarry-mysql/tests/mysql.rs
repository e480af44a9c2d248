#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        ArgumentBinding, BinaryOpType, Database, Expression, SelectExpression, TableReference,
        Value, sql_types,
        stream::TryStreamExt,
    };
    use quarry_mysql::MySqlDialect;
    use quarry_tests::{Event, MockConnectionFactory, init_logs};
    use std::sync::Arc;

    async fn database(factory: &MockConnectionFactory) -> Database<MockConnectionFactory> {
        Database::builder(factory.clone())
            .dialect(Arc::new(MySqlDialect))
            .connect()
            .await
            .expect("Could not create the database")
    }

    fn select(table: &TableReference, columns: &[&'static str]) -> SelectExpression {
        SelectExpression::new(table.clone()).with_columns(
            columns
                .iter()
                .map(|v| Expression::column(Some(table.clone()), *v, Value::Varchar(None))),
        )
    }

    fn arguments(arguments: &[ArgumentBinding]) -> Vec<Value> {
        arguments.iter().map(|v| v.value()).collect()
    }

    #[tokio::test]
    async fn pagination() {
        init_logs();
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employee = TableReference::new("employee");

        let query: Expression = select(&employee, &["name"])
            .with_limit(Some(10))
            .with_offset(Some(20))
            .into();
        let (sql, args) = database.format(&query).unwrap();
        assert_eq!(sql, "SELECT name FROM employee LIMIT ?, ?");
        assert_eq!(
            arguments(&args),
            [Value::Int64(Some(20)), Value::Int64(Some(10))]
        );

        let query: Expression = select(&employee, &["name"]).with_limit(Some(5)).into();
        let (sql, args) = database.format(&query).unwrap();
        assert_eq!(sql, "SELECT name FROM employee LIMIT ?, ?");
        assert_eq!(arguments(&args), [Value::Int64(Some(0)), Value::Int64(Some(5))]);

        let query: Expression = select(&employee, &["name"]).with_offset(Some(3)).into();
        let (_, args) = database.format(&query).unwrap();
        assert_eq!(
            arguments(&args),
            [Value::Int64(Some(3)), Value::Int64(Some(i32::MAX as i64))]
        );
    }

    #[tokio::test]
    async fn pagination_arguments_follow_condition() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employee = TableReference::new("employee");
        let query: Expression = select(&employee, &["name"])
            .with_where(Expression::binary(
                BinaryOpType::Greater,
                Expression::column(Some(employee.clone()), "salary", Value::Int64(None)),
                ArgumentBinding::new(Some(100i64), Arc::new(sql_types::LONG)),
                Value::Boolean(None),
            ))
            .with_limit(Some(2))
            .into();
        factory.clear_events();
        let rows = database
            .execute_query(&query)
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            factory.executed(),
            ["SELECT name FROM employee WHERE salary > ? LIMIT ?, ?"]
        );
        let binds = factory
            .events()
            .into_iter()
            .filter(|v| matches!(v, Event::Bind(..)))
            .collect::<Vec<_>>();
        assert_eq!(
            binds,
            [
                Event::Bind(0, Value::Int64(Some(100))),
                Event::Bind(1, Value::Int64(Some(0))),
                Event::Bind(2, Value::Int64(Some(2))),
            ]
        );
    }

    #[tokio::test]
    async fn identifiers() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let table = TableReference::new("order_line");
        let query: Expression =
            select(&table, &["firstName", "key", "col#1", "first name", "back`tick"]).into();
        let (sql, _) = database.format(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT firstName, `key`, col#1, `first name`, `back``tick` FROM order_line"
        );
        assert_eq!(database.metadata().product_name, "MockDB");
        assert_eq!(database.dialect().name(), "mysql");
    }

    #[tokio::test]
    async fn identifier_length() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let table = TableReference::new("employee");
        let long: &'static str = Box::leak("x".repeat(65).into_boxed_str());
        let query: Expression = select(&table, &[long]).into();
        assert!(database.format(&query).is_err());
        let fits: &'static str = Box::leak("x".repeat(64).into_boxed_str());
        let query: Expression = select(&table, &[fits]).into();
        assert!(database.format(&query).is_ok());
    }

    #[tokio::test]
    async fn beautify() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let table = TableReference::new("employee");
        let query: Expression = select(&table, &["id", "name"])
            .with_order_by([Expression::column(None, "name", Value::Varchar(None)).asc()])
            .with_limit(Some(10))
            .into();
        let (sql, _) = database.format_expression(&query, true, 4).unwrap();
        assert_eq!(
            sql,
            indoc! {"
                SELECT id, name
                FROM employee
                ORDER BY name ASC
                LIMIT ?, ?"}
        );
    }
}
