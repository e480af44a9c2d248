mod resource {
    pub mod company;
}

#[cfg(test)]
mod tests {
    use crate::resource::company::{Departments, Employees};
    use quarry::{
        ColumnDeclaring, Database, DatabaseExt, Expression, QueryResult, Result, Row, SqlError, Value,
        avg, count_all,
        stream::TryStreamExt,
    };
    use quarry_tests::{Event, MockConnectionFactory, init_logs};

    async fn database(factory: &MockConnectionFactory) -> Database<MockConnectionFactory> {
        let database = Database::connect(factory.clone())
            .await
            .expect("Could not create the database");
        factory.clear_events();
        database
    }

    fn row(labels: &[&str], values: impl IntoIterator<Item = Value>) -> QueryResult {
        QueryResult::Row(Row::new(
            labels.iter().map(|v| v.to_string()).collect(),
            values.into_iter().collect(),
        ))
    }

    #[tokio::test]
    async fn select_where_order_by() {
        init_logs();
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.name])
            .where_(employees.department_id.eq(1))
            .order_by([employees.id.asc()]);
        assert_eq!(
            query.sql().unwrap(),
            "SELECT name FROM t_employee WHERE department_id = ? ORDER BY id ASC"
        );

        factory.script(
            "FROM t_employee",
            [
                row(&["name"], [Value::Varchar(Some("vince".into()))]),
                row(&["name"], [Value::Varchar(Some("marry".into()))]),
            ],
        );
        let rows = query.rows().try_collect::<Vec<_>>().await.unwrap();
        let names = rows
            .iter()
            .map(|v| v.get(&employees.name))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            names,
            [Some("vince".to_string()), Some("marry".to_string())]
        );
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::CreateStatement(
                    "SELECT name FROM t_employee WHERE department_id = ? ORDER BY id ASC".into()
                ),
                Event::Bind(0, Value::Int32(Some(1))),
                Event::Execute(
                    "SELECT name FROM t_employee WHERE department_id = ? ORDER BY id ASC".into()
                ),
                Event::Close,
            ]
        );
    }

    #[tokio::test]
    async fn quoted_identifiers() {
        let factory = MockConnectionFactory::new();
        let database = Database::builder(factory.clone())
            .always_quote_identifiers(true)
            .connect()
            .await
            .unwrap();
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.name])
            .where_(employees.department_id.eq(1))
            .order_by([employees.id.asc()]);
        let (sql, arguments) = database
            .format(&Expression::from(query.expression().clone()))
            .unwrap();
        assert_eq!(
            sql,
            r#"SELECT "name" FROM "t_employee" WHERE "department_id" = ? ORDER BY "id" ASC"#
        );
        assert_eq!(
            arguments.iter().map(|v| v.value()).collect::<Vec<_>>(),
            [Value::Int32(Some(1))]
        );
    }

    #[tokio::test]
    async fn where_and_where() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.id])
            .where_(employees.salary.greater(100));
        assert_eq!(
            query.and_where(employees.job.eq("engineer")).sql().unwrap(),
            "SELECT id FROM t_employee WHERE salary > ? AND job = ?"
        );
        assert_eq!(
            query.where_(employees.job.eq("engineer")).sql().unwrap(),
            "SELECT id FROM t_employee WHERE job = ?"
        );
        // Queries are immutable
        assert_eq!(
            query.sql().unwrap(),
            "SELECT id FROM t_employee WHERE salary > ?"
        );
    }

    #[tokio::test]
    async fn join() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new().aliased("e");
        let departments = Departments::new().aliased("d");
        let query = database
            .from(&employees.table)
            .left_join(
                &departments.table,
                employees.department_id.eq(&departments.id),
            )
            .select(&[&employees.name, &departments.name.aliased("department")])
            .where_(departments.location.like("Guangzhou%"));
        assert_eq!(
            query.sql().unwrap(),
            "SELECT e.name, d.name AS department FROM t_employee e LEFT JOIN t_department d ON e.department_id = d.id WHERE d.location LIKE ?"
        );

        factory.script(
            "LEFT JOIN",
            [row(
                &["name", "department"],
                [
                    Value::Varchar(Some("penny".into())),
                    Value::Varchar(Some("finance".into())),
                ],
            )],
        );
        let rows = query.rows().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get(&employees.name).unwrap(),
            Some("penny".to_string())
        );
        assert_eq!(
            rows[0]
                .get(&departments.name.aliased("department"))
                .unwrap(),
            Some("finance".to_string())
        );
        assert_eq!(rows[0].get(&employees.job).unwrap(), None);
    }

    #[tokio::test]
    async fn ambiguous_column() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let departments = Departments::new();
        let query = database
            .from(&employees.table)
            .inner_join(
                &departments.table,
                employees.department_id.eq(&departments.id),
            )
            .select(&[&employees.name, &departments.name]);
        assert_eq!(
            query.sql().unwrap(),
            "SELECT t_employee.name, t_department.name FROM t_employee INNER JOIN t_department ON t_employee.department_id = t_department.id"
        );
        factory.script(
            "INNER JOIN",
            [row(
                &["name", "NAME"],
                [
                    Value::Varchar(Some("vince".into())),
                    Value::Varchar(Some("tech".into())),
                ],
            )],
        );
        let rows = query.rows().try_collect::<Vec<_>>().await.unwrap();
        let error = rows[0].get(&employees.name).unwrap_err();
        assert_eq!(
            error.downcast_ref::<SqlError>(),
            Some(&SqlError::AmbiguousColumn {
                name: "name".into(),
                count: 2,
            })
        );
        assert_eq!(
            rows[0].get_value(1).unwrap(),
            &Value::Varchar(Some("tech".into()))
        );
    }

    #[tokio::test]
    async fn aggregates() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let avg_salary = avg(&employees.salary).aliased("avg_salary");
        let query = database
            .from(&employees.table)
            .select(&[&employees.department_id, &avg_salary])
            .group_by(&[&employees.department_id])
            .having(count_all().greater(2))
            .order_by([avg_salary.desc()]);
        assert_eq!(
            query.sql().unwrap(),
            "SELECT department_id, AVG(salary) AS avg_salary FROM t_employee GROUP BY department_id HAVING COUNT(*) > ? ORDER BY avg_salary DESC"
        );

        factory.script(
            "GROUP BY",
            [row(
                &["department_id", "avg_salary"],
                [Value::Int32(Some(1)), Value::Float64(Some(150.5))],
            )],
        );
        let rows = query.rows().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(rows[0].get(&employees.department_id).unwrap(), Some(1));
        assert_eq!(rows[0].get_declared(&avg_salary).unwrap(), Some(150.5));
        assert_eq!(rows[0].get(&avg_salary).unwrap(), Some(150.5));
        let error = rows[0].get(&avg(&employees.salary)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::ColumnNotFound(..))
        ));
    }

    #[tokio::test]
    async fn union() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let departments = Departments::new();
        let names = database
            .from(&employees.table)
            .select(&[&employees.name])
            .union_all(
                &database
                    .from(&departments.table)
                    .select(&[&departments.name]),
            );
        assert_eq!(
            names.sql().unwrap(),
            "SELECT name FROM t_employee UNION ALL SELECT name FROM t_department"
        );
        assert_eq!(
            names.order_by([employees.name.asc()]).sql().unwrap(),
            "SELECT name FROM t_employee UNION ALL SELECT name FROM t_department ORDER BY name ASC"
        );
        assert_eq!(
            names.where_(employees.name.like("v%")).sql().unwrap(),
            "SELECT * FROM (SELECT name FROM t_employee UNION ALL SELECT name FROM t_department) t_union WHERE name LIKE ?"
        );
    }

    #[tokio::test]
    async fn total_records() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.name])
            .where_(employees.salary.greater_eq(50))
            .order_by([employees.salary.desc()])
            .limit(10);
        factory.script("tmp_count", [row(&["count"], [Value::Int64(Some(42))])]);
        assert_eq!(query.total_records().await.unwrap(), 42);
        assert_eq!(
            factory.executed(),
            ["SELECT COUNT(*) FROM (SELECT name FROM t_employee WHERE salary >= ?) tmp_count"]
        );
    }

    #[tokio::test]
    async fn pagination_is_not_standard() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.name])
            .limit(10)
            .offset(5);
        let error = query.sql().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::UnsupportedFeature(..))
        ));
        let error = query.rows().try_collect::<Vec<_>>().await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::UnsupportedFeature(..))
        ));
        assert_eq!(factory.connections_created(), 1);
    }
}
