mod resource {
    pub mod company;
}

#[cfg(test)]
mod tests {
    use crate::resource::company::{Departments, Employees};
    use quarry::{ColumnDeclaring, Database, DatabaseDml, Value};
    use quarry_tests::{Event, Failure, MockConnectionFactory, init_logs};
    use time::macros::date;

    async fn database(factory: &MockConnectionFactory) -> Database<MockConnectionFactory> {
        let database = Database::connect(factory.clone())
            .await
            .expect("Could not create the database");
        factory.clear_events();
        database
    }

    fn binds(factory: &MockConnectionFactory) -> Vec<Event> {
        factory
            .events()
            .into_iter()
            .filter(|v| matches!(v, Event::Bind(..)))
            .collect()
    }

    #[tokio::test]
    async fn insert() {
        init_logs();
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let affected = database
            .insert(&employees.table, |v| {
                v.set(&employees.name, "jerry")
                    .set(&employees.hire_date, date!(2024 - 01 - 15))
                    .set(&employees.salary, 50)
                    .set_null(&employees.manager_id);
            })
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            factory.executed(),
            ["INSERT INTO t_employee (name, hire_date, salary, manager_id) VALUES (?, ?, ?, ?)"]
        );
        assert_eq!(
            binds(&factory),
            [
                Event::Bind(0, Value::Varchar(Some("jerry".into()))),
                Event::Bind(1, Value::Date(Some(date!(2024 - 01 - 15)))),
                Event::Bind(2, Value::Int64(Some(50))),
                Event::Bind(3, Value::Int32(None)),
            ]
        );
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn insert_and_generate_key() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let departments = Departments::new();
        let key = database
            .insert_and_generate_key(&departments.table, |v| {
                v.set(&departments.name, "tech")
                    .set(&departments.location, "Guangzhou");
            })
            .await
            .unwrap();
        assert_eq!(key, Some(Value::Int64(Some(1))));
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::CreateStatement(
                    "INSERT INTO t_department (name, location) VALUES (?, ?)".into()
                ),
                Event::Bind(0, Value::Varchar(Some("tech".into()))),
                Event::Bind(1, Value::Varchar(Some("Guangzhou".into()))),
                Event::ReturnGeneratedValues,
                Event::Execute("INSERT INTO t_department (name, location) VALUES (?, ?)".into()),
                Event::Close,
            ]
        );
    }

    #[tokio::test]
    async fn update() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new().aliased("e");
        let affected = database
            .update(&employees.table, |v| {
                v.set(&employees.salary, employees.salary.plus(100))
                    .set(&employees.job, "lead");
                v.where_(employees.id.eq(7))
                    .where_(employees.department_id.not_eq(2));
            })
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            factory.executed(),
            ["UPDATE t_employee SET salary = salary + ?, job = ? WHERE id = ? AND department_id <> ?"]
        );
        assert_eq!(
            binds(&factory),
            [
                Event::Bind(0, Value::Int64(Some(100))),
                Event::Bind(1, Value::Varchar(Some("lead".into()))),
                Event::Bind(2, Value::Int32(Some(7))),
                Event::Bind(3, Value::Int32(Some(2))),
            ]
        );
    }

    #[tokio::test]
    async fn delete() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        database
            .delete(
                &employees.table,
                employees.salary.less(10).or(employees.job.is_null()),
            )
            .await
            .unwrap();
        database.delete_all(&employees.table).await.unwrap();
        assert_eq!(
            factory.executed(),
            [
                "DELETE FROM t_employee WHERE salary < ? OR job IS NULL",
                "DELETE FROM t_employee",
            ]
        );
        assert_eq!(factory.connections_created(), 3);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn driver_error_is_translated() {
        let factory = MockConnectionFactory::new();
        let database = Database::builder(factory.clone())
            .exception_translator(|e| e.context("Translated"))
            .connect()
            .await
            .unwrap();
        let employees = Employees::new();
        factory.fail(Failure::Execute("DELETE".into()));
        let error = database
            .delete(&employees.table, employees.id.eq(1))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Translated");
        assert_eq!(factory.open_connections(), 0);
    }
}
