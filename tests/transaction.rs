mod resource {
    pub mod company;
}

#[cfg(test)]
mod tests {
    use crate::resource::company::Employees;
    use quarry::{
        ColumnDeclaring, Database, DatabaseDml, DatabaseExt, Error, IsolationLevel, QueryResult,
        Result, Row, SqlError, Transaction, TransactionManager, TransactionState, Value,
        stream::TryStreamExt,
    };
    use quarry_tests::{Event, Failure, MockConnection, MockConnectionFactory, init_logs};
    use std::{
        pin::pin,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::{sync::Barrier, task::JoinHandle};

    async fn database(factory: &MockConnectionFactory) -> Database<MockConnectionFactory> {
        let database = Database::connect(factory.clone())
            .await
            .expect("Could not create the database");
        factory.clear_events();
        database
    }

    async fn wait_closed(factory: &MockConnectionFactory) {
        for _ in 0..100 {
            if factory.open_connections() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn row(id: i32) -> QueryResult {
        QueryResult::Row(Row::new(
            ["id".to_string()].into(),
            [Value::Int32(Some(id))].into(),
        ))
    }

    fn spawn_transaction(
        database: Arc<Database<MockConnectionFactory>>,
        barrier: Arc<Barrier>,
    ) -> JoinHandle<Result<(Arc<Transaction<MockConnection>>, usize)>> {
        tokio::spawn(async move {
            database
                .use_transaction(None, async |transaction| {
                    // Both transactions are open at this point
                    barrier.wait().await;
                    let id = database.use_connection(async |c| Ok(c.id())).await?;
                    Ok((transaction, id))
                })
                .await
        })
    }

    #[tokio::test]
    async fn nested_transactions_share_one() {
        init_logs();
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        database
            .use_transaction(None, async |outer| {
                database
                    .use_transaction(None, async |inner| {
                        assert!(Arc::ptr_eq(&outer, &inner));
                        database
                            .delete(&employees.table, employees.id.eq(1))
                            .await
                    })
                    .await?;
                database
                    .use_transaction(Some(IsolationLevel::Serializable), async |inner| {
                        assert!(Arc::ptr_eq(&outer, &inner));
                        database.delete_all(&employees.table).await
                    })
                    .await
            })
            .await
            .unwrap();
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::SetAutoCommit(false),
                Event::Begin,
                Event::CreateStatement("DELETE FROM t_employee WHERE id = ?".into()),
                Event::Bind(0, Value::Int32(Some(1))),
                Event::Execute("DELETE FROM t_employee WHERE id = ?".into()),
                Event::CreateStatement("DELETE FROM t_employee".into()),
                Event::Execute("DELETE FROM t_employee".into()),
                Event::Commit,
                Event::SetAutoCommit(true),
                Event::Close,
            ]
        );
        // Every call went through the connection of the transaction
        assert!(factory.recorded().iter().all(|(id, _)| *id == 2));
    }

    #[tokio::test]
    async fn sequential_transactions() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        for _ in 0..2 {
            database
                .use_transaction(None, async |transaction| {
                    assert_eq!(transaction.state(), TransactionState::Open);
                    Ok(())
                })
                .await
                .unwrap();
        }
        let expected = [
            Event::Create,
            Event::SetAutoCommit(false),
            Event::Begin,
            Event::Commit,
            Event::SetAutoCommit(true),
            Event::Close,
        ];
        assert_eq!(factory.events_of(2), expected);
        assert_eq!(factory.events_of(3), expected);
        assert_eq!(factory.count(|v| *v == Event::Begin), 2);
        assert_eq!(factory.count(|v| *v == Event::Commit), 2);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn rollback_on_error() {
        let factory = MockConnectionFactory::new().with_isolation(IsolationLevel::ReadCommitted);
        let database = database(&factory).await;
        let employees = Employees::new();
        let result: Result<()> = database
            .use_transaction(Some(IsolationLevel::Serializable), async |_| {
                database.delete_all(&employees.table).await?;
                Err(Error::msg("Boom"))
            })
            .await;
        assert_eq!(result.unwrap_err().to_string(), "Boom");
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::SetIsolation(IsolationLevel::Serializable),
                Event::SetAutoCommit(false),
                Event::Begin,
                Event::CreateStatement("DELETE FROM t_employee".into()),
                Event::Execute("DELETE FROM t_employee".into()),
                Event::Rollback,
                Event::SetIsolation(IsolationLevel::ReadCommitted),
                Event::SetAutoCommit(true),
                Event::Close,
            ]
        );
    }

    #[tokio::test]
    async fn settings_left_alone_when_unchanged() {
        let factory = MockConnectionFactory::new()
            .with_auto_commit(false)
            .with_isolation(IsolationLevel::Serializable);
        let database = database(&factory).await;
        let transaction = database
            .use_transaction(Some(IsolationLevel::Serializable), async |transaction| {
                Ok(transaction)
            })
            .await
            .unwrap();
        assert_eq!(
            factory.events(),
            [Event::Create, Event::Begin, Event::Commit, Event::Close]
        );
        assert_eq!(transaction.state(), TransactionState::Closed);
        assert!(!transaction.original_auto_commit());
        assert_eq!(transaction.original_isolation(), IsolationLevel::Serializable);
    }

    #[tokio::test]
    async fn default_isolation() {
        let factory = MockConnectionFactory::new();
        let database = Database::builder(factory.clone())
            .default_isolation(IsolationLevel::RepeatableRead)
            .connect()
            .await
            .unwrap();
        factory.clear_events();
        database
            .use_transaction(None, async |transaction| {
                assert_eq!(
                    transaction.desired_isolation(),
                    Some(IsolationLevel::RepeatableRead)
                );
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(
            factory.count(|v| *v == Event::SetIsolation(IsolationLevel::RepeatableRead)),
            1
        );
        assert_eq!(
            factory.count(|v| *v == Event::SetIsolation(IsolationLevel::ReadCommitted)),
            1
        );
    }

    #[tokio::test]
    async fn manager_rejects_second_transaction() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let result: Result<()> = database
            .use_transaction(None, async |_| {
                database
                    .transaction_manager()
                    .use_transaction(None, async |_| Ok(()))
                    .await
            })
            .await;
        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::TransactionState(..))
        ));
        assert_eq!(factory.count(|v| *v == Event::Create), 1);
        assert_eq!(factory.count(|v| *v == Event::Rollback), 1);
        assert_eq!(factory.count(|v| *v == Event::Commit), 0);
    }

    #[tokio::test]
    async fn begin_failure_closes_the_connection() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        factory.fail(Failure::Begin);
        let mut executed = false;
        let result = database
            .use_transaction(None, async |_| {
                executed = true;
                Ok(())
            })
            .await;
        assert!(result.is_err());
        assert!(!executed);
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::SetAutoCommit(false),
                Event::Begin,
                Event::SetAutoCommit(true),
                Event::Close,
            ]
        );
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn commit_failure_is_reported() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        factory.fail(Failure::Commit);
        let result = database.use_transaction(None, async |_| Ok(5)).await;
        assert!(result.is_err());
        assert_eq!(factory.count(|v| *v == Event::Rollback), 0);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn error_translated_once() {
        let factory = MockConnectionFactory::new();
        let translations = Arc::new(AtomicUsize::new(0));
        let database = Database::builder(factory.clone())
            .exception_translator({
                let translations = translations.clone();
                move |e| {
                    translations.fetch_add(1, Ordering::Relaxed);
                    e.context("Translated")
                }
            })
            .connect()
            .await
            .unwrap();
        let employees = Employees::new();
        factory.fail(Failure::Execute("DELETE".into()));
        let result = database
            .use_transaction(None, async |_| {
                database
                    .use_transaction(None, async |_| database.delete_all(&employees.table).await)
                    .await
            })
            .await;
        let error = result.unwrap_err();
        assert_eq!(translations.load(Ordering::Relaxed), 1);
        assert_eq!(
            format!("{:#}", error),
            "Translated: Mock driver failure executing: DELETE FROM t_employee"
        );
    }

    #[tokio::test]
    async fn body_error_reaches_the_translator() {
        let factory = MockConnectionFactory::new();
        let database = Database::builder(factory.clone())
            .exception_translator(|e| match e.downcast_ref::<std::io::Error>() {
                Some(..) => e,
                None => e.context("Translated"),
            })
            .connect()
            .await
            .unwrap();
        let result: Result<()> = database
            .use_transaction(None, async |_| Err(Error::msg("Boom")))
            .await;
        assert_eq!(format!("{:#}", result.unwrap_err()), "Translated: Boom");
        let result: Result<()> = database
            .use_transaction(None, async |_| {
                Err(std::io::Error::other("Disk full").into())
            })
            .await;
        assert_eq!(format!("{:#}", result.unwrap_err()), "Disk full");
        assert_eq!(factory.count(|v| *v == Event::Rollback), 2);
    }

    #[tokio::test]
    async fn connection_of_the_transaction() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        assert!(database.transaction_manager().current_transaction().is_none());
        let (outside, inside) = database
            .use_transaction(None, async |_| {
                assert!(database.transaction_manager().current_transaction().is_some());
                let inside = database.use_connection(async |c| Ok(c.id())).await?;
                Ok((factory.connections_created(), inside))
            })
            .await
            .unwrap();
        assert_eq!(outside, 2);
        assert_eq!(inside, 2);
        assert!(database.transaction_manager().current_transaction().is_none());
        let id = database.use_connection(async |c| Ok(c.id())).await.unwrap();
        assert_eq!(id, 3);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn abandoned_transaction_is_rolled_back() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let body = database.use_transaction(None, async |_| {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(20), body)
                .await
                .is_err()
        );
        wait_closed(&factory).await;
        assert_eq!(factory.open_connections(), 0);
        assert_eq!(factory.count(|v| *v == Event::Rollback), 1);
        assert_eq!(factory.count(|v| *v == Event::Commit), 0);
    }

    #[tokio::test]
    async fn cancelled_while_beginning() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        factory.delay(Event::Begin, Duration::from_millis(200));
        let mut executed = false;
        let body = database.use_transaction(None, async |_| {
            executed = true;
            Ok(())
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(20), body)
                .await
                .is_err()
        );
        assert!(!executed);
        wait_closed(&factory).await;
        assert_eq!(factory.open_connections(), 0);
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::SetAutoCommit(false),
                Event::SetAutoCommit(true),
                Event::Close,
            ]
        );
    }

    #[tokio::test]
    async fn cancelled_while_closing() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        factory.delay(Event::Close, Duration::from_millis(100));
        let body = database.use_transaction(None, async |_| Ok(()));
        assert!(
            tokio::time::timeout(Duration::from_millis(20), body)
                .await
                .is_err()
        );
        wait_closed(&factory).await;
        assert_eq!(factory.open_connections(), 0);
        assert_eq!(
            factory.events(),
            [
                Event::Create,
                Event::SetAutoCommit(false),
                Event::Begin,
                Event::Commit,
                Event::SetAutoCommit(true),
                Event::Close,
            ]
        );
    }

    #[tokio::test]
    async fn statement_while_rows_are_streamed() {
        let factory = MockConnectionFactory::new();
        let database = database(&factory).await;
        let employees = Employees::new();
        let query = database
            .from(&employees.table)
            .select(&[&employees.id]);
        factory.script("SELECT id FROM t_employee", [row(1), row(2)]);

        let result: Result<()> = database
            .use_transaction(None, async |_| {
                let mut rows = pin!(query.rows());
                while let Some(row) = rows.try_next().await? {
                    let id = row.get(&employees.id)?.unwrap_or_default();
                    database
                        .delete(&employees.table, employees.id.eq(id))
                        .await?;
                }
                Ok(())
            })
            .await;
        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<SqlError>(),
            Some(SqlError::TransactionState(..))
        ));
        assert_eq!(factory.count(|v| *v == Event::Rollback), 1);
        assert!(factory.executed().iter().all(|v| !v.starts_with("DELETE")));
        assert_eq!(factory.open_connections(), 0);

        // Reading every row first releases the connection
        let deleted = database
            .use_transaction(None, async |_| {
                let rows = query.rows().try_collect::<Vec<_>>().await?;
                let mut deleted = 0;
                for row in rows {
                    let id = row.get(&employees.id)?.unwrap_or_default();
                    deleted += database
                        .delete(&employees.table, employees.id.eq(id))
                        .await?;
                }
                Ok(deleted)
            })
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(factory.count(|v| *v == Event::Commit), 1);
    }

    #[tokio::test]
    async fn concurrent_tasks_use_separate_transactions() {
        let factory = MockConnectionFactory::new();
        let database = Arc::new(database(&factory).await);
        let barrier = Arc::new(Barrier::new(2));
        let (first, second) = tokio::join!(
            spawn_transaction(database.clone(), barrier.clone()),
            spawn_transaction(database.clone(), barrier.clone()),
        );
        let (first, first_connection) = first.unwrap().unwrap();
        let (second, second_connection) = second.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first_connection, second_connection);
        let expected = [
            Event::Create,
            Event::SetAutoCommit(false),
            Event::Begin,
            Event::Commit,
            Event::SetAutoCommit(true),
            Event::Close,
        ];
        assert_eq!(factory.events_of(first_connection), expected);
        assert_eq!(factory.events_of(second_connection), expected);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn spawned_task_runs_outside_the_transaction() {
        let factory = MockConnectionFactory::new();
        let database = Arc::new(database(&factory).await);
        let (inside, spawned) = database
            .use_transaction(None, async |_| {
                let inside = database.use_connection(async |c| Ok(c.id())).await?;
                let spawned = tokio::spawn({
                    let database = database.clone();
                    async move {
                        assert!(database.transaction_manager().current_transaction().is_none());
                        database.use_connection(async |c| Ok(c.id())).await
                    }
                })
                .await??;
                Ok((inside, spawned))
            })
            .await
            .unwrap();
        assert_eq!(inside, 2);
        assert_eq!(spawned, 3);
        assert_eq!(factory.events_of(3), [Event::Create, Event::Close]);
        assert_eq!(factory.count(|v| *v == Event::Begin), 1);
        assert_eq!(factory.open_connections(), 0);
    }
}
