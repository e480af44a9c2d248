use crate::{
    ArgumentBinding, Bind, Connection, ConnectionFactory, DatabaseMetadata, Dialect, Error,
    Expression, FormatterSettings, IsolationLevel, QueryResult, Result, Row, RowsAffected,
    SqlError, SqlFormatter, Statement, TaskTransactionManager, Transaction, TransactionManager,
    detect_dialect_implementation,
    future,
    stream::{BoxStream, Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use async_stream::try_stream;
use std::{
    fmt::{self, Debug, Formatter},
    ops::{Deref, DerefMut},
    pin::pin,
    sync::Arc,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Rewrites errors leaving the outermost connection or transaction scope.
///
/// Every error other than a [`SqlError`] goes through it: driver failures, and
/// also the errors returned by the caller's own `use_connection` or
/// `use_transaction` body, since both reach the scope as the same [`Error`]. A
/// translator meant for driver errors only should pass the others through,
/// checking them with `downcast_ref`.
pub type ExceptionTranslator = Arc<dyn Fn(Error) -> Error + Send + Sync>;

/// Entry point: owns the connection factory, the transaction manager and the
/// dialect formatter, and executes expressions.
///
/// Immutable once created, share it behind an `Arc` or a reference.
pub struct Database<F: ConnectionFactory, M = TaskTransactionManager<F>>
where
    M: TransactionManager<Connection = F::Connection>,
{
    connection_factory: Arc<F>,
    transaction_manager: M,
    dialect: Arc<dyn Dialect>,
    metadata: Arc<DatabaseMetadata>,
    formatter: Box<dyn SqlFormatter>,
    exception_translator: Option<ExceptionTranslator>,
}

impl<F: ConnectionFactory> Database<F, TaskTransactionManager<F>> {
    /// Connect with the default configuration.
    pub async fn connect(connection_factory: F) -> Result<Self> {
        Self::builder(connection_factory).connect().await
    }

    pub fn builder(connection_factory: F) -> DatabaseBuilder<F, TaskTransactionManager<F>> {
        let connection_factory = Arc::new(connection_factory);
        DatabaseBuilder {
            transaction_manager: TaskTransactionManager::new(connection_factory.clone(), None),
            connection_factory,
            dialect: None,
            exception_translator: None,
            always_quote_identifiers: false,
            generate_sql_in_upper_case: None,
        }
    }
}

impl<F, M> Database<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn metadata(&self) -> &Arc<DatabaseMetadata> {
        &self.metadata
    }

    pub fn transaction_manager(&self) -> &M {
        &self.transaction_manager
    }

    pub fn connection_factory(&self) -> &Arc<F> {
        &self.connection_factory
    }

    /// Render an expression with the compact formatter.
    pub fn format(&self, expression: &Expression) -> Result<(String, Vec<ArgumentBinding>)> {
        self.formatter.format(expression)
    }

    /// Render an expression with a formatter created for the given layout.
    pub fn format_expression(
        &self,
        expression: &Expression,
        beautify: bool,
        indent_size: usize,
    ) -> Result<(String, Vec<ArgumentBinding>)> {
        self.dialect
            .create_sql_formatter(FormatterSettings {
                metadata: self.metadata.clone(),
                beautify,
                indent_size,
            })
            .format(expression)
    }

    /// Apply the exception translator, errors raised by quarry itself are left
    /// untouched. See [`ExceptionTranslator`] for what else it receives.
    pub fn translate(&self, error: Error) -> Error {
        match &self.exception_translator {
            Some(translator) if error.downcast_ref::<SqlError>().is_none() => translator(error),
            _ => error,
        }
    }

    fn is_outermost(&self) -> bool {
        self.transaction_manager.current_transaction().is_none()
    }

    /// The connection of the ambient transaction, or a new connection.
    ///
    /// Fails with [`SqlError::TransactionState`] when the transaction connection
    /// is still held, by an open result stream for example.
    pub async fn acquire_connection(&self) -> Result<ConnectionLease<F::Connection>> {
        match self.transaction_manager.current_transaction() {
            Some(transaction) => Ok(ConnectionLease {
                guard: transaction.try_connection_owned()?,
                owned: false,
                released: false,
            }),
            None => {
                let connection = self.connection_factory.create().await?;
                Ok(ConnectionLease {
                    guard: Arc::new(Mutex::new(connection)).try_lock_owned()?,
                    owned: true,
                    released: false,
                })
            }
        }
    }

    /// Run `body` with a connection. Inside a transaction it is the transaction
    /// connection, otherwise a new connection closed when `body` completes.
    pub async fn use_connection<T>(
        &self,
        body: impl AsyncFnOnce(&mut F::Connection) -> Result<T>,
    ) -> Result<T> {
        let outermost = self.is_outermost();
        let result = async {
            let mut lease = self.acquire_connection().await?;
            let result = body(&mut *lease).await;
            let released = lease.release().await;
            let value = result?;
            released?;
            Ok(value)
        }
        .await;
        match outermost {
            true => result.map_err(|e| self.translate(e)),
            false => result,
        }
    }

    /// Run `body` in a transaction: the ambient one if present, otherwise a new one
    /// committed when `body` succeeds and rolled back when it fails.
    pub async fn use_transaction<T>(
        &self,
        isolation: Option<IsolationLevel>,
        body: impl AsyncFnOnce(Arc<Transaction<F::Connection>>) -> Result<T>,
    ) -> Result<T> {
        if let Some(transaction) = self.transaction_manager.current_transaction() {
            return body(transaction).await;
        }
        self.transaction_manager
            .use_transaction(isolation, body)
            .await
            .map_err(|e| self.translate(e))
    }

    /// Format and execute an expression, `body` receives the result stream.
    pub async fn execute_expression<T>(
        &self,
        expression: &Expression,
        body: impl AsyncFnOnce(BoxStream<'static, Result<QueryResult>>) -> Result<T>,
    ) -> Result<T> {
        let (sql, arguments) = self.format(expression)?;
        log_statement(&sql, &arguments);
        self.use_connection(async move |connection| {
            let mut statement = connection.create_statement(&sql)?;
            bind_arguments(&mut statement, &arguments)?;
            body(statement.execute().boxed()).await
        })
        .await
    }

    /// Execute an INSERT, UPDATE or DELETE and return the number of affected rows.
    pub async fn execute_update(&self, expression: &Expression) -> Result<u64> {
        let affected = self
            .execute_expression(expression, async |results| {
                results
                    .try_filter_map(|v| {
                        future::ready(Ok(match v {
                            QueryResult::Affected(v) => Some(v),
                            QueryResult::Row(..) => None,
                        }))
                    })
                    .try_collect::<RowsAffected>()
                    .await
            })
            .await?;
        log::debug!("Effects: {}", affected.rows_affected);
        Ok(affected.rows_affected)
    }

    /// Lazily execute a query. Nothing happens until the stream is polled, the
    /// connection is held until the stream completes or is dropped.
    ///
    /// Inside a transaction the stream holds the transaction connection: other
    /// statements of the same transaction fail until it is exhausted or dropped.
    pub fn execute_query<'a>(
        &'a self,
        expression: &'a Expression,
    ) -> impl Stream<Item = Result<Row>> + Send + 'a {
        let outermost = self.is_outermost();
        try_stream! {
            let (sql, arguments) = self.format(expression)?;
            log_statement(&sql, &arguments);
            let mut lease = self.acquire_connection().await?;
            let mut statement = lease.create_statement(&sql)?;
            bind_arguments(&mut statement, &arguments)?;
            {
                let mut results = pin!(statement.execute());
                while let Some(result) = results.next().await.transpose()? {
                    if let QueryResult::Row(row) = result {
                        yield row;
                    }
                }
            }
            lease.release().await?;
        }
        .map_err(move |e: Error| match outermost {
            true => self.translate(e),
            false => e,
        })
    }

    /// Execute many statements sharing the same SQL text in a single round trip.
    /// Returns the affected rows of each item, in order.
    pub async fn execute_batch(&self, expressions: &[Expression]) -> Result<Vec<u64>> {
        let Some(first) = expressions.first() else {
            return Ok(Vec::new());
        };
        let (sql, arguments) = self.format(first)?;
        let mut items = Vec::with_capacity(expressions.len());
        items.push(arguments);
        for expression in &expressions[1..] {
            let (item_sql, arguments) = self.format(expression)?;
            if item_sql != sql {
                return Err(SqlError::BatchStructureMismatch {
                    sql: truncate_long!(item_sql).into_owned(),
                }
                .into());
            }
            items.push(arguments);
        }
        log::debug!("SQL: {}", sql);
        for arguments in &items {
            log_arguments(arguments);
        }
        let expected = items.len();
        let counts = self
            .use_connection(async |connection| {
                let mut statement = connection.create_statement(&sql)?;
                for arguments in &items {
                    bind_arguments(&mut statement, arguments)?;
                    statement.add()?;
                }
                statement
                    .execute()
                    .try_filter_map(|v| {
                        future::ready(Ok(match v {
                            QueryResult::Affected(v) => Some(v.rows_affected),
                            QueryResult::Row(..) => None,
                        }))
                    })
                    .try_collect::<Vec<_>>()
                    .await
            })
            .await?;
        if counts.len() != expected {
            return Err(SqlError::BatchSizeMismatch {
                expected,
                actual: counts.len(),
            }
            .into());
        }
        log::debug!("Effects: {:?}", counts);
        Ok(counts)
    }

    /// Execute an update asking the driver for the generated keys.
    ///
    /// Returns the affected rows and a stream of the generated key rows. The
    /// stream holds the connection until it completes or is dropped.
    pub async fn execute_update_and_retrieve_keys(
        &self,
        expression: &Expression,
    ) -> Result<(u64, BoxStream<'static, Result<Row>>)> {
        let outermost = self.is_outermost();
        let result = async {
            let (sql, arguments) = self.format(expression)?;
            log_statement(&sql, &arguments);
            let mut lease = self.acquire_connection().await?;
            let mut statement = lease.create_statement(&sql)?;
            bind_arguments(&mut statement, &arguments)?;
            statement.return_generated_values(&[])?;
            let mut results = statement.execute().boxed();
            let mut buffered = Vec::new();
            let mut affected = 0;
            while let Some(result) = results.next().await.transpose()? {
                match result {
                    QueryResult::Affected(v) => {
                        affected = v.rows_affected;
                        break;
                    }
                    QueryResult::Row(row) => buffered.push(row),
                }
            }
            log::debug!("Effects: {}", affected);
            let keys: BoxStream<'static, Result<Row>> = Box::pin(try_stream! {
                for row in buffered {
                    yield row;
                }
                while let Some(result) = results.next().await.transpose()? {
                    if let QueryResult::Row(row) = result {
                        yield row;
                    }
                }
                lease.release().await?;
            });
            Ok((affected, keys))
        }
        .await;
        match outermost {
            true => result.map_err(|e| self.translate(e)),
            false => result,
        }
    }
}

impl<F, M> Debug for Database<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.name())
            .field("product_name", &self.metadata.product_name)
            .field("product_version", &self.metadata.product_version)
            .finish()
    }
}

/// Configures and connects a [`Database`].
pub struct DatabaseBuilder<F: ConnectionFactory, M> {
    connection_factory: Arc<F>,
    transaction_manager: M,
    dialect: Option<Arc<dyn Dialect>>,
    exception_translator: Option<ExceptionTranslator>,
    always_quote_identifiers: bool,
    generate_sql_in_upper_case: Option<bool>,
}

impl<F: ConnectionFactory> DatabaseBuilder<F, TaskTransactionManager<F>> {
    /// Isolation of the transactions opened without an explicit one.
    pub fn default_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.transaction_manager =
            TaskTransactionManager::new(self.connection_factory.clone(), Some(isolation));
        self
    }
}

impl<F, M> DatabaseBuilder<F, M>
where
    F: ConnectionFactory,
    M: TransactionManager<Connection = F::Connection>,
{
    /// Use this dialect instead of the registered one.
    pub fn dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn transaction_manager<N>(self, transaction_manager: N) -> DatabaseBuilder<F, N>
    where
        N: TransactionManager<Connection = F::Connection>,
    {
        DatabaseBuilder {
            connection_factory: self.connection_factory,
            transaction_manager,
            dialect: self.dialect,
            exception_translator: self.exception_translator,
            always_quote_identifiers: self.always_quote_identifiers,
            generate_sql_in_upper_case: self.generate_sql_in_upper_case,
        }
    }

    pub fn exception_translator(
        mut self,
        translator: impl Fn(Error) -> Error + Send + Sync + 'static,
    ) -> Self {
        self.exception_translator = Some(Arc::new(translator));
        self
    }

    pub fn always_quote_identifiers(mut self, always_quote_identifiers: bool) -> Self {
        self.always_quote_identifiers = always_quote_identifiers;
        self
    }

    /// `None` lets the dialect decide the keyword case.
    pub fn generate_sql_in_upper_case(mut self, upper_case: Option<bool>) -> Self {
        self.generate_sql_in_upper_case = upper_case;
        self
    }

    /// Resolve the dialect, read the database metadata from a first connection and
    /// create the database.
    pub async fn connect(self) -> Result<Database<F, M>> {
        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => detect_dialect_implementation()?,
        };
        let mut connection = self.connection_factory.create().await?;
        let connection_metadata = connection.metadata();
        if let Err(e) = connection.close().await {
            log::warn!("Failed to close the connection used to read the metadata: {e:#}");
        }
        let metadata = Arc::new(
            DatabaseMetadata::new(dialect.as_ref())
                .with_connection_metadata(connection_metadata)
                .with_always_quote_identifiers(self.always_quote_identifiers)
                .with_generate_sql_in_upper_case(self.generate_sql_in_upper_case),
        );
        log::info!(
            "Connected to database: {} {}, dialect: {}",
            metadata.product_name,
            metadata.product_version,
            dialect.name()
        );
        let formatter = dialect.create_sql_formatter(FormatterSettings {
            metadata: metadata.clone(),
            beautify: false,
            indent_size: 2,
        });
        Ok(Database {
            connection_factory: self.connection_factory,
            transaction_manager: self.transaction_manager,
            dialect,
            metadata,
            formatter,
            exception_translator: self.exception_translator,
        })
    }
}

/// A connection checked out by [`Database::acquire_connection`].
///
/// Either the locked connection of the ambient transaction or a connection owned
/// by the lease. Call [`ConnectionLease::release`] when done, an owned connection
/// dropped without it is closed on the runtime.
pub struct ConnectionLease<C: Connection> {
    guard: OwnedMutexGuard<C>,
    owned: bool,
    released: bool,
}

impl<C: Connection> ConnectionLease<C> {
    /// Whether the connection belongs to the ambient transaction.
    pub fn is_transactional(&self) -> bool {
        !self.owned
    }

    /// Give the connection back, closing it when it is owned.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        if self.owned {
            self.guard.close().await?;
        }
        Ok(())
    }
}

impl<C: Connection> Deref for ConnectionLease<C> {
    type Target = C;
    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<C: Connection> DerefMut for ConnectionLease<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl<C: Connection> Drop for ConnectionLease<C> {
    fn drop(&mut self) {
        if !self.owned || self.released {
            return;
        }
        let connection = OwnedMutexGuard::mutex(&self.guard).clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = connection.lock().await.close().await {
                        log::error!("Failed to close an abandoned connection: {e:#}");
                    }
                });
            }
            Err(..) => {
                log::error!("A connection was abandoned outside of a tokio runtime, it cannot be closed");
            }
        }
    }
}

fn bind_arguments(statement: &mut impl Bind, arguments: &[ArgumentBinding]) -> Result<()> {
    for (index, argument) in arguments.iter().enumerate() {
        argument.bind(statement, index)?;
    }
    Ok(())
}

fn log_arguments(arguments: &[ArgumentBinding]) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "Parameters: [{}]",
            arguments
                .iter()
                .map(|v| format!("{v:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}

fn log_statement(sql: &str, arguments: &[ArgumentBinding]) {
    log::debug!("SQL: {}", sql);
    log_arguments(arguments);
}
