use crate::{QueryResult, Result, Value, stream::Stream};
use std::{
    fmt::{self, Display, Formatter},
    future::Future,
};

/// Transaction isolation levels understood by the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl Display for IsolationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Product information reported by a live connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionMetadata {
    pub product_name: String,
    pub product_version: String,
}

/// Parameter binding sink.
///
/// Indexes start from 0. A SQL NULL is bound as a typed null (`Value::Int32(None)`
/// and so on) so that the driver knows the parameter type.
pub trait Bind {
    fn bind(&mut self, index: usize, value: Value) -> Result<()>;
}

/// A statement created from SQL text by a [`Connection`].
///
/// Binding semantics follow the usual batch protocol: bind the parameters of an
/// item, call [`Statement::add`] to save them and start the next item. Parameters
/// bound after the last `add` form one more item.
pub trait Statement: Bind + Send + 'static {
    fn add(&mut self) -> Result<()>;
    /// Ask the driver to emit generated values (keys) as rows after the update count.
    /// An empty list means the driver decides which columns to return.
    fn return_generated_values(&mut self, columns: &[&str]) -> Result<()>;
    /// Execute and stream the results: one `Affected` per executed item, rows for queries.
    fn execute(self) -> impl Stream<Item = Result<QueryResult>> + Send + 'static;
}

/// A single live connection to the database.
pub trait Connection: Send + 'static {
    type Statement: Statement;

    fn metadata(&self) -> ConnectionMetadata;

    fn create_statement(&mut self, sql: &str) -> Result<Self::Statement>;

    fn is_auto_commit(&self) -> bool;

    fn set_auto_commit(&mut self, auto_commit: bool) -> impl Future<Output = Result<()>> + Send;

    fn transaction_isolation_level(&self) -> IsolationLevel;

    fn set_transaction_isolation_level(
        &mut self,
        level: IsolationLevel,
    ) -> impl Future<Output = Result<()>> + Send;

    fn begin_transaction(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn commit_transaction(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn rollback_transaction(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Source of new connections, usually a driver configured with a URL.
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: Connection;

    fn create(&self) -> impl Future<Output = Result<Self::Connection>> + Send;
}
