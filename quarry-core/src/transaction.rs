use crate::{Connection, ConnectionFactory, IsolationLevel, Result, SqlError};
use std::{
    any::Any,
    fmt::{self, Debug, Formatter},
    future::Future,
    sync::{
        Arc, Mutex as StdMutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committing,
    RollingBack,
    Closed,
}

/// A transaction bound to one connection.
///
/// Created and terminated by a [`TransactionManager`]: user code can run
/// statements on its connection but cannot commit, roll back or close it.
/// One statement or result stream uses the connection at a time.
pub struct Transaction<C: Connection> {
    connection: Arc<Mutex<C>>,
    desired_isolation: Option<IsolationLevel>,
    original_isolation: IsolationLevel,
    original_auto_commit: bool,
    state: StdMutex<TransactionState>,
    teardown: Teardown,
}

/// Steps of the connection release already completed. A release interrupted by
/// cancellation resumes from the first missing step.
#[derive(Default)]
struct Teardown {
    begun: AtomicBool,
    isolation_restored: AtomicBool,
    auto_commit_restored: AtomicBool,
    released: AtomicBool,
}

impl<C: Connection> Transaction<C> {
    pub(crate) fn new(connection: C, desired_isolation: Option<IsolationLevel>) -> Self {
        Self {
            original_isolation: connection.transaction_isolation_level(),
            original_auto_commit: connection.is_auto_commit(),
            connection: Arc::new(Mutex::new(connection)),
            desired_isolation,
            state: StdMutex::new(TransactionState::Open),
            teardown: Default::default(),
        }
    }

    /// Apply the isolation, turn auto commit off and begin.
    pub(crate) async fn start(&self) -> Result<()> {
        let mut connection = self.connection.lock().await;
        if let Some(isolation) = self.changed_isolation() {
            connection.set_transaction_isolation_level(isolation).await?;
        }
        if self.original_auto_commit {
            connection.set_auto_commit(false).await?;
        }
        connection.begin_transaction().await?;
        self.teardown.begun.store(true, Ordering::Release);
        Ok(())
    }

    fn changed_isolation(&self) -> Option<IsolationLevel> {
        self.desired_isolation
            .filter(|isolation| *isolation != self.original_isolation)
    }

    /// Lock the connection of this transaction.
    pub async fn connection(&self) -> MutexGuard<'_, C> {
        self.connection.lock().await
    }

    /// The connection of this transaction, unless a statement or a result stream
    /// of the transaction is using it.
    pub(crate) fn try_connection_owned(&self) -> Result<OwnedMutexGuard<C>> {
        self.connection.clone().try_lock_owned().map_err(|_| {
            SqlError::TransactionState(
                "The connection of the transaction is in use, a result stream of this transaction is still open".into(),
            )
            .into()
        })
    }

    pub fn desired_isolation(&self) -> Option<IsolationLevel> {
        self.desired_isolation
    }

    pub fn original_isolation(&self) -> IsolationLevel {
        self.original_isolation
    }

    pub fn original_auto_commit(&self) -> bool {
        self.original_auto_commit
    }

    pub fn state(&self) -> TransactionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: TransactionState, to: TransactionState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return Err(SqlError::TransactionState(format!(
                "Cannot move a transaction from {:?} to {:?}, it is {:?}",
                from, to, *state
            ))
            .into());
        }
        *state = to;
        Ok(())
    }

    pub(crate) async fn commit(&self) -> Result<()> {
        self.transition(TransactionState::Open, TransactionState::Committing)?;
        self.connection.lock().await.commit_transaction().await
    }

    pub(crate) async fn rollback(&self) -> Result<()> {
        self.transition(TransactionState::Open, TransactionState::RollingBack)?;
        self.connection.lock().await.rollback_transaction().await
    }

    fn is_begun(&self) -> bool {
        self.teardown.begun.load(Ordering::Acquire)
    }

    /// Restore the connection settings and close it. Errors are logged and swallowed.
    ///
    /// Each step runs at most once, calling it again after an interruption
    /// completes the remaining ones.
    pub(crate) async fn close(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = TransactionState::Closed;
        let teardown = &self.teardown;
        if teardown.released.load(Ordering::Acquire) {
            return;
        }
        let mut connection = self.connection.lock().await;
        if self.changed_isolation().is_some() && !teardown.isolation_restored.load(Ordering::Acquire)
        {
            if let Err(e) = connection
                .set_transaction_isolation_level(self.original_isolation)
                .await
            {
                log::warn!("Failed to restore the transaction isolation level: {e:#}");
            }
            teardown.isolation_restored.store(true, Ordering::Release);
        }
        if self.original_auto_commit && !teardown.auto_commit_restored.load(Ordering::Acquire) {
            if let Err(e) = connection.set_auto_commit(true).await {
                log::warn!("Failed to restore the auto commit mode: {e:#}");
            }
            teardown.auto_commit_restored.store(true, Ordering::Release);
        }
        if !teardown.released.load(Ordering::Acquire) {
            if let Err(e) = connection.close().await {
                log::warn!("Failed to close the transaction connection: {e:#}");
            }
            teardown.released.store(true, Ordering::Release);
        }
    }
}

impl<C: Connection> Debug for Transaction<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state())
            .field("desired_isolation", &self.desired_isolation)
            .field("original_isolation", &self.original_isolation)
            .field("original_auto_commit", &self.original_auto_commit)
            .finish()
    }
}

/// Opens, binds and terminates transactions.
pub trait TransactionManager: Send + Sync + 'static {
    type Connection: Connection;

    /// Isolation used when `use_transaction` is not given one.
    fn default_isolation(&self) -> Option<IsolationLevel>;

    /// Transaction of this manager bound to the current task scope, if any.
    fn current_transaction(&self) -> Option<Arc<Transaction<Self::Connection>>>;

    /// Open a transaction, run `body` with it bound to the task scope, then commit
    /// when `body` succeeds or roll back when it fails. Fails if a transaction of
    /// this manager is already bound.
    fn use_transaction<T>(
        &self,
        isolation: Option<IsolationLevel>,
        body: impl AsyncFnOnce(Arc<Transaction<Self::Connection>>) -> Result<T>,
    ) -> impl Future<Output = Result<T>>;
}

tokio::task_local! {
    static AMBIENT_TRANSACTIONS: AmbientTransactions;
}

/// Transactions bound to the running task, keyed by manager.
#[derive(Clone, Default)]
struct AmbientTransactions(Vec<(u64, Arc<dyn Any + Send + Sync>)>);

impl AmbientTransactions {
    fn current() -> Self {
        AMBIENT_TRANSACTIONS
            .try_with(|v| v.clone())
            .unwrap_or_default()
    }
    fn find(&self, manager: u64) -> Option<Arc<dyn Any + Send + Sync>> {
        self.0
            .iter()
            .rev()
            .find(|(id, _)| *id == manager)
            .map(|(_, transaction)| transaction.clone())
    }
    fn with(mut self, manager: u64, transaction: Arc<dyn Any + Send + Sync>) -> Self {
        self.0.push((manager, transaction));
        self
    }
}

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// Default transaction manager: the transaction is bound to the scope of the
/// `use_transaction` future through a tokio task local.
///
/// Lookups never block. Tasks spawned from inside the body do not see the
/// transaction, they run on connections of their own.
pub struct TaskTransactionManager<F: ConnectionFactory> {
    id: u64,
    connection_factory: Arc<F>,
    default_isolation: Option<IsolationLevel>,
}

impl<F: ConnectionFactory> TaskTransactionManager<F> {
    pub fn new(connection_factory: Arc<F>, default_isolation: Option<IsolationLevel>) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            connection_factory,
            default_isolation,
        }
    }
}

impl<F: ConnectionFactory> TransactionManager for TaskTransactionManager<F> {
    type Connection = F::Connection;

    fn default_isolation(&self) -> Option<IsolationLevel> {
        self.default_isolation
    }

    fn current_transaction(&self) -> Option<Arc<Transaction<F::Connection>>> {
        AmbientTransactions::current()
            .find(self.id)?
            .downcast::<Transaction<F::Connection>>()
            .ok()
    }

    async fn use_transaction<T>(
        &self,
        isolation: Option<IsolationLevel>,
        body: impl AsyncFnOnce(Arc<Transaction<F::Connection>>) -> Result<T>,
    ) -> Result<T> {
        if self.current_transaction().is_some() {
            return Err(SqlError::TransactionState(
                "There is already a transaction in the current context".into(),
            )
            .into());
        }
        let connection = self.connection_factory.create().await?;
        let transaction = Arc::new(Transaction::new(
            connection,
            isolation.or(self.default_isolation),
        ));
        let guard = TransactionGuard::new(transaction.clone());
        if let Err(error) = transaction.start().await {
            transaction.close().await;
            guard.disarm();
            return Err(error);
        }
        let ambient = AmbientTransactions::current().with(self.id, transaction.clone());
        let result = AMBIENT_TRANSACTIONS
            .scope(ambient, body(transaction.clone()))
            .await;
        let result = match result {
            Ok(value) => transaction.commit().await.map(|_| value),
            Err(error) => {
                if let Err(e) = transaction.rollback().await {
                    log::warn!("Failed to rollback the transaction: {e:#}");
                }
                Err(error)
            }
        };
        transaction.close().await;
        guard.disarm();
        result
    }
}

/// Terminates a transaction whose `use_transaction` future was dropped before
/// completing, from the moment its connection is created. Rolls it back when
/// it was begun and never committed, then finishes the release on the runtime.
struct TransactionGuard<C: Connection> {
    transaction: Option<Arc<Transaction<C>>>,
}

impl<C: Connection> TransactionGuard<C> {
    fn new(transaction: Arc<Transaction<C>>) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }
    fn disarm(mut self) {
        self.transaction = None;
    }
}

impl<C: Connection> Drop for TransactionGuard<C> {
    fn drop(&mut self) {
        let Some(transaction) = self.transaction.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if transaction.is_begun() && transaction.state() == TransactionState::Open {
                        if let Err(e) = transaction.rollback().await {
                            log::error!("Failed to rollback an abandoned transaction: {e:#}");
                        }
                    }
                    transaction.close().await;
                });
            }
            Err(..) => {
                log::error!(
                    "A transaction was abandoned outside of a tokio runtime, its connection cannot be released"
                );
            }
        }
    }
}
