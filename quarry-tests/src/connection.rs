use crate::{
    MockStatement,
    state::{Event, Failure, MockState},
};
use quarry_core::{Connection, ConnectionMetadata, IsolationLevel, Result};
use std::sync::Arc;

pub struct MockConnection {
    id: usize,
    state: Arc<MockState>,
    auto_commit: bool,
    isolation: IsolationLevel,
    closed: bool,
}

impl MockConnection {
    pub(crate) fn new(
        id: usize,
        state: Arc<MockState>,
        auto_commit: bool,
        isolation: IsolationLevel,
    ) -> Self {
        Self {
            id,
            state,
            auto_commit,
            isolation,
            closed: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn call(&self, event: Event, failure: Failure) -> Result<()> {
        let delay = self.state.lock().delay_for(&event);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        state.record(self.id, event);
        state.check(failure)
    }
}

impl Connection for MockConnection {
    type Statement = MockStatement;

    fn metadata(&self) -> ConnectionMetadata {
        ConnectionMetadata {
            product_name: "MockDB".into(),
            product_version: "1.0.0".into(),
        }
    }

    fn create_statement(&mut self, sql: &str) -> Result<MockStatement> {
        self.state
            .lock()
            .record(self.id, Event::CreateStatement(sql.into()));
        Ok(MockStatement::new(self.id, sql.into(), self.state.clone()))
    }

    fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.call(Event::SetAutoCommit(auto_commit), Failure::SetAutoCommit).await?;
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn transaction_isolation_level(&self) -> IsolationLevel {
        self.isolation
    }

    async fn set_transaction_isolation_level(&mut self, level: IsolationLevel) -> Result<()> {
        self.call(Event::SetIsolation(level), Failure::SetIsolation).await?;
        self.isolation = level;
        Ok(())
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        self.call(Event::Begin, Failure::Begin).await
    }

    async fn commit_transaction(&mut self) -> Result<()> {
        self.call(Event::Commit, Failure::Commit).await
    }

    async fn rollback_transaction(&mut self) -> Result<()> {
        self.call(Event::Rollback, Failure::Rollback).await
    }

    async fn close(&mut self) -> Result<()> {
        self.call(Event::Close, Failure::Close).await?;
        self.closed = true;
        self.state.lock().open.remove(&self.id);
        Ok(())
    }
}
