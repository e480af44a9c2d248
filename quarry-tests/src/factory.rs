use crate::{
    MockConnection,
    state::{Event, Failure, MockState},
};
use quarry_core::{ConnectionFactory, IsolationLevel, QueryResult, Result};
use std::{sync::Arc, time::Duration};

/// In memory driver for tests.
///
/// Every call made on the connections and statements it creates is recorded, in
/// order, together with the id of the connection it was made on. Results are
/// scripted by SQL text, unscripted statements return no rows for queries and one
/// affected row per batch item otherwise.
#[derive(Clone, Default)]
pub struct MockConnectionFactory {
    state: Arc<MockState>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Auto commit mode of the connections created from now on.
    pub fn with_auto_commit(self, auto_commit: bool) -> Self {
        self.state.lock().auto_commit = auto_commit;
        self
    }

    /// Isolation level of the connections created from now on.
    pub fn with_isolation(self, isolation: IsolationLevel) -> Self {
        self.state.lock().isolation = isolation;
        self
    }

    /// Statements whose SQL contains `sql` return `results`.
    pub fn script(&self, sql: impl Into<String>, results: impl IntoIterator<Item = QueryResult>) {
        self.state
            .lock()
            .scripts
            .push((sql.into(), results.into_iter().collect()));
    }

    pub fn fail(&self, failure: Failure) {
        self.state.lock().failures.push(failure);
    }

    /// Connection calls recording `event` complete only after `duration`, the
    /// event is recorded once the wait is over.
    pub fn delay(&self, event: Event, duration: Duration) {
        self.state.lock().delays.push((event, duration));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Recorded calls with the id of their connection.
    pub fn recorded(&self) -> Vec<(usize, Event)> {
        self.state.lock().events.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state
            .lock()
            .events
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn events_of(&self, connection: usize) -> Vec<Event> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(id, _)| *id == connection)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(_, event)| predicate(event))
            .count()
    }

    /// SQL text of every executed statement.
    pub fn executed(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|(_, event)| match event {
                Event::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connections_created(&self) -> usize {
        self.state.lock().next_connection - 1
    }

    /// Connections created and not closed yet.
    pub fn open_connections(&self) -> usize {
        self.state.lock().open.len()
    }
}

impl ConnectionFactory for MockConnectionFactory {
    type Connection = MockConnection;

    async fn create(&self) -> Result<MockConnection> {
        let mut state = self.state.lock();
        state.check(Failure::Create)?;
        let id = state.next_connection;
        state.next_connection += 1;
        state.open.insert(id);
        state.record(id, Event::Create);
        Ok(MockConnection::new(
            id,
            self.state.clone(),
            state.auto_commit,
            state.isolation,
        ))
    }
}
