use quarry_core::{Error, IsolationLevel, QueryResult, Result, Value};
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// A driver call, as recorded by the mock driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Create,
    CreateStatement(String),
    Bind(usize, Value),
    Add,
    ReturnGeneratedValues,
    Execute(String),
    SetAutoCommit(bool),
    SetIsolation(IsolationLevel),
    Begin,
    Commit,
    Rollback,
    Close,
}

/// Driver call made to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Create,
    SetAutoCommit,
    SetIsolation,
    Begin,
    Commit,
    Rollback,
    Close,
    /// Execution of statements whose SQL contains the text.
    Execute(String),
}

pub(crate) struct Inner {
    pub(crate) events: Vec<(usize, Event)>,
    pub(crate) scripts: Vec<(String, Vec<QueryResult>)>,
    pub(crate) failures: Vec<Failure>,
    pub(crate) delays: Vec<(Event, Duration)>,
    pub(crate) next_connection: usize,
    pub(crate) next_key: i64,
    pub(crate) open: HashSet<usize>,
    pub(crate) auto_commit: bool,
    pub(crate) isolation: IsolationLevel,
}

impl Inner {
    pub(crate) fn record(&mut self, connection: usize, event: Event) {
        log::trace!("Mock connection {}: {:?}", connection, event);
        self.events.push((connection, event));
    }

    pub(crate) fn check(&self, failure: Failure) -> Result<()> {
        if self.failures.contains(&failure) {
            return Err(Error::msg(format!("Mock driver failure: {:?}", failure)));
        }
        Ok(())
    }

    pub(crate) fn check_execute(&self, sql: &str) -> Result<()> {
        let failing = self.failures.iter().any(|v| match v {
            Failure::Execute(pattern) => sql.contains(pattern.as_str()),
            _ => false,
        });
        if failing {
            return Err(Error::msg(format!("Mock driver failure executing: {}", sql)));
        }
        Ok(())
    }

    pub(crate) fn delay_for(&self, event: &Event) -> Option<Duration> {
        self.delays
            .iter()
            .find(|(delayed, _)| delayed == event)
            .map(|(_, duration)| *duration)
    }

    /// Results of the first script whose pattern is contained in `sql`.
    pub(crate) fn script_for(&self, sql: &str) -> Option<Vec<QueryResult>> {
        self.scripts
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, results)| results.clone())
    }
}

pub(crate) struct MockState {
    inner: Mutex<Inner>,
}

impl MockState {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: Vec::new(),
                scripts: Vec::new(),
                failures: Vec::new(),
                delays: Vec::new(),
                next_connection: 1,
                next_key: 1,
                open: HashSet::new(),
                auto_commit: true,
                isolation: IsolationLevel::ReadCommitted,
            }),
        }
    }
}
