use crate::state::{Event, MockState};
use quarry_core::{
    Bind, QueryResult, Result, Row, RowsAffected, Statement, Value,
    stream::{self, Stream},
};
use std::{mem, sync::Arc};

pub struct MockStatement {
    connection: usize,
    sql: String,
    state: Arc<MockState>,
    items: Vec<Vec<(usize, Value)>>,
    current: Vec<(usize, Value)>,
    generated_values: bool,
}

impl MockStatement {
    pub(crate) fn new(connection: usize, sql: String, state: Arc<MockState>) -> Self {
        Self {
            connection,
            sql,
            state,
            items: Vec::new(),
            current: Vec::new(),
            generated_values: false,
        }
    }

    fn is_query(&self) -> bool {
        let sql = self.sql.trim_start_matches(['(', ' ', '\n']);
        sql.get(..6)
            .is_some_and(|v| v.eq_ignore_ascii_case("select"))
    }
}

impl Bind for MockStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<()> {
        self.state
            .lock()
            .record(self.connection, Event::Bind(index, value.clone()));
        self.current.push((index, value));
        Ok(())
    }
}

impl Statement for MockStatement {
    fn add(&mut self) -> Result<()> {
        self.state.lock().record(self.connection, Event::Add);
        self.items.push(mem::take(&mut self.current));
        Ok(())
    }

    fn return_generated_values(&mut self, _columns: &[&str]) -> Result<()> {
        self.state
            .lock()
            .record(self.connection, Event::ReturnGeneratedValues);
        self.generated_values = true;
        Ok(())
    }

    fn execute(mut self) -> impl Stream<Item = Result<QueryResult>> + Send + 'static {
        if !self.current.is_empty() || self.items.is_empty() {
            self.items.push(mem::take(&mut self.current));
        }
        let is_query = self.is_query();
        let mut state = self.state.lock();
        state.record(self.connection, Event::Execute(self.sql.clone()));
        let results: Vec<Result<QueryResult>> = if let Err(e) = state.check_execute(&self.sql) {
            vec![Err(e)]
        } else if let Some(script) = state.script_for(&self.sql) {
            script.into_iter().map(Ok).collect()
        } else if is_query {
            Vec::new()
        } else {
            let mut results = Vec::new();
            for _ in &self.items {
                results.push(Ok(QueryResult::Affected(RowsAffected {
                    rows_affected: 1,
                    last_affected_id: None,
                })));
                if self.generated_values {
                    let key = state.next_key;
                    state.next_key += 1;
                    results.push(Ok(QueryResult::Row(Row::new(
                        ["id".to_string()].into(),
                        [Value::Int64(Some(key))].into(),
                    ))));
                }
            }
            results
        };
        drop(state);
        stream::iter(results)
    }
}
