//! Scripted in-memory relational binding.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use openhub_common::{Error, Result};

use super::{read, write};
use crate::database::{DatabaseBinding, ExecResult, PreparedStatement, QueryResult, StatementSpec};

/// One observed interaction with a [`MemoryDatabase`].
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseCall {
    Prepare(String),
    Bind(Vec<Value>),
    All(StatementSpec),
    First(StatementSpec),
    Run(StatementSpec),
    Batch(Vec<StatementSpec>),
    Exec(String),
    Dump,
}

#[derive(Debug, Default)]
struct State {
    rows: HashMap<String, Vec<Value>>,
    changes: HashMap<String, ExecResult>,
    failures: HashMap<String, String>,
    calls: Vec<DatabaseCall>,
}

impl State {
    fn check(&self, sql: &str) -> Result<()> {
        match self.failures.get(sql) {
            Some(message) => Err(Error::Storage(message.clone())),
            None => Ok(()),
        }
    }

    fn change_for(&self, sql: &str) -> ExecResult {
        self.changes.get(sql).cloned().unwrap_or_default()
    }
}

/// In-memory relational binding.
///
/// There is no SQL engine behind it: queries return whatever rows were
/// registered for their exact SQL text, and every interaction is recorded
/// so tests can assert on the call sequence.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<State>>,
}

impl MemoryDatabase {
    /// Create a database with no scripted results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by `all`/`first` for this SQL text.
    pub fn with_rows(self, sql: impl Into<String>, rows: Vec<Value>) -> Self {
        write(&self.state).rows.insert(sql.into(), rows);
        self
    }

    /// Result returned by `run` (and per statement in `batch`) for this SQL text.
    pub fn with_change(self, sql: impl Into<String>, change: ExecResult) -> Self {
        write(&self.state).changes.insert(sql.into(), change);
        self
    }

    /// Make every execution of this SQL text fail with a storage error.
    pub fn with_failure(self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        write(&self.state)
            .failures
            .insert(sql.into(), message.into());
        self
    }

    /// Every interaction so far, oldest first.
    pub fn calls(&self) -> Vec<DatabaseCall> {
        read(&self.state).calls.clone()
    }
}

#[async_trait]
impl DatabaseBinding for MemoryDatabase {
    fn prepare(&self, sql: &str) -> Box<dyn PreparedStatement> {
        write(&self.state)
            .calls
            .push(DatabaseCall::Prepare(sql.to_string()));
        Box::new(MemoryStatement {
            state: self.state.clone(),
            sql: sql.to_string(),
            params: Vec::new(),
        })
    }

    async fn batch(&self, statements: Vec<Box<dyn PreparedStatement>>) -> Result<Vec<ExecResult>> {
        let specs: Vec<StatementSpec> = statements.iter().map(|stmt| stmt.spec()).collect();
        let mut state = write(&self.state);

        // All or nothing: validate before recording anything.
        for spec in &specs {
            state.check(&spec.sql)?;
        }

        debug!(statements = specs.len(), "Memory batch applied");
        let results = specs.iter().map(|spec| state.change_for(&spec.sql)).collect();
        state.calls.push(DatabaseCall::Batch(specs));
        Ok(results)
    }

    async fn exec(&self, sql: &str) -> Result<ExecResult> {
        let mut state = write(&self.state);
        state.check(sql)?;
        state.calls.push(DatabaseCall::Exec(sql.to_string()));
        Ok(state.change_for(sql))
    }

    async fn dump(&self) -> Result<Vec<u8>> {
        let mut state = write(&self.state);
        state.calls.push(DatabaseCall::Dump);
        let mut tables: Vec<(&String, &Vec<Value>)> = state.rows.iter().collect();
        tables.sort_by(|a, b| a.0.cmp(b.0));
        Ok(serde_json::to_vec(&tables)?)
    }
}

struct MemoryStatement {
    state: Arc<RwLock<State>>,
    sql: String,
    params: Vec<Value>,
}

impl MemoryStatement {
    fn rows(&self, call: DatabaseCall) -> Result<Vec<Value>> {
        let mut state = write(&self.state);
        state.check(&self.sql)?;
        state.calls.push(call);
        Ok(state.rows.get(&self.sql).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PreparedStatement for MemoryStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn params(&self) -> &[Value] {
        &self.params
    }

    fn bind(self: Box<Self>, params: Vec<Value>) -> Box<dyn PreparedStatement> {
        write(&self.state)
            .calls
            .push(DatabaseCall::Bind(params.clone()));
        Box::new(MemoryStatement {
            state: self.state,
            sql: self.sql,
            params,
        })
    }

    async fn all(&self) -> Result<QueryResult> {
        let results = self.rows(DatabaseCall::All(self.spec()))?;
        Ok(QueryResult {
            results,
            meta: None,
        })
    }

    async fn first(&self) -> Result<Option<Value>> {
        let rows = self.rows(DatabaseCall::First(self.spec()))?;
        Ok(rows.into_iter().next())
    }

    async fn run(&self) -> Result<ExecResult> {
        let mut state = write(&self.state);
        state.check(&self.sql)?;
        state.calls.push(DatabaseCall::Run(self.spec()));
        Ok(state.change_for(&self.sql))
    }
}
