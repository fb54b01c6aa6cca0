//! Relational binding contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use openhub_common::{Error, Result};

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// One JSON object per row.
    pub results: Vec<Value>,
    /// Engine-specific metadata (timings, rows read, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    pub rows_affected: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_row_id: Option<i64>,
}

/// Plain statement state: the SQL text and its bound parameters.
///
/// This is what a statement looks like on the wire inside a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSpec {
    pub sql: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl StatementSpec {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// A prepared statement, possibly with bound parameters.
///
/// `bind` consumes the statement and returns a new one carrying the given
/// parameters, replacing any previously bound values.
#[async_trait]
pub trait PreparedStatement: Send + Sync {
    /// SQL text this statement was prepared from.
    fn sql(&self) -> &str;

    /// Currently bound parameters.
    fn params(&self) -> &[Value];

    /// Bind positional parameters.
    fn bind(self: Box<Self>, params: Vec<Value>) -> Box<dyn PreparedStatement>;

    /// Run the statement and collect every row.
    async fn all(&self) -> Result<QueryResult>;

    /// Run the statement and return the first row, if any.
    async fn first(&self) -> Result<Option<Value>>;

    /// Run the statement for its side effects.
    async fn run(&self) -> Result<ExecResult>;

    /// Wire-level view of this statement.
    fn spec(&self) -> StatementSpec {
        StatementSpec::new(self.sql(), self.params().to_vec())
    }
}

/// Relational binding.
///
/// `exec` and `dump` are optional: bindings that do not support them keep
/// the default implementations, which fail with [`Error::NotAvailable`].
#[async_trait]
pub trait DatabaseBinding: Send + Sync {
    /// Prepare a statement without executing it.
    fn prepare(&self, sql: &str) -> Box<dyn PreparedStatement>;

    /// Execute a list of statements as one atomic unit.
    ///
    /// # Postconditions
    /// - One result per statement, in input order
    /// - Either every statement is applied or none is
    async fn batch(&self, statements: Vec<Box<dyn PreparedStatement>>) -> Result<Vec<ExecResult>>;

    /// Execute raw SQL (possibly several statements) without parameters.
    async fn exec(&self, _sql: &str) -> Result<ExecResult> {
        Err(Error::NotAvailable("exec".to_string()))
    }

    /// Export the whole database as raw bytes.
    async fn dump(&self) -> Result<Vec<u8>> {
        Err(Error::NotAvailable("dump".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_result_wire_shape() {
        let result = ExecResult {
            rows_affected: 2,
            last_row_id: Some(7),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"rowsAffected": 2, "lastRowId": 7}));
    }

    #[test]
    fn test_statement_spec_args_default_to_empty() {
        let spec: StatementSpec = serde_json::from_str(r#"{"sql":"SELECT 1"}"#).unwrap();
        assert_eq!(spec.sql, "SELECT 1");
        assert!(spec.args.is_empty());
    }
}
