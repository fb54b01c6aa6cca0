use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use openhub_bindings::{DatabaseBinding, ExecResult, PreparedStatement, QueryResult, StatementSpec};
use openhub_common::Result;

use super::{invoke_as, ProxyTransport};
use crate::command::{DatabaseCommand, ProxyCommand};
use crate::encoding::EncodedBlob;

/// Relational binding forwarding to a remote proxy handler.
#[derive(Clone)]
pub struct RemoteDatabase {
    transport: Arc<dyn ProxyTransport>,
}

impl RemoteDatabase {
    pub fn new(transport: Arc<dyn ProxyTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl DatabaseBinding for RemoteDatabase {
    /// Purely local: nothing is sent until the statement executes.
    fn prepare(&self, sql: &str) -> Box<dyn PreparedStatement> {
        Box::new(RemoteStatement {
            transport: self.transport.clone(),
            spec: StatementSpec::new(sql, Vec::new()),
        })
    }

    async fn batch(&self, statements: Vec<Box<dyn PreparedStatement>>) -> Result<Vec<ExecResult>> {
        let specs = statements.iter().map(|stmt| stmt.spec()).collect();
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::Batch(specs)),
        )
        .await
    }

    async fn exec(&self, sql: &str) -> Result<ExecResult> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::Exec(sql.to_string())),
        )
        .await
    }

    async fn dump(&self) -> Result<Vec<u8>> {
        let encoded: EncodedBlob = invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::Dump),
        )
        .await?;
        encoded.to_bytes()
    }
}

struct RemoteStatement {
    transport: Arc<dyn ProxyTransport>,
    spec: StatementSpec,
}

#[async_trait]
impl PreparedStatement for RemoteStatement {
    fn sql(&self) -> &str {
        &self.spec.sql
    }

    fn params(&self) -> &[Value] {
        &self.spec.args
    }

    fn bind(self: Box<Self>, params: Vec<Value>) -> Box<dyn PreparedStatement> {
        Box::new(RemoteStatement {
            transport: self.transport,
            spec: StatementSpec::new(self.spec.sql, params),
        })
    }

    async fn all(&self) -> Result<QueryResult> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::All(self.spec.clone())),
        )
        .await
    }

    async fn first(&self) -> Result<Option<Value>> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::First(self.spec.clone())),
        )
        .await
    }

    async fn run(&self) -> Result<ExecResult> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Database(DatabaseCommand::Run(self.spec.clone())),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProxyResponse;
    use crate::remote::testing::RecordingTransport;
    use openhub_common::{BindingKind, Error};
    use serde_json::json;

    #[tokio::test]
    async fn test_prepare_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let db = RemoteDatabase::new(transport.clone());

        let statement = db.prepare("SELECT 1").bind(vec![json!(1)]);
        assert_eq!(statement.sql(), "SELECT 1");
        assert_eq!(statement.params(), &[json!(1)]);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_all_sends_sql_and_bind_args() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!({"results": [{"id": 5, "name": "a"}]}),
        )]));
        let db = RemoteDatabase::new(transport.clone());

        let result = db
            .prepare("SELECT * FROM users WHERE id = ?")
            .bind(vec![json!(5)])
            .all()
            .await
            .unwrap();

        assert_eq!(result.results, vec![json!({"id": 5, "name": "a"})]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].binding, BindingKind::Database);
        assert_eq!(requests[0].method, "all");
        assert_eq!(
            requests[0].args,
            vec![json!("SELECT * FROM users WHERE id = ?"), json!([5])]
        );
    }

    #[tokio::test]
    async fn test_first_null_is_none() {
        let transport = Arc::new(RecordingTransport::default());
        let db = RemoteDatabase::new(transport);
        assert!(db.prepare("SELECT 1").first().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_forwards_specs() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!([{"rowsAffected": 1}, {"rowsAffected": 2}]),
        )]));
        let db = RemoteDatabase::new(transport.clone());

        let results = db
            .batch(vec![
                db.prepare("INSERT INTO a VALUES (?)").bind(vec![json!(1)]),
                db.prepare("UPDATE b SET x = 1"),
            ])
            .await
            .unwrap();

        assert_eq!(results[1].rows_affected, 2);
        assert_eq!(
            transport.requests()[0].args,
            vec![json!([
                {"sql": "INSERT INTO a VALUES (?)", "args": [1]},
                {"sql": "UPDATE b SET x = 1", "args": []}
            ])]
        );
    }

    #[tokio::test]
    async fn test_remote_failure_is_raised() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::failure(
            "HTTP error! status: 500",
        )]));
        let db = RemoteDatabase::new(transport);

        let err = db.prepare("SELECT 1").run().await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn test_dump_decodes_payload() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            serde_json::to_value(EncodedBlob::from_bytes(&[0, 1, 2, 255], None)).unwrap(),
        )]));
        let db = RemoteDatabase::new(transport);
        assert_eq!(db.dump().await.unwrap(), vec![0, 1, 2, 255]);
    }
}
