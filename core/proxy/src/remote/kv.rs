use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use openhub_bindings::{KvBinding, KvListOptions, KvListResult, KvPutOptions};
use openhub_common::Result;

use super::{invoke, invoke_as, ProxyTransport};
use crate::command::{KvCommand, ProxyCommand};

/// Key-value binding forwarding to a remote proxy handler.
#[derive(Clone)]
pub struct RemoteKv {
    transport: Arc<dyn ProxyTransport>,
}

impl RemoteKv {
    pub fn new(transport: Arc<dyn ProxyTransport>) -> Self {
        Self { transport }
    }

    async fn send(&self, command: KvCommand) -> Result<Value> {
        invoke(self.transport.as_ref(), ProxyCommand::Kv(command)).await
    }
}

#[async_trait]
impl KvBinding for RemoteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Kv(KvCommand::Get {
                key: key.to_string(),
            }),
        )
        .await
    }

    async fn put(&self, key: &str, value: &str, options: Option<KvPutOptions>) -> Result<()> {
        self.send(KvCommand::Put {
            key: key.to_string(),
            value: value.to_string(),
            options,
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.send(KvCommand::Delete {
            key: key.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn list(&self, options: Option<KvListOptions>) -> Result<KvListResult> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Kv(KvCommand::List { options }),
        )
        .await
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.send(KvCommand::Call {
            method: method.to_string(),
            args,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProxyResponse;
    use crate::remote::testing::RecordingTransport;
    use openhub_common::BindingKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_without_options() {
        let transport = Arc::new(RecordingTransport::default());
        let kv = RemoteKv::new(transport.clone());

        kv.put("k", "v", None).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].binding, BindingKind::Kv);
        assert_eq!(requests[0].method, "put");
        assert_eq!(requests[0].args, vec![json!("k"), json!("v"), Value::Null]);
    }

    #[tokio::test]
    async fn test_get_decodes_value() {
        let transport = Arc::new(RecordingTransport::replying(vec![
            ProxyResponse::success(json!("hello")),
            ProxyResponse::success(Value::Null),
        ]));
        let kv = RemoteKv::new(transport);

        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("hello"));
        assert!(kv.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_with_ttl() {
        let transport = Arc::new(RecordingTransport::default());
        let kv = RemoteKv::new(transport.clone());

        kv.put(
            "session",
            "abc",
            Some(KvPutOptions {
                expiration: None,
                expiration_ttl: Some(60),
            }),
        )
        .await
        .unwrap();

        assert_eq!(transport.requests()[0].args[2], json!({"expirationTtl": 60}));
    }

    #[tokio::test]
    async fn test_call_forwards_method_name() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!({"value": "v", "metadata": null}),
        )]));
        let kv = RemoteKv::new(transport.clone());

        let data = kv.call("getWithMetadata", vec![json!("k")]).await.unwrap();
        assert_eq!(data["value"], json!("v"));
        assert_eq!(transport.requests()[0].method, "getWithMetadata");
    }

    #[tokio::test]
    async fn test_failure_message_is_raised() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::failure(
            "Binding 'kv' not found or not supported by this provider",
        )]));
        let kv = RemoteKv::new(transport);

        let err = kv.delete("k").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Binding 'kv' not found or not supported by this provider"
        );
    }
}
