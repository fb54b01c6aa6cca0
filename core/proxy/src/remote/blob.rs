use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use openhub_bindings::{
    BlobBinding, BlobListOptions, BlobListResult, BlobMetadata, BlobObject, BlobPutOptions,
};
use openhub_common::Result;

use super::{invoke, invoke_as, ProxyTransport};
use crate::command::{BlobCommand, ProxyCommand};
use crate::encoding::{BlobPayload, EncodedBlob};

/// Blob binding forwarding to a remote proxy handler.
///
/// Bodies travel as base64 [`EncodedBlob`]s; the put content type rides
/// along in the payload as well as in the options.
#[derive(Clone)]
pub struct RemoteBlob {
    transport: Arc<dyn ProxyTransport>,
}

impl RemoteBlob {
    pub fn new(transport: Arc<dyn ProxyTransport>) -> Self {
        Self { transport }
    }

    async fn send(&self, command: BlobCommand) -> Result<Value> {
        invoke(self.transport.as_ref(), ProxyCommand::Blob(command)).await
    }
}

#[async_trait]
impl BlobBinding for RemoteBlob {
    async fn get(&self, key: &str) -> Result<Option<BlobObject>> {
        let encoded: Option<EncodedBlob> = invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Blob(BlobCommand::Get {
                key: key.to_string(),
            }),
        )
        .await?;

        encoded
            .map(|encoded| {
                Ok(BlobObject {
                    key: key.to_string(),
                    body: encoded.to_bytes()?,
                    content_type: encoded.content_type,
                })
            })
            .transpose()
    }

    async fn put(&self, key: &str, body: Vec<u8>, options: Option<BlobPutOptions>) -> Result<()> {
        let content_type = options
            .as_ref()
            .and_then(|options| options.content_type())
            .map(str::to_string);
        let payload = BlobPayload::Encoded(EncodedBlob::from_bytes(&body, content_type));

        self.send(BlobCommand::Put {
            key: key.to_string(),
            payload,
            options,
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.send(BlobCommand::Delete {
            key: key.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn list(&self, options: Option<BlobListOptions>) -> Result<BlobListResult> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Blob(BlobCommand::List { options }),
        )
        .await
    }

    async fn head(&self, key: &str) -> Result<Option<BlobMetadata>> {
        invoke_as(
            self.transport.as_ref(),
            ProxyCommand::Blob(BlobCommand::Head {
                key: key.to_string(),
            }),
        )
        .await
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.send(BlobCommand::Call {
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
    use openhub_common::Error;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_encodes_body_and_content_type() {
        let transport = Arc::new(RecordingTransport::default());
        let blob = RemoteBlob::new(transport.clone());

        blob.put(
            "file.txt",
            b"hello".to_vec(),
            Some(BlobPutOptions::with_content_type("text/plain")),
        )
        .await
        .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.method, "put");
        assert_eq!(request.args[0], json!("file.txt"));
        assert_eq!(
            request.args[1],
            json!({"base64": "aGVsbG8=", "contentType": "text/plain"})
        );
    }

    #[tokio::test]
    async fn test_get_decodes_body() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!({"base64": "aGVsbG8=", "contentType": "text/plain"}),
        )]));
        let blob = RemoteBlob::new(transport);

        let object = blob.get("file.txt").await.unwrap().unwrap();
        assert_eq!(object.key, "file.txt");
        assert_eq!(object.body, b"hello");
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let blob = RemoteBlob::new(Arc::new(RecordingTransport::default()));
        assert!(blob.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_encoding_error() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!({"base64": "%%%"}),
        )]));
        let blob = RemoteBlob::new(transport);
        assert!(matches!(blob.get("k").await, Err(Error::Encoding(_))));
    }

    #[tokio::test]
    async fn test_head_decodes_metadata() {
        let transport = Arc::new(RecordingTransport::replying(vec![ProxyResponse::success(
            json!({"key": "a.png", "size": 2, "httpMetadata": {"contentType": "image/png"}}),
        )]));
        let blob = RemoteBlob::new(transport);

        let meta = blob.head("a.png").await.unwrap().unwrap();
        assert_eq!(meta.size, 2);
        assert_eq!(meta.http_metadata.content_type.as_deref(), Some("image/png"));
    }
}
