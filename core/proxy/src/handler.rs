//! Server-side execution of proxy requests.

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use openhub_bindings::{BlobBinding, Bindings, DatabaseBinding, KvBinding};
use openhub_common::{BindingKind, Error, Result};

use crate::command::{BlobCommand, DatabaseCommand, KvCommand, ProxyCommand};
use crate::encoding::EncodedBlob;
use crate::protocol::{ProxyRequest, ProxyResponse};

/// Content type attached to database dumps.
const DUMP_CONTENT_TYPE: &str = "application/octet-stream";

/// Executes proxy requests.
///
/// Handlers never fail: every outcome, including a panic inside a binding,
/// is reported through the response.
#[async_trait]
pub trait ProxyHandler: Send + Sync {
    async fn handle(&self, request: ProxyRequest) -> ProxyResponse;
}

/// Default handler dispatching to a set of concrete bindings.
#[derive(Debug, Clone)]
pub struct BindingsProxyHandler {
    bindings: Bindings,
}

impl BindingsProxyHandler {
    pub fn new(bindings: Bindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    async fn dispatch(&self, request: ProxyRequest) -> Result<Value> {
        // Presence is checked before the method so a missing binding wins.
        if !self.bindings.contains(request.binding) {
            return Err(Error::BindingNotFound(request.binding));
        }

        match ProxyCommand::from_request(request)? {
            ProxyCommand::Database(command) => {
                let database = self
                    .bindings
                    .database
                    .as_deref()
                    .ok_or(Error::BindingNotFound(BindingKind::Database))?;
                dispatch_database(database, command).await
            }
            ProxyCommand::Kv(command) => {
                let kv = self
                    .bindings
                    .kv
                    .as_deref()
                    .ok_or(Error::BindingNotFound(BindingKind::Kv))?;
                dispatch_kv(kv, command).await
            }
            ProxyCommand::Blob(command) => {
                let blob = self
                    .bindings
                    .blob
                    .as_deref()
                    .ok_or(Error::BindingNotFound(BindingKind::Blob))?;
                dispatch_blob(blob, command).await
            }
        }
    }
}

#[async_trait]
impl ProxyHandler for BindingsProxyHandler {
    async fn handle(&self, request: ProxyRequest) -> ProxyResponse {
        let binding = request.binding;
        let method = request.method.clone();
        debug!(binding = %binding, method = %method, "Handling proxy request");

        match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(Ok(data)) => ProxyResponse::success(data),
            Ok(Err(err)) => {
                debug!(binding = %binding, method = %method, error = %err, "Proxy call failed");
                ProxyResponse::failure(err.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(binding = %binding, method = %method, "Binding panicked: {}", message);
                ProxyResponse::failure(message)
            }
        }
    }
}

async fn dispatch_database(database: &dyn DatabaseBinding, command: DatabaseCommand) -> Result<Value> {
    match command {
        DatabaseCommand::All(spec) => {
            let statement = database.prepare(&spec.sql).bind(spec.args);
            json(&statement.all().await?)
        }
        DatabaseCommand::First(spec) => {
            let statement = database.prepare(&spec.sql).bind(spec.args);
            json(&statement.first().await?)
        }
        DatabaseCommand::Run(spec) => {
            let statement = database.prepare(&spec.sql).bind(spec.args);
            json(&statement.run().await?)
        }
        DatabaseCommand::Batch(specs) => {
            let statements = specs
                .into_iter()
                .map(|spec| database.prepare(&spec.sql).bind(spec.args))
                .collect();
            json(&database.batch(statements).await?)
        }
        DatabaseCommand::Exec(sql) => json(&database.exec(&sql).await?),
        DatabaseCommand::Dump => {
            let bytes = database.dump().await?;
            json(&EncodedBlob::from_bytes(
                &bytes,
                Some(DUMP_CONTENT_TYPE.to_string()),
            ))
        }
    }
}

async fn dispatch_kv(kv: &dyn KvBinding, command: KvCommand) -> Result<Value> {
    match command {
        KvCommand::Get { key } => json(&kv.get(&key).await?),
        KvCommand::Put {
            key,
            value,
            options,
        } => {
            kv.put(&key, &value, options).await?;
            Ok(Value::Null)
        }
        KvCommand::Delete { key } => {
            kv.delete(&key).await?;
            Ok(Value::Null)
        }
        KvCommand::List { options } => json(&kv.list(options).await?),
        KvCommand::Call { method, args } => kv.call(&method, args).await,
    }
}

async fn dispatch_blob(blob: &dyn BlobBinding, command: BlobCommand) -> Result<Value> {
    match command {
        BlobCommand::Get { key } => match blob.get(&key).await? {
            Some(object) => json(&EncodedBlob::from_bytes(&object.body, object.content_type)),
            None => Ok(Value::Null),
        },
        BlobCommand::Put {
            key,
            payload,
            options,
        } => {
            let (body, content_type) = payload.into_bytes()?;
            let mut options = options;
            if let Some(content_type) = content_type {
                options
                    .get_or_insert_with(Default::default)
                    .set_content_type(content_type);
            }
            blob.put(&key, body, options).await?;
            Ok(Value::Null)
        }
        BlobCommand::Delete { key } => {
            blob.delete(&key).await?;
            Ok(Value::Null)
        }
        BlobCommand::List { options } => json(&blob.list(options).await?),
        BlobCommand::Head { key } => json(&blob.head(&key).await?),
        BlobCommand::Call { method, args } => blob.call(&method, args).await,
    }
}

fn json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Text carried by a caught panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Proxy handler panicked".to_string()
    }
}
