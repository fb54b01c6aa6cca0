//! Bindings whose every operation is a proxy round trip.
//!
//! Each remote binding turns a call into a [`ProxyCommand`], sends it
//! through a shared [`ProxyTransport`] and either decodes the returned
//! data or raises the remote error message.

mod blob;
mod database;
mod kv;

pub use blob::RemoteBlob;
pub use database::RemoteDatabase;
pub use kv::RemoteKv;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use openhub_bindings::Bindings;
use openhub_common::{BindingKind, Result};

use crate::command::ProxyCommand;
use crate::transport::ProxyTransport;

/// Build remote bindings for the given kinds over one transport.
pub fn remote_bindings(transport: Arc<dyn ProxyTransport>, kinds: &[BindingKind]) -> Bindings {
    kinds.iter().fold(Bindings::new(), |bindings, kind| match kind {
        BindingKind::Database => {
            bindings.with_database(Arc::new(RemoteDatabase::new(transport.clone())))
        }
        BindingKind::Kv => bindings.with_kv(Arc::new(RemoteKv::new(transport.clone()))),
        BindingKind::Blob => bindings.with_blob(Arc::new(RemoteBlob::new(transport.clone()))),
    })
}

async fn invoke(transport: &dyn ProxyTransport, command: ProxyCommand) -> Result<Value> {
    let request = command.into_request();
    debug!(binding = %request.binding, method = %request.method, "Forwarding binding call");
    transport.send(request).await.into_result()
}

async fn invoke_as<T: DeserializeOwned>(
    transport: &dyn ProxyTransport,
    command: ProxyCommand,
) -> Result<T> {
    let data = invoke(transport, command).await?;
    Ok(serde_json::from_value(data)?)
}
