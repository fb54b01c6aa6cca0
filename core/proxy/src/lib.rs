//! Remote-proxy protocol for OpenHub bindings.
//!
//! Binding calls can cross a process boundary: a local development process
//! holds *remote* bindings whose every method is an RPC, and a deployed
//! instance runs a proxy handler that executes the call against its real
//! bindings.
//!
//! - [`protocol`]: the `ProxyRequest`/`ProxyResponse` envelope
//! - [`command`]: the typed command each request decodes into
//! - [`encoding`]: binary-safe blob payloads over JSON
//! - [`transport`]: delivery of a request to a remote handler
//! - [`handler`]: execution of a request against concrete bindings
//! - [`remote`]: binding implementations that forward through a transport

pub mod command;
pub mod encoding;
pub mod handler;
pub mod protocol;
pub mod remote;
pub mod transport;

pub use command::{BlobCommand, DatabaseCommand, KvCommand, ProxyCommand};
pub use encoding::{decode_base64, encode_base64, BlobPayload, EncodedBlob};
pub use handler::{panic_message, BindingsProxyHandler, ProxyHandler};
pub use protocol::{ProxyRequest, ProxyResponse, PROXY_NAMESPACE, PROXY_PATH, SECRET_HEADER};
pub use remote::{remote_bindings, RemoteBlob, RemoteDatabase, RemoteKv};
pub use transport::{normalize_proxy_url, HttpTransport, ProxyTransport};
