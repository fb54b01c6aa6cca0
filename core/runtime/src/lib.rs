//! Host-side runtime for OpenHub.
//!
//! The [`Runtime`] is the process-wide registry: registered providers, the
//! active proxy handler and the local/remote mode switch. It is built once
//! at startup and shared as `Arc<Runtime>`; [`middleware`] runs its
//! per-request algorithm inside axum and [`endpoint`] serves the inbound
//! proxy route.

pub mod config;
pub mod context;
pub mod endpoint;
pub mod middleware;
pub mod runtime;

pub use config::{
    expected_secret, remote_mode_enabled, ConfigSource, EnvSource, LayeredSource, MapSource,
    RemoteConfig, REMOTE_MODE_KEY, REMOTE_SECRET_KEY, REMOTE_TIMEOUT_KEY, REMOTE_URL_KEY,
};
pub use context::{get_bindings, inject_bindings, RequestBindings};
pub use endpoint::proxy_router;
pub use middleware::{bindings_middleware, with_bindings, BindingsState};
pub use runtime::Runtime;
