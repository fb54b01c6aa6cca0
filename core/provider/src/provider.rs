//! Provider trait definition.

use std::sync::Arc;

use openhub_bindings::Bindings;
use openhub_common::{BindingKind, Platform, Result};
use openhub_proxy::{remote_bindings, BindingsProxyHandler, ProxyHandler, ProxyTransport};

use crate::context::PlatformContext;

/// A platform adapter.
///
/// Implementations are stateless with respect to requests: every method
/// may be called concurrently from any number of in-flight requests.
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "cloudflare", "aws").
    fn name(&self) -> &str;

    /// Platform whose contexts this provider can read.
    fn platform(&self) -> Platform;

    /// Binding categories this provider can supply.
    fn supported_bindings(&self) -> &[BindingKind];

    /// Build remote bindings for local development.
    ///
    /// Each supported category gets a wrapper that forwards its calls
    /// through `transport`. Building sends nothing.
    fn create_local_bindings(&self, transport: Arc<dyn ProxyTransport>) -> Bindings {
        remote_bindings(transport, self.supported_bindings())
    }

    /// Build the handler that serves remote calls against `bindings`.
    fn create_proxy_handler(&self, bindings: Bindings) -> Arc<dyn ProxyHandler> {
        Arc::new(BindingsProxyHandler::new(bindings))
    }

    /// Read the native bindings out of a platform context.
    ///
    /// # Errors
    /// - `PlatformMismatch` if the context carries another platform's tag
    fn extract_bindings(&self, context: &PlatformContext) -> Result<Bindings>;
}
