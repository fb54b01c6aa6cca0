//! The runtime registry and per-request binding algorithm.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use openhub_bindings::Bindings;
use openhub_common::{Error, Result};
use openhub_provider::{PlatformContext, Provider};
use openhub_proxy::{ProxyHandler, ProxyTransport};

use crate::config::{remote_mode_enabled, ConfigSource, EnvSource, RemoteConfig};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide registry of providers, the proxy handler and the mode
/// switch.
///
/// Registration is expected at startup; reads happen on every request.
/// All methods take `&self` so one `Arc<Runtime>` can be shared freely.
pub struct Runtime {
    config: Arc<dyn ConfigSource>,
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    proxy_handler: RwLock<Option<Arc<dyn ProxyHandler>>>,
    remote_override: RwLock<Option<bool>>,
    transport: RwLock<Option<Arc<dyn ProxyTransport>>>,
}

impl Runtime {
    /// Runtime configured from the process environment.
    pub fn new() -> Self {
        Self::with_config(Arc::new(EnvSource))
    }

    pub fn with_config(config: Arc<dyn ConfigSource>) -> Self {
        Self {
            config,
            providers: RwLock::new(Vec::new()),
            proxy_handler: RwLock::new(None),
            remote_override: RwLock::new(None),
            transport: RwLock::new(None),
        }
    }

    /// Use this transport in remote mode instead of building one from
    /// configuration.
    pub fn with_transport(self, transport: Arc<dyn ProxyTransport>) -> Self {
        *write(&self.transport) = Some(transport);
        self
    }

    pub fn config(&self) -> &dyn ConfigSource {
        self.config.as_ref()
    }

    /// Append a provider. Later providers win merge conflicts.
    pub fn register_provider(&self, provider: Arc<dyn Provider>) {
        info!(provider = %provider.name(), "Registered provider");
        write(&self.providers).push(provider);
    }

    /// Registered providers in registration order.
    pub fn get_providers(&self) -> Vec<Arc<dyn Provider>> {
        read(&self.providers).clone()
    }

    /// Install the proxy handler, replacing any previous one.
    pub fn register_proxy_endpoint(&self, handler: Arc<dyn ProxyHandler>) {
        *write(&self.proxy_handler) = Some(handler);
    }

    pub fn get_proxy_handler(&self) -> Option<Arc<dyn ProxyHandler>> {
        read(&self.proxy_handler).clone()
    }

    /// Force local (`false`) or remote (`true`) mode regardless of
    /// configuration.
    pub fn set_remote_mode(&self, remote: bool) {
        info!(remote, "Remote mode overridden");
        *write(&self.remote_override) = Some(remote);
    }

    /// The explicit override if set, else `OPENHUB_REMOTE == "true"`.
    pub fn is_remote_mode(&self) -> bool {
        match *read(&self.remote_override) {
            Some(remote) => remote,
            None => remote_mode_enabled(self.config.as_ref()),
        }
    }

    /// Transport used in remote mode, built once from configuration.
    pub fn transport(&self) -> Result<Arc<dyn ProxyTransport>> {
        if let Some(transport) = read(&self.transport).as_ref() {
            return Ok(transport.clone());
        }

        let mut slot = write(&self.transport);
        if let Some(transport) = slot.as_ref() {
            return Ok(transport.clone());
        }
        let config = RemoteConfig::from_source(self.config.as_ref())?;
        let transport: Arc<dyn ProxyTransport> = Arc::new(config.transport()?);
        info!(url = %config.url, "Remote transport configured");
        *slot = Some(transport.clone());
        Ok(transport)
    }

    /// Assemble the bindings for one request.
    ///
    /// Remote mode merges every provider's remote bindings over the shared
    /// transport and ignores `context`. Local mode extracts from `context`
    /// with every provider, merging in registration order, then lets every
    /// provider build a handler over the merged result; the last one stays
    /// registered.
    ///
    /// # Errors
    /// - `Configuration` in remote mode when no transport can be built, or
    ///   in local mode when `context` is `None`
    /// - whatever a provider's extraction fails with, such as
    ///   `PlatformMismatch`
    pub fn prepare_bindings(&self, context: Option<&PlatformContext>) -> Result<Bindings> {
        let providers = self.get_providers();

        if self.is_remote_mode() {
            let transport = self.transport()?;
            let bindings = providers.iter().fold(Bindings::new(), |acc, provider| {
                acc.merge(provider.create_local_bindings(transport.clone()))
            });
            debug!(bindings = ?bindings, "Prepared remote bindings");
            return Ok(bindings);
        }

        let context = context.ok_or_else(|| {
            Error::Configuration("Local mode requires a platform context".to_string())
        })?;

        let mut bindings = Bindings::new();
        for provider in &providers {
            bindings = bindings.merge(provider.extract_bindings(context)?);
        }
        for provider in &providers {
            self.register_proxy_endpoint(provider.create_proxy_handler(bindings.clone()));
        }

        debug!(platform = %context.platform(), bindings = ?bindings, "Prepared local bindings");
        Ok(bindings)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapSource, REMOTE_MODE_KEY, REMOTE_URL_KEY};
    use async_trait::async_trait;
    use openhub_bindings::{DatabaseBinding, KvBinding, MemoryDatabase, MemoryKv};
    use openhub_common::{BindingKind, Platform};
    use openhub_provider::PlatformProvider;
    use openhub_proxy::{ProxyRequest, ProxyResponse};
    use std::sync::Mutex;

    /// Provider that ignores the context and hands out fixed bindings.
    struct FixedProvider {
        name: &'static str,
        bindings: Bindings,
        supported: Vec<BindingKind>,
    }

    impl FixedProvider {
        fn new(name: &'static str, bindings: Bindings) -> Arc<Self> {
            let supported = bindings.kinds();
            Arc::new(Self {
                name,
                bindings,
                supported,
            })
        }
    }

    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn platform(&self) -> Platform {
            Platform::Cloudflare
        }

        fn supported_bindings(&self) -> &[BindingKind] {
            &self.supported
        }

        fn extract_bindings(&self, _context: &PlatformContext) -> Result<Bindings> {
            Ok(self.bindings.clone())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        requests: Mutex<Vec<ProxyRequest>>,
    }

    #[async_trait]
    impl ProxyTransport for RecordingTransport {
        async fn send(&self, request: ProxyRequest) -> ProxyResponse {
            self.requests.lock().unwrap().push(request);
            ProxyResponse::success(serde_json::json!("remote"))
        }
    }

    fn local_runtime() -> Runtime {
        Runtime::with_config(Arc::new(MapSource::new()))
    }

    fn context() -> PlatformContext {
        PlatformContext::new(Platform::Cloudflare)
    }

    #[test]
    fn test_remote_mode_override_beats_config() {
        let runtime =
            Runtime::with_config(Arc::new(MapSource::new().with(REMOTE_MODE_KEY, "true")));
        assert!(runtime.is_remote_mode());

        runtime.set_remote_mode(false);
        assert!(!runtime.is_remote_mode());

        runtime.set_remote_mode(true);
        assert!(runtime.is_remote_mode());
    }

    #[test]
    fn test_local_mode_by_default() {
        assert!(!local_runtime().is_remote_mode());
    }

    #[test]
    fn test_merge_precedence() {
        let a: Arc<dyn DatabaseBinding> = Arc::new(MemoryDatabase::new());
        let b: Arc<dyn KvBinding> = Arc::new(MemoryKv::new());
        let c: Arc<dyn DatabaseBinding> = Arc::new(MemoryDatabase::new());

        let runtime = local_runtime();
        runtime.register_provider(FixedProvider::new("p1", Bindings::new().with_database(a.clone())));
        runtime.register_provider(FixedProvider::new("p2", Bindings::new().with_kv(b.clone())));

        let merged = runtime.prepare_bindings(Some(&context())).unwrap();
        assert!(Arc::ptr_eq(merged.database.as_ref().unwrap(), &a));
        assert!(Arc::ptr_eq(merged.kv.as_ref().unwrap(), &b));

        runtime.register_provider(FixedProvider::new("p3", Bindings::new().with_database(c.clone())));
        let merged = runtime.prepare_bindings(Some(&context())).unwrap();
        assert!(Arc::ptr_eq(merged.database.as_ref().unwrap(), &c));
        assert!(Arc::ptr_eq(merged.kv.as_ref().unwrap(), &b));
    }

    #[test]
    fn test_providers_keep_registration_order() {
        let runtime = local_runtime();
        runtime.register_provider(FixedProvider::new("first", Bindings::new()));
        runtime.register_provider(FixedProvider::new("second", Bindings::new()));

        let names: Vec<String> = runtime
            .get_providers()
            .iter()
            .map(|provider| provider.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_local_mode_registers_handler_over_merged_bindings() {
        let kv = Arc::new(MemoryKv::new());
        kv.put("greeting", "hi", None).await.unwrap();

        let runtime = local_runtime();
        runtime.register_provider(FixedProvider::new(
            "p1",
            Bindings::new().with_database(Arc::new(MemoryDatabase::new())),
        ));
        runtime.register_provider(FixedProvider::new("p2", Bindings::new().with_kv(kv)));
        assert!(runtime.get_proxy_handler().is_none());

        runtime.prepare_bindings(Some(&context())).unwrap();

        let handler = runtime.get_proxy_handler().unwrap();
        let response = handler
            .handle(ProxyRequest::new(
                BindingKind::Kv,
                "get",
                vec![serde_json::json!("greeting")],
            ))
            .await;
        assert_eq!(response.data, Some(serde_json::json!("hi")));
    }

    #[test]
    fn test_last_registered_handler_wins() {
        let runtime = local_runtime();
        let first: Arc<dyn ProxyHandler> =
            Arc::new(openhub_proxy::BindingsProxyHandler::new(Bindings::new()));
        let second: Arc<dyn ProxyHandler> =
            Arc::new(openhub_proxy::BindingsProxyHandler::new(Bindings::new()));

        runtime.register_proxy_endpoint(first);
        runtime.register_proxy_endpoint(second.clone());
        assert!(Arc::ptr_eq(&runtime.get_proxy_handler().unwrap(), &second));
    }

    #[test]
    fn test_local_mode_requires_context() {
        let runtime = local_runtime();
        assert!(matches!(
            runtime.prepare_bindings(None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_platform_mismatch_propagates() {
        let runtime = local_runtime();
        runtime.register_provider(Arc::new(PlatformProvider::aws()));
        let err = runtime.prepare_bindings(Some(&context())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "AWS provider cannot extract bindings from platform: cloudflare"
        );
    }

    #[tokio::test]
    async fn test_remote_mode_uses_transport_and_skips_handler() {
        let transport = Arc::new(RecordingTransport::default());
        let runtime = local_runtime().with_transport(transport.clone());
        runtime.set_remote_mode(true);
        runtime.register_provider(Arc::new(PlatformProvider::cloudflare()));

        let bindings = runtime.prepare_bindings(None).unwrap();
        assert_eq!(bindings.kinds(), BindingKind::ALL.to_vec());
        assert!(runtime.get_proxy_handler().is_none());

        let value = bindings.kv.unwrap().get("k").await.unwrap();
        assert_eq!(value.as_deref(), Some("remote"));
        assert_eq!(transport.requests.lock().unwrap()[0].method, "get");
    }

    #[test]
    fn test_remote_mode_without_url_fails() {
        let runtime = local_runtime();
        runtime.set_remote_mode(true);
        assert!(matches!(
            runtime.prepare_bindings(None),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_transport_built_once() {
        let runtime = Runtime::with_config(Arc::new(
            MapSource::new().with(REMOTE_URL_KEY, "http://127.0.0.1:8787"),
        ));
        let first = runtime.transport().unwrap();
        let second = runtime.transport().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
