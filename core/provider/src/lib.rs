//! Providers: per-platform sources of bindings.
//!
//! A provider knows how to pull the real bindings out of its platform's
//! request context, how to build remote bindings for local development and
//! how to build the proxy handler that serves those remote bindings.

pub mod context;
pub mod platform;
pub mod provider;
pub mod registry;

pub use context::{PlatformBinding, PlatformContext};
pub use platform::{BindingKeys, PlatformProvider};
pub use provider::Provider;
pub use registry::{create_default_registry, ProviderFactory, ProviderRegistry};
