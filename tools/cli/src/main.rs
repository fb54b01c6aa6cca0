//! OpenHub CLI - development proxy server and one-shot proxy client.
//!
//! `serve` stands up a proxy endpoint backed by in-memory bindings, so a
//! local process in remote mode has something to talk to. `call` sends a
//! single proxy request and prints the response.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use openhub_bindings::{MemoryBlob, MemoryDatabase, MemoryKv};
use openhub_common::{BindingKind, Platform};
use openhub_provider::{create_default_registry, BindingKeys, PlatformContext, PlatformProvider};
use openhub_proxy::{ProxyRequest, ProxyTransport, PROXY_PATH};
use openhub_runtime::{
    expected_secret, proxy_router, with_bindings, BindingsState, ConfigSource, EnvSource,
    LayeredSource, MapSource, RemoteConfig, Runtime, REMOTE_SECRET_KEY, REMOTE_TIMEOUT_KEY,
    REMOTE_URL_KEY,
};

#[derive(Parser)]
#[command(name = "openhub")]
#[command(about = "OpenHub - Provider-agnostic storage bindings")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the proxy endpoint over in-memory bindings.
    Serve {
        /// Address to listen on.
        #[arg(short, long, default_value = "127.0.0.1:8787")]
        addr: SocketAddr,

        /// Shared secret (default: OPENHUB_REMOTE_SECRET).
        #[arg(short, long)]
        secret: Option<String>,

        /// Platform to emulate.
        #[arg(short, long, default_value = "cloudflare")]
        platform: String,
    },

    /// Send one proxy request.
    Call {
        /// Deployment base URL (default: OPENHUB_REMOTE_URL).
        #[arg(short, long)]
        url: Option<String>,

        /// Shared secret (default: OPENHUB_REMOTE_SECRET).
        #[arg(short, long)]
        secret: Option<String>,

        /// Binding: "database", "kv" or "blob".
        #[arg(short, long)]
        binding: String,

        /// Method name, e.g. "get" or "all".
        #[arg(short, long)]
        method: String,

        /// Positional arguments as a JSON array.
        #[arg(short, long, default_value = "[]")]
        args: String,

        /// Request timeout in seconds.
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List built-in providers and their environment names.
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            addr,
            secret,
            platform,
        } => cmd_serve(addr, secret, &platform).await,

        Commands::Call {
            url,
            secret,
            binding,
            method,
            args,
            timeout,
        } => cmd_call(url, secret, &binding, &method, &args, timeout).await,

        Commands::Providers => cmd_providers(),
    }
}

/// Command-line values layered over the process environment.
fn config_with(overrides: &[(&str, Option<String>)]) -> Arc<dyn ConfigSource> {
    let flags = MapSource::new();
    for (key, value) in overrides {
        if let Some(value) = value {
            flags.set(*key, value.clone());
        }
    }
    Arc::new(
        LayeredSource::new()
            .layer(Arc::new(flags))
            .layer(Arc::new(EnvSource)),
    )
}

/// Platform context whose native bindings are fresh memory stores.
fn memory_context(platform: Platform) -> PlatformContext {
    let keys = BindingKeys::for_platform(platform);
    PlatformContext::new(platform)
        .with_database(keys.database, Arc::new(MemoryDatabase::new()))
        .with_kv(keys.kv, Arc::new(MemoryKv::new()))
        .with_blob(keys.blob, Arc::new(MemoryBlob::new()))
}

/// Serve the proxy endpoint.
async fn cmd_serve(addr: SocketAddr, secret: Option<String>, platform: &str) -> Result<()> {
    let platform: Platform = platform.parse().context("Invalid platform")?;
    let provider = create_default_registry()
        .resolve(platform.as_str())
        .context("Failed to resolve provider")?;

    let config = config_with(&[(REMOTE_SECRET_KEY, secret)]);
    if expected_secret(config.as_ref()).is_none() {
        warn!("No shared secret configured; every proxy request will be rejected");
    }

    let runtime = Arc::new(Runtime::with_config(config));
    runtime.set_remote_mode(false);
    runtime.register_provider(provider);

    let context = memory_context(platform);
    runtime
        .prepare_bindings(Some(&context))
        .context("Failed to prepare bindings")?;

    let app = with_bindings(
        proxy_router(runtime.clone()),
        BindingsState::new(runtime).with_context(context),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving {} bindings at http://{}{}", platform, addr, PROXY_PATH);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Send one request and print the response.
async fn cmd_call(
    url: Option<String>,
    secret: Option<String>,
    binding: &str,
    method: &str,
    args: &str,
    timeout: Option<u64>,
) -> Result<()> {
    let binding: BindingKind = binding.parse().context("Invalid binding")?;
    let args: Vec<Value> =
        serde_json::from_str(args).context("Arguments must be a JSON array")?;

    let config = config_with(&[
        (REMOTE_URL_KEY, url),
        (REMOTE_SECRET_KEY, secret),
        (REMOTE_TIMEOUT_KEY, timeout.map(|secs| secs.to_string())),
    ]);
    let transport = RemoteConfig::from_source(config.as_ref())
        .and_then(|remote| remote.transport())
        .context("Failed to configure remote transport")?;

    info!("Calling {}.{} at {}", binding, method, transport.url());
    let response = transport
        .send(ProxyRequest::new(binding, method, args))
        .await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        anyhow::bail!(
            "Remote call failed: {}",
            response.error.unwrap_or_default()
        );
    }
    Ok(())
}

/// Print built-in providers.
fn cmd_providers() -> Result<()> {
    let registry = create_default_registry();
    for name in registry.providers() {
        let platform: Platform = name.parse()?;
        let keys = PlatformProvider::new(platform).keys().clone();
        println!(
            "{:<12} database={:<10} kv={:<10} blob={}",
            name, keys.database, keys.kv, keys.blob
        );
    }
    Ok(())
}
