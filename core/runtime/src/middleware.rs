//! Axum middleware that prepares bindings for every request.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tracing::warn;

use openhub_provider::PlatformContext;

use crate::context::inject_bindings;
use crate::runtime::Runtime;

/// What the middleware needs: the shared runtime and, for local mode, the
/// platform context requests are served under.
#[derive(Clone)]
pub struct BindingsState {
    runtime: Arc<Runtime>,
    context: Option<Arc<PlatformContext>>,
}

impl BindingsState {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            context: None,
        }
    }

    pub fn with_context(mut self, context: PlatformContext) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }
}

/// Run the runtime's per-request algorithm and store the result, along
/// with the runtime itself, in the request extensions.
///
/// Extraction failures end the request with 500.
pub async fn bindings_middleware(
    State(state): State<BindingsState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.runtime.prepare_bindings(state.context.as_deref()) {
        Ok(bindings) => {
            inject_bindings(request.extensions_mut(), bindings);
            request.extensions_mut().insert(state.runtime.clone());
            next.run(request).await
        }
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Failed to prepare bindings");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Wrap every route of `router` with [`bindings_middleware`].
pub fn with_bindings(router: Router, state: BindingsState) -> Router {
    router.layer(from_fn_with_state(state, bindings_middleware))
}
