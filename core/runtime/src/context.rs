//! Request-scoped bindings storage.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Extensions;
use std::convert::Infallible;

use openhub_bindings::Bindings;

/// Merge `bindings` into whatever the request already carries.
///
/// Keys present in `bindings` overwrite existing ones; other keys survive.
pub fn inject_bindings(extensions: &mut Extensions, bindings: Bindings) {
    let merged = match extensions.remove::<Bindings>() {
        Some(existing) => existing.merge(bindings),
        None => bindings,
    };
    extensions.insert(merged);
}

/// Bindings injected into this request, or an empty set.
pub fn get_bindings(extensions: &Extensions) -> Bindings {
    extensions.get::<Bindings>().cloned().unwrap_or_default()
}

/// Extractor for the bindings injected by the bindings middleware.
#[derive(Debug, Clone)]
pub struct RequestBindings(pub Bindings);

impl<S: Send + Sync> FromRequestParts<S> for RequestBindings {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(RequestBindings(get_bindings(&parts.extensions)))
    }
}
