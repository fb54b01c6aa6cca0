//! Proxy request/response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use openhub_common::{BindingKind, Error, Result};

/// Namespace reserved for OpenHub routes and headers.
pub const PROXY_NAMESPACE: &str = "openhub";

/// Route of the proxy endpoint, relative to the deployment base URL.
pub const PROXY_PATH: &str = "/__openhub/proxy";

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-openhub-secret";

/// One remote binding call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub binding: BindingKind,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ProxyRequest {
    pub fn new(binding: BindingKind, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            binding,
            method: method.into(),
            args,
        }
    }
}

/// Outcome of a remote binding call.
///
/// `data` is meaningful only when `success` is true, `error` only when it
/// is false. A successful call that produced nothing carries `data: null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProxyResponse {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Collapse into call-or-fail form.
    ///
    /// Failures become [`Error::Remote`] carrying the remote message.
    pub fn into_result(self) -> Result<Value> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(Error::Remote(
                self.error
                    .unwrap_or_else(|| "Unknown proxy error".to_string()),
            ))
        }
    }
}
