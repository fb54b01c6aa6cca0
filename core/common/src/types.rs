//! Common types used throughout OpenHub.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The three storage categories a binding can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    /// Relational store (prepare/bind/run/all/first/batch/dump).
    Database,
    /// Key-value store.
    Kv,
    /// Blob/object store.
    Blob,
}

impl BindingKind {
    /// All categories, in canonical order.
    pub const ALL: [BindingKind; 3] = [BindingKind::Database, BindingKind::Kv, BindingKind::Blob];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Database => "database",
            BindingKind::Kv => "kv",
            BindingKind::Blob => "blob",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "database" => Ok(BindingKind::Database),
            "kv" => Ok(BindingKind::Kv),
            "blob" => Ok(BindingKind::Blob),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown binding '{}'",
                other
            ))),
        }
    }
}

/// Cloud platform a process can be hosted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Cloudflare,
    Aws,
    Azure,
    Google,
    Supabase,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Cloudflare,
        Platform::Aws,
        Platform::Azure,
        Platform::Google,
        Platform::Supabase,
    ];

    /// Human-readable platform name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Cloudflare => "Cloudflare",
            Platform::Aws => "AWS",
            Platform::Azure => "Azure",
            Platform::Google => "Google",
            Platform::Supabase => "Supabase",
        }
    }

    /// Lowercase platform tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Cloudflare => "cloudflare",
            Platform::Aws => "aws",
            Platform::Azure => "azure",
            Platform::Google => "google",
            Platform::Supabase => "supabase",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "cloudflare" => Ok(Platform::Cloudflare),
            "aws" => Ok(Platform::Aws),
            "azure" => Ok(Platform::Azure),
            "google" => Ok(Platform::Google),
            "supabase" => Ok(Platform::Supabase),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown platform '{}'",
                other
            ))),
        }
    }
}

/// Shared secret used to authenticate proxy calls.
///
/// Zeroized on drop; `Debug` never prints the value. Deserializes from a
/// plain string but is never serialized.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the raw value, e.g. for a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against a presented value.
    ///
    /// Lengths are compared first; only equal-length inputs reach the
    /// byte comparison.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        expected.len() == presented.len() && bool::from(expected.ct_eq(presented))
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_kind_wire_names() {
        assert_eq!(serde_json::to_string(&BindingKind::Kv).unwrap(), "\"kv\"");
        let kind: BindingKind = serde_json::from_str("\"database\"").unwrap();
        assert_eq!(kind, BindingKind::Database);
    }

    #[test]
    fn test_binding_kind_unknown_fails() {
        assert!("queue".parse::<BindingKind>().is_err());
        assert!(serde_json::from_str::<BindingKind>("\"queue\"").is_err());
    }

    #[test]
    fn test_platform_round_trip_through_str() {
        for platform in [
            Platform::Cloudflare,
            Platform::Aws,
            Platform::Azure,
            Platform::Google,
            Platform::Supabase,
        ] {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_secret_matches_exactly() {
        let secret = SharedSecret::new("s3cret");
        assert!(secret.matches("s3cret"));
        assert!(!secret.matches("s3cre"));
        assert!(!secret.matches("s3cret!"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SharedSecret::new("s3cret");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("REDACTED"));
    }
}
