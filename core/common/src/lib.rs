//! Common utilities and types shared across the OpenHub crates.
//!
//! This module provides the error taxonomy and the small vocabulary types
//! (binding categories, platform tags, shared secrets) that every other
//! crate speaks.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{BindingKind, Platform, SharedSecret};
