//! # Amber Core
//!
//! Core identity and binding types for the Amber encryption pipeline.
//!
//! Every wrapped key and every ciphertext in Amber is tied to a specific
//! asset and a specific caller. This crate defines the types that carry
//! that identity information:
//!
//! - [`AssetId`]: opaque identifier naming one encrypted data object
//! - [`Principal`]: opaque caller identity supplied by the hosting environment
//! - [`BindingContext`]: the (asset, caller) pair mixed into key unwrapping
//!
//! The binding context has a canonical byte encoding ([`BindingContext::to_bytes`])
//! designed so that distinct contexts can never collide.

pub mod binding;
pub mod error;
pub mod identity;

// Re-export main types
pub use binding::*;
pub use error::*;
pub use identity::*;
