//! URL handling module for sitecrawl
//!
//! This module provides the visited-key normalization, link resolution and the
//! same-host scope policy used by the crawler.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::{normalize_url, visit_key};
pub use scope::{in_scope, resolve_link};
