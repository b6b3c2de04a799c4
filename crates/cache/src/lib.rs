//! Result caching for EBI job dispatcher requests
//!
//! This crate stores completed job results on disk, keyed by a deterministic
//! fingerprint of the request parameters:
//! - Canonical parameter serialization and SHA-512 fingerprinting
//! - One JSON document per entry, written atomically
//! - Collision and corruption checks on every read
//!
//! # Layout
//!
//! Entries live at `{root}/{scope}/{fingerprint}`, where the scope is the
//! service that produced the result. Scoping keeps results from different
//! tools apart even when two requests share a parameter set.
//!
//! # Fingerprint Computation
//!
//! Fingerprints are computed from the complete parameter set and nothing
//! else. Parameters are held in a sorted map, encoded as canonical JSON, and
//! hashed with SHA-512; insertion order never changes the fingerprint.

mod error;
pub mod store;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use store::{
    CacheEntry, CacheStore, Fingerprint, Lookup, RequestParams, StoredValue, WriteIntent,
    default_cache_root,
};
