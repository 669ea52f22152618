//! Instrumentation cache
//!
//! Content-addressed store of instrumented HTML/JavaScript keyed by
//! `(host, content hash)`. A miss runs the external instrumentation tool
//! and persists its artifact; a hit returns the artifact without running
//! anything.

pub mod key;
pub mod store;
pub mod tool;

pub use key::{artifact_name, content_hash, ArtifactKind, CacheKey};
pub use store::{list_entries, ArtifactMeta, CacheEntry, InstrumentationCache, Instrumented};
pub use tool::{InstrumentJob, Instrumenter, ProcessInstrumenter};
