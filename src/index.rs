//! Capability contracts for search backends.
//!
//! Every backend (a single engine instance, one shard, or a whole
//! [`crate::distributed::engine::DistributedIndex`]) is reached only through
//! two small traits:
//!
//! - [`index::Index`] - create/drop, bulk indexing and search
//! - [`autocomplete::Autocompleter`] - suggestion terms
//!
//! [`memory`] provides an in-memory backend satisfying both, used by the
//! benchmark CLI, tests and benches.

pub mod autocomplete;
#[allow(clippy::module_inception)]
pub mod index;
pub mod memory;
pub mod metadata;
pub mod options;
