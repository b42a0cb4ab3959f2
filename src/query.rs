//! Backend-neutral search queries.
//!
//! A [`query::Query`] carries the search term, an optional field restriction,
//! paging and a [`flags::QueryFlags`] bitset. Backends translate it into their
//! own wire format.

pub mod flags;
#[allow(clippy::module_inception)]
pub mod query;
