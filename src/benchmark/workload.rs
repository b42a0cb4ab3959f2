//! Operation closures for the benchmark harness.
//!
//! Each builder returns a `Fn() -> Result<()>` that performs exactly one
//! backend call per invocation and is safe to share between workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use rand::Rng;

use crate::error::{Result, ShardBenchError};
use crate::index::autocomplete::Autocompleter;
use crate::index::index::Index;
use crate::query::flags::QueryFlags;
use crate::query::query::Query;

/// Results requested per benchmark query.
pub const RESULTS_PER_QUERY: usize = 5;

/// Minimum gap between the shortest and longest wildcard pattern length.
pub const WILDCARD_MIN_SPREAD: usize = 2;

/// Kinds of benchmark workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Search,
    Prefix,
    Wildcard,
    Suggest,
}

impl WorkloadKind {
    /// Parse a workload name.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "search" => Ok(WorkloadKind::Search),
            "prefix" => Ok(WorkloadKind::Prefix),
            "wildcard" => Ok(WorkloadKind::Wildcard),
            "suggest" => Ok(WorkloadKind::Suggest),
            other => Err(ShardBenchError::invalid_argument(format!(
                "unknown workload '{other}'"
            ))),
        }
    }

    /// Benchmark title for `terms` distinct input terms.
    pub fn title(&self, terms: usize) -> String {
        let name = match self {
            WorkloadKind::Search => "search",
            WorkloadKind::Prefix => "prefix",
            WorkloadKind::Wildcard => "wildcard",
            WorkloadKind::Suggest => "suggest",
        };
        format!("{name}: {terms} terms")
    }
}

fn non_empty(terms: Vec<String>, what: &str) -> Result<Vec<String>> {
    if terms.is_empty() {
        return Err(ShardBenchError::invalid_argument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(terms)
}

/// First `len` characters of `term`.
fn char_prefix(term: &str, len: usize) -> &str {
    match term.char_indices().nth(len) {
        Some((end, _)) => &term[..end],
        None => term,
    }
}

/// Terms with at least `min_len` characters, cycled through with random lengths.
struct PrefixPicker {
    terms: Vec<String>,
    min_len: usize,
    max_len: usize,
    counter: AtomicUsize,
}

impl PrefixPicker {
    fn new(terms: Vec<String>, min_len: usize, max_len: usize) -> Result<Self> {
        if min_len == 0 || max_len < min_len {
            return Err(ShardBenchError::invalid_argument(format!(
                "invalid prefix length range [{min_len}, {max_len}]"
            )));
        }
        let terms: Vec<String> = terms
            .into_iter()
            .filter(|t| t.chars().count() >= min_len)
            .collect();
        let terms = non_empty(terms, "terms long enough for the prefix range")?;

        Ok(Self {
            terms,
            min_len,
            max_len,
            counter: AtomicUsize::new(0),
        })
    }

    /// Next prefix, skipping terms shorter than the drawn length.
    fn pick(&self) -> &str {
        let len = if self.min_len == self.max_len {
            self.min_len
        } else {
            rand::rng().random_range(self.min_len..=self.max_len)
        };

        for _ in 0..self.terms.len() {
            let i = self.counter.fetch_add(1, Ordering::Relaxed);
            let term = &self.terms[i % self.terms.len()];
            if term.chars().count() >= len {
                return char_prefix(term, len);
            }
        }

        // Every term covers the minimum length
        let i = self.counter.fetch_add(1, Ordering::Relaxed);
        char_prefix(&self.terms[i % self.terms.len()], self.min_len)
    }
}

/// Full-text queries cycling through `queries`, 5 results each.
pub fn search_workload<I>(
    index: Arc<I>,
    queries: Vec<String>,
    field: Option<String>,
    flags: QueryFlags,
) -> Result<impl Fn() -> Result<()> + Send + Sync>
where
    I: Index + ?Sized + 'static,
{
    let queries = non_empty(queries, "queries")?;
    let counter = AtomicUsize::new(0);

    Ok(move || {
        let i = counter.fetch_add(1, Ordering::Relaxed);
        let mut query = Query::new(queries[i % queries.len()].as_str())
            .limit(0, RESULTS_PER_QUERY)
            .with_flags(flags);
        query.field = field.clone();
        index.search(&query).map(|_| ())
    })
}

/// Prefix queries with a random prefix length in `[min_len, max_len]`.
pub fn prefix_workload<I>(
    index: Arc<I>,
    terms: Vec<String>,
    field: Option<String>,
    min_len: usize,
    max_len: usize,
) -> Result<impl Fn() -> Result<()> + Send + Sync>
where
    I: Index + ?Sized + 'static,
{
    let picker = PrefixPicker::new(terms, min_len, max_len)?;

    Ok(move || {
        let mut query = Query::new(picker.pick())
            .limit(0, RESULTS_PER_QUERY)
            .with_flags(QueryFlags::PREFIX);
        query.field = field.clone();
        index.search(&query).map(|_| ())
    })
}

/// Turn a prefix into a pattern with a `*` in its middle and at its end.
pub fn wildcard_pattern(prefix: &str) -> String {
    let chars: Vec<char> = prefix.chars().collect();
    if chars.len() < 3 {
        return format!("{prefix}*");
    }
    let mid = chars.len() / 2;
    let head: String = chars[..mid].iter().collect();
    let tail: String = chars[mid + 1..].iter().collect();
    format!("{head}*{tail}*")
}

/// Wildcard queries built from random-length term prefixes.
///
/// `max_len` is raised to leave room for a wildcard in the middle.
pub fn wildcard_workload<I>(
    index: Arc<I>,
    terms: Vec<String>,
    field: Option<String>,
    min_len: usize,
    max_len: usize,
) -> Result<impl Fn() -> Result<()> + Send + Sync>
where
    I: Index + ?Sized + 'static,
{
    let max_len = if max_len < min_len + WILDCARD_MIN_SPREAD {
        info!(
            "raising wildcard max length to {} to fit a middle wildcard",
            min_len + WILDCARD_MIN_SPREAD
        );
        min_len + WILDCARD_MIN_SPREAD
    } else {
        max_len
    };
    let picker = PrefixPicker::new(terms, min_len, max_len)?;

    Ok(move || {
        let mut query = Query::new(wildcard_pattern(picker.pick()))
            .limit(0, RESULTS_PER_QUERY)
            .with_flags(QueryFlags::WILDCARD);
        query.field = field.clone();
        index.search(&query).map(|_| ())
    })
}

/// Autocomplete lookups of a random prefix, 5 suggestions each.
pub fn suggest_workload<A>(
    autocompleter: Arc<A>,
    prefixes: Vec<String>,
    fuzzy: bool,
) -> Result<impl Fn() -> Result<()> + Send + Sync>
where
    A: Autocompleter + ?Sized + 'static,
{
    let prefixes = non_empty(prefixes, "prefixes")?;

    Ok(move || {
        let i = rand::rng().random_range(0..prefixes.len());
        autocompleter
            .suggest(&prefixes[i], RESULTS_PER_QUERY, fuzzy)
            .map(|_| ())
    })
}
