//! In-memory index and autocompleter backends.
//!
//! These backends hold everything in process memory behind `parking_lot`
//! locks. Matching is deliberately simple (lower-cased token equality, prefix
//! or wildcard matching, ranking by document score) and an optional fixed
//! latency can be injected to stand in for a network round trip.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;

use crate::document::document::{Document, sort_by_score};
use crate::document::field_value::FieldValue;
use crate::document::suggestion::{self, Suggestion};
use crate::error::{Result, ShardBenchError};
use crate::index::autocomplete::Autocompleter;
use crate::index::index::{Index, SearchResults};
use crate::index::metadata::Metadata;
use crate::index::options::IndexingOptions;
use crate::query::flags::QueryFlags;
use crate::query::query::Query;
use crate::util::levenshtein::fuzzy_prefix_match;

/// Maximum edit distance for fuzzy suggestions.
const FUZZY_MAX_DISTANCE: usize = 1;

/// In-memory index.
///
/// The index must be created before documents can be indexed; dropping a
/// missing index is not an error.
#[derive(Debug)]
pub struct MemoryIndex {
    /// Index name.
    name: String,

    /// Schema used to pick searchable fields.
    metadata: Metadata,

    /// Stored documents by id; `None` until created.
    documents: RwLock<Option<HashMap<String, Document>>>,

    /// Artificial delay applied to every search.
    latency: Option<Duration>,
}

impl MemoryIndex {
    /// Create a new, not yet created, in-memory index.
    pub fn new<S: Into<String>>(name: S, metadata: Metadata) -> Self {
        MemoryIndex {
            name: name.into(),
            metadata,
            documents: RwLock::new(None),
            latency: None,
        }
    }

    /// Delay every search by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Check whether the index has been created.
    pub fn exists(&self) -> bool {
        self.documents.read().is_some()
    }

    /// Check whether a document id is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.documents
            .read()
            .as_ref()
            .is_some_and(|docs| docs.contains_key(id))
    }

    fn missing(&self) -> ShardBenchError {
        ShardBenchError::index(format!("index '{}' does not exist", self.name))
    }

    /// Fields a query is matched against.
    fn search_fields<'a>(&'a self, query: &'a Query) -> Vec<&'a str> {
        match &query.field {
            Some(field) => vec![field.as_str()],
            None => self.metadata.text_fields(),
        }
    }

    fn matches(&self, doc: &Document, query: &Query, term: &str) -> bool {
        let fields = self.search_fields(query);
        let texts: Vec<&str> = if fields.is_empty() {
            doc.properties().values().filter_map(FieldValue::as_text).collect()
        } else {
            fields
                .iter()
                .filter_map(|f| doc.get(f).and_then(FieldValue::as_text))
                .collect()
        };

        texts.iter().any(|text| {
            tokenize(text).any(|token| {
                if query.flags.contains(QueryFlags::WILDCARD) {
                    wildcard_match(term, &token)
                } else if query.flags.contains(QueryFlags::PREFIX) {
                    token.starts_with(term)
                } else {
                    token == term
                }
            })
        })
    }
}

impl Index for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<()> {
        let mut documents = self.documents.write();
        if documents.is_some() {
            return Err(ShardBenchError::index(format!(
                "index '{}' already exists",
                self.name
            )));
        }
        *documents = Some(HashMap::new());
        Ok(())
    }

    fn drop_index(&self) -> Result<()> {
        *self.documents.write() = None;
        Ok(())
    }

    fn index(&self, documents: Vec<Document>, options: &IndexingOptions) -> Result<()> {
        options.validate()?;

        let mut guard = self.documents.write();
        let stored = guard.as_mut().ok_or_else(|| self.missing())?;

        // Reject the whole batch before touching anything
        for doc in &documents {
            if doc.id().is_empty() {
                return Err(ShardBenchError::index("document id must not be empty"));
            }
            if !options.replace && stored.contains_key(doc.id()) {
                return Err(ShardBenchError::index(format!(
                    "document '{}' already exists in '{}'",
                    doc.id(),
                    self.name
                )));
            }
        }

        for mut doc in documents {
            if options.no_save {
                doc.clear_properties();
            }
            let id = doc.id().to_string();
            match stored.get_mut(&id) {
                Some(existing) if options.partial => {
                    existing.set_score(doc.score());
                    for (name, value) in doc.properties() {
                        existing.set_property(name.clone(), value.clone());
                    }
                }
                _ => {
                    stored.insert(id, doc);
                }
            }
        }

        Ok(())
    }

    fn search(&self, query: &Query) -> Result<SearchResults> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        let term = query.term.to_lowercase();
        let mut matched: Vec<Document> = {
            let guard = self.documents.read();
            let stored = guard.as_ref().ok_or_else(|| self.missing())?;
            stored
                .values()
                .filter(|doc| self.matches(doc, query, &term))
                .cloned()
                .collect()
        };

        // Stable score order needs a fixed input order
        matched.sort_by(|a, b| a.id().cmp(b.id()));
        sort_by_score(&mut matched);

        let total = matched.len();
        let page: Vec<Document> = matched
            .into_iter()
            .skip(query.paging.offset)
            .take(query.paging.count)
            .map(|mut doc| {
                if query.flags.contains(QueryFlags::NO_CONTENT) {
                    doc.clear_properties();
                }
                doc
            })
            .collect();

        Ok(SearchResults::new(page, total))
    }

    fn document_count(&self) -> Result<u64> {
        let guard = self.documents.read();
        let stored = guard.as_ref().ok_or_else(|| self.missing())?;
        Ok(stored.len() as u64)
    }
}

/// In-memory autocomplete dictionary.
#[derive(Debug)]
pub struct MemoryAutocompleter {
    /// Dictionary name.
    name: String,

    /// Term scores.
    terms: RwLock<HashMap<String, f64>>,

    /// Artificial delay applied to every lookup.
    latency: Option<Duration>,
}

impl MemoryAutocompleter {
    /// Create an empty dictionary.
    pub fn new<S: Into<String>>(name: S) -> Self {
        MemoryAutocompleter {
            name: name.into(),
            terms: RwLock::new(HashMap::new()),
            latency: None,
        }
    }

    /// Delay every lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Dictionary name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored terms.
    pub fn len(&self) -> usize {
        self.terms.read().len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.terms.read().is_empty()
    }

    /// Check whether a term is stored.
    pub fn contains(&self, term: &str) -> bool {
        self.terms.read().contains_key(term)
    }
}

impl Autocompleter for MemoryAutocompleter {
    fn add_terms(&self, suggestions: &[Suggestion]) -> Result<()> {
        let mut terms = self.terms.write();
        for s in suggestions {
            if s.term.is_empty() {
                return Err(ShardBenchError::index("suggestion term must not be empty"));
            }
            terms.insert(s.term.clone(), s.score);
        }
        Ok(())
    }

    fn suggest(&self, prefix: &str, count: usize, fuzzy: bool) -> Result<Vec<Suggestion>> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        let prefix = prefix.to_lowercase();
        let mut found: Vec<Suggestion> = self
            .terms
            .read()
            .iter()
            .filter(|(term, _)| {
                let term = term.to_lowercase();
                term.starts_with(&prefix)
                    || (fuzzy && fuzzy_prefix_match(&term, &prefix, FUZZY_MAX_DISTANCE))
            })
            .map(|(term, score)| Suggestion::new(term.clone(), *score))
            .collect();

        found.sort_by(|a, b| a.term.cmp(&b.term));
        suggestion::sort_by_score(&mut found);
        found.truncate(count);
        Ok(found)
    }

    fn delete(&self) -> Result<()> {
        self.terms.write().clear();
        Ok(())
    }
}

/// Lower-cased alphanumeric tokens of a text.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Match `text` against a pattern where `*` matches any run and `?` one character.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
