//! Index trait and search result type.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::document::document::Document;
use crate::error::{Result, ShardBenchError};
use crate::index::options::IndexingOptions;
use crate::query::query::Query;

/// A page of documents together with the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Documents in the requested page, highest score first.
    pub documents: Vec<Document>,

    /// Total number of matching documents, independent of paging.
    pub total: usize,
}

impl SearchResults {
    /// Create a result page.
    pub fn new(documents: Vec<Document>, total: usize) -> Self {
        SearchResults { documents, total }
    }

    /// Number of documents in the page.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the page is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Abstract search index a benchmark works against.
///
/// Implementations must be shareable across threads; a distributed index
/// calls many shards concurrently through `&self`.
pub trait Index: Send + Sync + Debug {
    /// Name of the index on its backend.
    fn name(&self) -> &str;

    /// Create the index.
    fn create(&self) -> Result<()>;

    /// Delete the index and all its documents.
    fn drop_index(&self) -> Result<()>;

    /// Index a batch of documents.
    fn index(&self, documents: Vec<Document>, options: &IndexingOptions) -> Result<()>;

    /// Run a query and return the requested page plus the total match count.
    fn search(&self, query: &Query) -> Result<SearchResults>;

    /// Number of documents currently stored.
    fn document_count(&self) -> Result<u64> {
        Err(ShardBenchError::index(format!(
            "document count is not supported by index '{}'",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NullIndex;

    impl Index for NullIndex {
        fn name(&self) -> &str {
            "null"
        }

        fn create(&self) -> Result<()> {
            Ok(())
        }

        fn drop_index(&self) -> Result<()> {
            Ok(())
        }

        fn index(&self, _documents: Vec<Document>, _options: &IndexingOptions) -> Result<()> {
            Ok(())
        }

        fn search(&self, _query: &Query) -> Result<SearchResults> {
            Ok(SearchResults::default())
        }
    }

    #[test]
    fn test_default_document_count_is_unsupported() {
        let index = NullIndex;
        let err = index.document_count().unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_search_results() {
        let results = SearchResults::new(vec![Document::new("a", 1.0)], 7);
        assert_eq!(results.len(), 1);
        assert_eq!(results.total, 7);
        assert!(SearchResults::default().is_empty());
    }
}
