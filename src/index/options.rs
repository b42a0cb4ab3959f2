//! Backend indexing options.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardBenchError};

/// Flags passed along with a batch of documents to [`crate::index::index::Index::index`].
///
/// Options are validated at the boundary with [`IndexingOptions::validate`];
/// backends ignore options they have no equivalent for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingOptions {
    /// Document language, for stemmer analysis.
    pub language: Option<String>,

    /// Index the documents without storing their contents.
    pub no_save: bool,

    /// Replace documents whose id already exists instead of failing.
    pub replace: bool,

    /// Only update the supplied properties of a replaced document.
    pub partial: bool,

    /// Key prefix prepended to document ids on the backend.
    pub key_prefix: Option<String>,
}

impl IndexingOptions {
    /// Options that replace existing documents.
    pub fn replacing() -> Self {
        IndexingOptions {
            replace: true,
            ..Default::default()
        }
    }

    /// Set the document language.
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set whether contents are stored.
    pub fn with_no_save(mut self, no_save: bool) -> Self {
        self.no_save = no_save;
        self
    }

    /// Set partial updates. Implies replace.
    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        if partial {
            self.replace = true;
        }
        self
    }

    /// Set the backend key prefix.
    pub fn with_key_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Check the option combination is meaningful.
    pub fn validate(&self) -> Result<()> {
        if self.partial && !self.replace {
            return Err(ShardBenchError::invalid_argument(
                "partial updates require replace",
            ));
        }
        if let Some(language) = &self.language {
            if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ShardBenchError::invalid_argument(format!(
                    "invalid language '{language}'"
                )));
            }
        }
        if self.key_prefix.as_deref() == Some("") {
            return Err(ShardBenchError::invalid_argument(
                "key prefix must not be empty",
            ));
        }
        Ok(())
    }
}
