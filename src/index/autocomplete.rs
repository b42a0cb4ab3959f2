//! Autocompleter trait.

use std::fmt::Debug;

use crate::document::suggestion::Suggestion;
use crate::error::Result;

/// Abstract autocomplete dictionary implemented by every engine.
pub trait Autocompleter: Send + Sync + Debug {
    /// Add suggestion terms.
    fn add_terms(&self, suggestions: &[Suggestion]) -> Result<()>;

    /// Get up to `count` suggestions for `prefix`, highest score first.
    fn suggest(&self, prefix: &str, count: usize, fuzzy: bool) -> Result<Vec<Suggestion>>;

    /// Delete the whole dictionary.
    fn delete(&self) -> Result<()>;
}
