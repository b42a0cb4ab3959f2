//! Autocomplete suggestions.

use serde::{Deserialize, Serialize};

/// A single suggestion being added to or returned from an autocompleter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The suggested term.
    pub term: String,

    /// Ranking score; higher sorts first.
    pub score: f64,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new<S: Into<String>>(term: S, score: f64) -> Self {
        Suggestion {
            term: term.into(),
            score,
        }
    }
}

/// Sort suggestions by descending score, keeping arrival order on ties.
///
/// NaN scores sort after every real score.
pub fn sort_by_score(suggestions: &mut [Suggestion]) {
    suggestions.sort_by(|a, b| {
        a.score
            .is_nan()
            .cmp(&b.score.is_nan())
            .then_with(|| b.score.total_cmp(&a.score))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_score() {
        let mut suggestions = vec![
            Suggestion::new("hello", 1.0),
            Suggestion::new("help", 3.0),
            Suggestion::new("helium", 2.0),
        ];
        sort_by_score(&mut suggestions);

        let terms: Vec<&str> = suggestions.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["help", "helium", "hello"]);
    }

    #[test]
    fn test_nan_scores_sort_last() {
        let mut suggestions = vec![
            Suggestion::new("broken", f64::NAN),
            Suggestion::new("hello", 1.0),
            Suggestion::new("help", -5.0),
        ];
        sort_by_score(&mut suggestions);

        let terms: Vec<&str> = suggestions.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["hello", "help", "broken"]);
    }
}
