//! Search query definition.

use serde::{Deserialize, Serialize};

use crate::query::flags::QueryFlags;

/// Default paging offset.
pub const DEFAULT_OFFSET: usize = 0;

/// Default number of results per page.
pub const DEFAULT_COUNT: usize = 10;

/// Offset paging of a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Number of leading results to skip.
    pub offset: usize,

    /// Maximum number of results to return.
    pub count: usize,
}

impl Paging {
    /// Create a new paging window.
    pub fn new(offset: usize, count: usize) -> Self {
        Paging { offset, count }
    }

    /// End of the window (exclusive), saturating on overflow.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.count)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Paging::new(DEFAULT_OFFSET, DEFAULT_COUNT)
    }
}

/// Options to highlight query terms in returned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightOptions {
    /// Fields to highlight; empty means all.
    pub fields: Vec<String>,

    /// Opening and closing tags, e.g. `<b>` and `</b>`.
    pub tags: (String, String),
}

/// Options to summarize returned fields into relevant snippets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Fields to summarize; empty means all.
    pub fields: Vec<String>,

    /// Fragment length in tokens.
    pub fragment_len: usize,

    /// Number of fragments per field.
    pub num_fragments: usize,

    /// Separator placed between fragments.
    pub separator: String,
}

impl SummaryOptions {
    /// Summary options with engine-default lengths for the given fields.
    pub fn for_fields(fields: Vec<String>) -> Self {
        SummaryOptions {
            fields,
            fragment_len: 20,
            num_fragments: 3,
            separator: "...".to_string(),
        }
    }
}

/// A single search query and all its parameters.
///
/// ```
/// use shardbench::query::flags::QueryFlags;
/// use shardbench::query::query::Query;
///
/// let query = Query::new("hello")
///     .limit(0, 5)
///     .with_field("title")
///     .with_flags(QueryFlags::VERBATIM);
///
/// assert_eq!(query.paging.count, 5);
/// assert_eq!(query.field.as_deref(), Some("title"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The search term.
    pub term: String,

    /// Restrict matching to this field.
    pub field: Option<String>,

    /// Result window.
    pub paging: Paging,

    /// Optional behaviours.
    pub flags: QueryFlags,

    /// Highlighting options.
    pub highlight: Option<HighlightOptions>,

    /// Summarization options.
    pub summarize: Option<SummaryOptions>,
}

impl Query {
    /// Create a query for the given term with default paging.
    pub fn new<S: Into<String>>(term: S) -> Self {
        Query {
            term: term.into(),
            field: None,
            paging: Paging::default(),
            flags: QueryFlags::NONE,
            highlight: None,
            summarize: None,
        }
    }

    /// Set the paging offset and limit.
    pub fn limit(mut self, offset: usize, count: usize) -> Self {
        self.paging = Paging::new(offset, count);
        self
    }

    /// Restrict the query to one field.
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Replace the query flags.
    pub fn with_flags(mut self, flags: QueryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Highlight query terms in the given fields.
    pub fn highlight<S: Into<String>>(
        mut self,
        fields: Vec<String>,
        open_tag: S,
        close_tag: S,
    ) -> Self {
        self.highlight = Some(HighlightOptions {
            fields,
            tags: (open_tag.into(), close_tag.into()),
        });
        self
    }

    /// Summarize the given fields with default options.
    pub fn summarize(mut self, fields: Vec<String>) -> Self {
        self.summarize = Some(SummaryOptions::for_fields(fields));
        self
    }

    /// Summarize with explicit options.
    pub fn summarize_with(mut self, options: SummaryOptions) -> Self {
        self.summarize = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paging() {
        let query = Query::new("term");
        assert_eq!(query.paging, Paging::new(0, 10));
        assert!(query.flags.is_empty());
        assert!(query.field.is_none());
    }

    #[test]
    fn test_paging_end_saturates() {
        assert_eq!(Paging::new(5, 10).end(), 15);
        assert_eq!(Paging::new(usize::MAX, 10).end(), usize::MAX);
    }

    #[test]
    fn test_highlight_and_summarize() {
        let query = Query::new("obama")
            .highlight(vec!["body".to_string()], "<b>", "</b>")
            .summarize(vec!["body".to_string()]);

        let highlight = query.highlight.unwrap();
        assert_eq!(highlight.tags, ("<b>".to_string(), "</b>".to_string()));

        let summary = query.summarize.unwrap();
        assert_eq!(summary.fragment_len, 20);
        assert_eq!(summary.num_fragments, 3);
        assert_eq!(summary.separator, "...");
    }
}
