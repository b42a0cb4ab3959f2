//! Document and suggestion records exchanged with index backends.
//!
//! - [`document::Document`] - an identified, scored record with arbitrary properties
//! - [`field_value::FieldValue`] - dynamic property values
//! - [`suggestion::Suggestion`] - a scored autocomplete term
//!
//! Both documents and suggestions order by descending score; the helpers
//! [`document::sort_by_score`] and [`suggestion::sort_by_score`] apply that
//! ordering with a stable tie-break on arrival order.
//!
//! # Examples
//!
//! ```
//! use shardbench::document::document::Document;
//!
//! let doc = Document::new("doc1", 0.5)
//!     .set("title", "hello world")
//!     .set("year", 2024);
//!
//! assert_eq!(doc.id(), "doc1");
//! assert_eq!(doc.len(), 2);
//! ```

pub mod document;
pub mod field_value;
pub mod suggestion;
