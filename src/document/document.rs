//! Document structure exchanged with index backends.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;

/// A single document to be indexed or returned from a query.
///
/// Besides its id and score, a document carries completely arbitrary
/// properties. The id is fixed at construction; properties are added with
/// [`Document::set`] (fluent) or [`Document::set_property`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Document {
    /// Unique identifier within a logical index.
    id: String,

    /// Ranking score; higher sorts first.
    score: f32,

    /// Property values by name.
    properties: HashMap<String, FieldValue>,
}

impl Document {
    /// Create a document with the given id and score and no properties.
    pub fn new<S: Into<String>>(id: S, score: f32) -> Self {
        Document {
            id: id.into(),
            score,
            properties: HashMap::new(),
        }
    }

    /// Set a property and return the document, for fluent construction.
    pub fn set<S: Into<String>, V: Into<FieldValue>>(mut self, name: S, value: V) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set a property in place.
    pub fn set_property<S: Into<String>, V: Into<FieldValue>>(&mut self, name: S, value: V) {
        self.properties.insert(name.into(), value.into());
    }

    /// Get the document id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the document score.
    pub fn score(&self) -> f32 {
        self.score
    }

    /// Replace the document score.
    pub fn set_score(&mut self, score: f32) {
        self.score = score;
    }

    /// Get a property value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.properties.get(name)
    }

    /// Get all properties.
    pub fn properties(&self) -> &HashMap<String, FieldValue> {
        &self.properties
    }

    /// Drop every property, keeping id and score.
    pub fn clear_properties(&mut self) {
        self.properties.clear();
    }

    /// Get the number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the document has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Sort documents by descending score.
///
/// The sort is stable, so documents with equal scores keep their
/// relative arrival order. NaN scores sort after every real score.
pub fn sort_by_score(documents: &mut [Document]) {
    documents.sort_by(|a, b| {
        a.score
            .is_nan()
            .cmp(&b.score.is_nan())
            .then_with(|| b.score.total_cmp(&a.score))
    });
}
