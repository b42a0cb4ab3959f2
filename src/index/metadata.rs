//! Index schema metadata.
//!
//! Metadata describes how an index treats the properties of documents sent
//! to it. Backends use it when creating the index.

use serde::{Deserialize, Serialize};

/// Options for full-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextFieldOptions {
    /// Relative weight of matches in this field.
    pub weight: f32,

    /// Whether stemming is applied.
    pub stemming: bool,
}

impl Default for TextFieldOptions {
    fn default() -> Self {
        TextFieldOptions {
            weight: 1.0,
            stemming: true,
        }
    }
}

/// Kind of a field and its kind-specific options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// Full-text field.
    Text(TextFieldOptions),
    /// Numeric range field.
    Numeric,
    /// Geo-indexed point field.
    Geo,
    /// Short value hashed and indexed as-is.
    Value,
    /// Stored but not indexed.
    NoIndex,
}

/// A single field's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,

    /// Field kind.
    pub field_type: FieldType,
}

impl Field {
    /// Create a text field with the given weight.
    pub fn text<S: Into<String>>(name: S, weight: f32) -> Self {
        Field {
            name: name.into(),
            field_type: FieldType::Text(TextFieldOptions {
                weight,
                ..Default::default()
            }),
        }
    }

    /// Create a numeric field.
    pub fn numeric<S: Into<String>>(name: S) -> Self {
        Field {
            name: name.into(),
            field_type: FieldType::Numeric,
        }
    }

    /// Create a field of any kind.
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
        }
    }

    /// Check if this field is full-text searchable.
    pub fn is_text(&self) -> bool {
        matches!(self.field_type, FieldType::Text(_))
    }
}

/// An index schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field and return the metadata.
    pub fn add_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of all full-text fields.
    pub fn text_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_text())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Schema of the English Wikipedia abstracts dataset.
    pub fn wikipedia() -> Self {
        Metadata::new()
            .add_field(Field::text("body", 1.0))
            .add_field(Field::text("title", 1.0))
            .add_field(Field::text("url", 1.0))
    }
}
