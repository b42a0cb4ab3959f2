//! Synthetic document generation.
//!
//! Documents get ids `doc1`, `doc2`, ... and text fields filled with tokens
//! `term0` to `term{vocab_size - 1}`. Low term numbers are drawn far more
//! often than high ones, roughly like word frequencies in natural text.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::document::document::Document;
use crate::document::suggestion::Suggestion;
use crate::error::{Result, ShardBenchError};

/// Generator of synthetic documents.
#[derive(Debug)]
pub struct DocumentGenerator {
    /// Field name to `[min, max)` token count.
    fields: BTreeMap<String, (usize, usize)>,

    /// Number of distinct terms.
    vocab_size: usize,

    /// Id handed out for the next auto-numbered document.
    next_id: u64,

    rng: StdRng,
}

impl DocumentGenerator {
    /// Create a generator seeded from the OS.
    pub fn new(vocab_size: usize, fields: BTreeMap<String, (usize, usize)>) -> Result<Self> {
        Self::with_rng(vocab_size, fields, StdRng::from_os_rng())
    }

    /// Create a generator with a fixed seed.
    pub fn with_seed(
        vocab_size: usize,
        fields: BTreeMap<String, (usize, usize)>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(vocab_size, fields, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        vocab_size: usize,
        fields: BTreeMap<String, (usize, usize)>,
        rng: StdRng,
    ) -> Result<Self> {
        if vocab_size == 0 {
            return Err(ShardBenchError::invalid_argument(
                "vocabulary size must be greater than zero",
            ));
        }
        for (name, (min, max)) in &fields {
            if min > max {
                return Err(ShardBenchError::invalid_argument(format!(
                    "field '{name}' has token range [{min}, {max})"
                )));
            }
        }

        Ok(Self {
            fields,
            vocab_size,
            next_id: 1,
            rng,
        })
    }

    /// Title and body fields with short and long token ranges.
    pub fn default_fields() -> BTreeMap<String, (usize, usize)> {
        BTreeMap::from([
            ("title".to_string(), (5, 10)),
            ("body".to_string(), (10, 20)),
        ])
    }

    /// Generate a document with id `doc{id}`; `0` picks the next free id.
    pub fn generate(&mut self, id: u64) -> Document {
        let id = if id == 0 {
            let id = self.next_id;
            self.next_id += 1;
            id
        } else {
            id
        };

        let mut doc = Document::new(format!("doc{id}"), 1.0);
        let fields: Vec<(String, (usize, usize))> =
            self.fields.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for (name, (min, max)) in fields {
            let count = if max > min {
                self.rng.random_range(min..max)
            } else {
                min
            };
            let tokens: Vec<String> = (0..count).map(|_| self.next_term()).collect();
            doc.set_property(name, tokens.join(" "));
        }
        doc
    }

    /// Generate `n` auto-numbered documents.
    pub fn generate_batch(&mut self, n: usize) -> Vec<Document> {
        (0..n).map(|_| self.generate(0)).collect()
    }

    /// Draw one token, skewed towards low term numbers.
    fn next_term(&mut self) -> String {
        let u: f64 = self.rng.random();
        let k = ((u * u) * self.vocab_size as f64) as usize;
        term(k.min(self.vocab_size - 1))
    }
}

/// The `k`-th vocabulary term.
pub fn term(k: usize) -> String {
    format!("term{k}")
}

/// The first `n` vocabulary terms.
pub fn vocabulary(n: usize) -> Vec<String> {
    (0..n).map(term).collect()
}

/// Suggestions for the first `n` terms, lower terms scoring higher.
pub fn vocabulary_suggestions(n: usize) -> Vec<Suggestion> {
    (0..n)
        .map(|k| Suggestion::new(term(k), (n - k) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::field_value::FieldValue;

    #[test]
    fn test_auto_increment_ids() {
        let mut generator =
            DocumentGenerator::with_seed(100, DocumentGenerator::default_fields(), 7).unwrap();

        assert_eq!(generator.generate(0).id(), "doc1");
        assert_eq!(generator.generate(0).id(), "doc2");
        assert_eq!(generator.generate(42).id(), "doc42");
        assert_eq!(generator.generate(0).id(), "doc3");
    }

    #[test]
    fn test_token_ranges() {
        let mut generator =
            DocumentGenerator::with_seed(50, DocumentGenerator::default_fields(), 1).unwrap();

        for doc in generator.generate_batch(100) {
            let title = doc.get("title").and_then(FieldValue::as_text).unwrap();
            let body = doc.get("body").and_then(FieldValue::as_text).unwrap();

            let title_tokens = title.split(' ').count();
            let body_tokens = body.split(' ').count();
            assert!((5..10).contains(&title_tokens));
            assert!((10..20).contains(&body_tokens));

            for token in body.split(' ') {
                let k: usize = token.trim_start_matches("term").parse().unwrap();
                assert!(k < 50);
            }
        }
    }

    #[test]
    fn test_skew_towards_low_terms() {
        let fields = BTreeMap::from([("body".to_string(), (100, 101))]);
        let mut generator = DocumentGenerator::with_seed(1000, fields, 3).unwrap();
        let doc = generator.generate(0);
        let body = doc.get("body").and_then(FieldValue::as_text).unwrap();

        let low = body
            .split(' ')
            .filter(|t| t.trim_start_matches("term").parse::<usize>().unwrap() < 250)
            .count();
        assert!(low > 30);
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let fields = DocumentGenerator::default_fields();
        let mut a = DocumentGenerator::with_seed(100, fields.clone(), 9).unwrap();
        let mut b = DocumentGenerator::with_seed(100, fields, 9).unwrap();
        assert_eq!(a.generate_batch(5), b.generate_batch(5));
    }

    #[test]
    fn test_invalid_settings() {
        assert!(DocumentGenerator::new(0, BTreeMap::new()).is_err());
        let fields = BTreeMap::from([("body".to_string(), (5, 2))]);
        assert!(DocumentGenerator::new(10, fields).is_err());
    }

    #[test]
    fn test_vocabulary() {
        assert_eq!(vocabulary(3), vec!["term0", "term1", "term2"]);
        let suggestions = vocabulary_suggestions(3);
        assert_eq!(suggestions[0].term, "term0");
        assert_eq!(suggestions[0].score, 3.0);
    }
}
