//! Merging of per-shard partial results.

use crate::document::document::{Document, sort_by_score};
use crate::document::suggestion::{self, Suggestion};
use crate::index::index::SearchResults;
use crate::query::query::{Paging, Query};

/// Rewrite a query for one shard.
///
/// Each shard ranks from its own top, so the offset becomes 0 and the count
/// covers the caller's whole window. The merged slice then matches a global
/// sort-then-slice over every shard's matches.
pub fn shard_query(query: &Query) -> Query {
    let mut rewritten = query.clone();
    rewritten.paging = Paging::new(0, query.paging.end());
    rewritten
}

/// Merge shard results and cut the caller's page.
///
/// Documents are concatenated in the given order, stably sorted by
/// descending score and sliced by `paging`. Totals are summed regardless of
/// paging. An offset past the merged list yields an empty page.
pub fn merge_search_results(partials: Vec<SearchResults>, paging: Paging) -> SearchResults {
    let mut total = 0;
    let mut documents: Vec<Document> = Vec::new();

    for partial in partials {
        total += partial.total;
        documents.extend(partial.documents);
    }

    sort_by_score(&mut documents);

    let page = documents
        .into_iter()
        .skip(paging.offset)
        .take(paging.count)
        .collect();

    SearchResults::new(page, total)
}

/// Merge shard suggestion lists into the top `count` by descending score.
pub fn merge_suggestions(partials: Vec<Vec<Suggestion>>, count: usize) -> Vec<Suggestion> {
    let mut merged: Vec<Suggestion> = partials.into_iter().flatten().collect();
    suggestion::sort_by_score(&mut merged);
    merged.truncate(count);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(scores: &[(&str, f32)], total: usize) -> SearchResults {
        SearchResults::new(
            scores
                .iter()
                .map(|(id, score)| Document::new(*id, *score))
                .collect(),
            total,
        )
    }

    fn ids(results: &SearchResults) -> Vec<&str> {
        results.documents.iter().map(|d| d.id()).collect()
    }

    #[test]
    fn test_shard_query_rewrite() {
        let query = Query::new("hello").limit(20, 10);
        let rewritten = shard_query(&query);

        assert_eq!(rewritten.paging, Paging::new(0, 30));
        assert_eq!(rewritten.term, "hello");
        assert_eq!(query.paging, Paging::new(20, 10));
    }

    #[test]
    fn test_merge_sorts_and_sums() {
        let merged = merge_search_results(
            vec![
                results(&[("a", 0.9), ("b", 0.2)], 5),
                results(&[("c", 0.5)], 3),
                results(&[], 0),
            ],
            Paging::new(0, 10),
        );

        assert_eq!(merged.total, 8);
        assert_eq!(ids(&merged), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_merge_paging() {
        let partials = || {
            vec![
                results(&[("a", 0.9), ("b", 0.7), ("c", 0.5)], 3),
                results(&[("d", 0.8), ("e", 0.6), ("f", 0.4)], 3),
            ]
        };

        let page = merge_search_results(partials(), Paging::new(2, 2));
        assert_eq!(ids(&page), vec!["b", "e"]);
        assert_eq!(page.total, 6);

        let past_end = merge_search_results(partials(), Paging::new(10, 5));
        assert!(past_end.documents.is_empty());
        assert_eq!(past_end.total, 6);
    }

    #[test]
    fn test_merge_ties_keep_arrival_order() {
        let merged = merge_search_results(
            vec![results(&[("x", 1.0)], 1), results(&[("y", 1.0)], 1)],
            Paging::default(),
        );
        assert_eq!(ids(&merged), vec!["x", "y"]);
    }

    #[test]
    fn test_merge_suggestions() {
        let merged = merge_suggestions(
            vec![
                vec![Suggestion::new("hello", 1.0), Suggestion::new("help", 0.5)],
                vec![Suggestion::new("helium", 2.0)],
                vec![],
            ],
            2,
        );

        let terms: Vec<&str> = merged.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["helium", "hello"]);
    }
}
