//! Levenshtein edit distance for fuzzy suggestion matching.

use std::cmp::min;

/// Calculate the Levenshtein distance between two strings.
///
/// This is the minimum number of single-character insertions, deletions or
/// substitutions required to change one string into the other.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Two rolling rows of the distance matrix
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            curr[j + 1] = min(
                min(
                    prev[j + 1] + 1, // deletion
                    curr[j] + 1,     // insertion
                ),
                prev[j] + cost, // substitution
            );
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Calculate Levenshtein distance, returning `None` once it exceeds `threshold`.
pub fn levenshtein_distance_threshold(s1: &str, s2: &str, threshold: usize) -> Option<usize> {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    // Length difference alone exceeds the threshold
    if len1.abs_diff(len2) > threshold {
        return None;
    }

    let distance = levenshtein_distance(s1, s2);
    if distance <= threshold {
        Some(distance)
    } else {
        None
    }
}

/// Check whether `candidate` starts with something within `max_distance`
/// edits of `prefix`.
///
/// Every leading slice of `candidate` whose length is within `max_distance`
/// characters of the prefix length is compared.
pub fn fuzzy_prefix_match(candidate: &str, prefix: &str, max_distance: usize) -> bool {
    let prefix_len = prefix.chars().count();
    let candidate_chars: Vec<char> = candidate.chars().collect();

    let low = prefix_len.saturating_sub(max_distance);
    let high = min(prefix_len + max_distance, candidate_chars.len());

    (low..=high).any(|len| {
        let head: String = candidate_chars[..len].iter().collect();
        levenshtein_distance_threshold(&head, prefix, max_distance).is_some()
    })
}
