use serde::Serialize;

use crate::normalize::{comparison_key, display_form};
use crate::reference::ReferenceSet;

/// How a proposed name was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Comparison key found verbatim in the reference map.
    Exact,
    /// Nearest reference entry within the threshold.
    Fuzzy,
    /// Nothing close enough; the raw name's display form.
    Uncorrected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub confidence: Confidence,
    /// Distance to the nearest reference key, `None` when the set is empty.
    pub distance: Option<usize>,
}

/// Levenshtein distance over chars, unit cost for insert, delete and
/// substitute. Keeps a single DP row sized to the shorter input.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let insertion = prev[j + 1] + 1;
            let deletion = curr[j] + 1;
            let substitution = prev[j] + usize::from(lc != sc);
            curr[j + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Resolve `raw` against `reference`.
///
/// Exact key hits win outright. Otherwise the entry with the smallest
/// distance is taken if it is within `threshold`; on equal distance the
/// shorter comparison key wins, and on equal length the first key in
/// sorted order. That tie-break is a convention, not a domain rule.
pub fn best_match(raw: &str, reference: &ReferenceSet, threshold: usize) -> Match {
    let key = comparison_key(raw);

    if let Some(display) = reference.display_for(&key) {
        return Match {
            name: display.to_string(),
            confidence: Confidence::Exact,
            distance: Some(0),
        };
    }

    // Nothing comparable to measure against.
    if key.is_empty() {
        return Match {
            name: display_form(raw),
            confidence: Confidence::Uncorrected,
            distance: None,
        };
    }

    let mut best: Option<(usize, &str, &str)> = None;
    for (candidate_key, display) in reference.entries() {
        let distance = levenshtein(&key, candidate_key);
        let better = match best {
            None => true,
            Some((best_distance, best_key, _)) => {
                distance < best_distance
                    || (distance == best_distance && candidate_key.len() < best_key.len())
            }
        };
        if better {
            best = Some((distance, candidate_key, display));
        }
    }

    match best {
        Some((distance, _, display)) if distance <= threshold => Match {
            name: display.to_string(),
            confidence: Confidence::Fuzzy,
            distance: Some(distance),
        },
        _ => Match {
            name: display_form(raw),
            confidence: Confidence::Uncorrected,
            distance: best.map(|(d, _, _)| d),
        },
    }
}
