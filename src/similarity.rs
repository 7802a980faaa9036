//! Approximate string matching.
//!
//! Scores are Ratcliff/Obershelp ratios as produced by sequence-matching diff
//! algorithms: `2 * M / T`, where `T` is the total length of both strings and
//! `M` is the number of characters in the matching blocks found by repeatedly
//! taking the longest common substring and recursing on both sides of it.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Candidate that scored at or above the cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub value: &'a str,
    pub score: f64,
}

/// Similarity of `a` and `b` in `0.0..=1.0`. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a = a.chars().collect::<Vec<_>>();
    let b = b.chars().collect::<Vec<_>>();
    score(matching_chars(&a, &b), a.len() + b.len())
}

fn score(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}

/// Upper bound on `ratio` from lengths alone.
fn real_quick_ratio(a: &[char], b: &[char]) -> f64 {
    score(a.len().min(b.len()), a.len() + b.len())
}

/// Upper bound on `ratio` from shared characters, ignoring order.
fn quick_ratio(a: &[char], b: &[char]) -> f64 {
    let mut avail = HashMap::<char, usize>::new();
    for c in b {
        *avail.entry(*c).or_default() += 1;
    }
    let mut matches = 0;
    for c in a {
        if let Some(n) = avail.get_mut(c) {
            if *n > 0 {
                *n -= 1;
                matches += 1;
            }
        }
    }
    score(matches, a.len() + b.len())
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut b2j = HashMap::<char, Vec<usize>>::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges.
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // j2len[j] = length of the match ending at a[i - 1] and b[j]
    let mut j2len = HashMap::<usize, usize>::new();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| j2len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next;
    }
    (best_i, best_j, best_k)
}

/// Best `n` candidates scoring at least `cutoff` against `word`, best first.
/// Each candidate is scored as `ratio(candidate, word)`.
///
/// Comparison is case-insensitive: both sides are lowercased before scoring.
/// Equal scores are ordered by candidate. Duplicated candidates are scored once.
pub fn close_matches<'a, I>(word: &str, candidates: I, n: usize, cutoff: f64) -> Vec<Match<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    if n == 0 {
        return Vec::new();
    }

    let word = word.to_lowercase().chars().collect::<Vec<_>>();
    let mut seen = std::collections::HashSet::new();
    let mut matches = candidates
        .into_iter()
        .filter(|value| seen.insert(*value))
        .filter_map(|value| {
            let folded = value.to_lowercase().chars().collect::<Vec<_>>();
            if real_quick_ratio(&folded, &word) < cutoff || quick_ratio(&folded, &word) < cutoff {
                return None;
            }
            let score = score(matching_chars(&folded, &word), folded.len() + word.len());
            if score >= cutoff {
                Some(Match { value, score })
            } else {
                None
            }
        })
        .collect::<Vec<_>>();

    matches.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| x.value.cmp(y.value))
    });
    matches.truncate(n);
    matches
}
