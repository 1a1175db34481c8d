//! Character-sequence similarity (Ratcliff/Obershelp gestalt matching).
//!
//! The score is `2 * M / T`, where `T` is the total number of characters in
//! both strings and `M` the number of characters in matching blocks found by
//! repeatedly taking the longest common substring and recursing on both
//! sides of it. Block selection and the popular-character rule for long
//! sequences follow Python's `difflib.SequenceMatcher`, so scores agree with
//! it to the last digit.

use std::collections::HashMap;

/// Sequences at least this long ignore characters making up more than 1% of
/// the second string when seeding matches.
const POPULAR_MIN_LEN: usize = 200;

/// Case-insensitive similarity ratio in `[0, 1]`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = Matcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    // Positions of each character in `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Total length of all matching blocks.
    fn matched_len(&self) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows. Ties
    /// go to the block starting earliest in `a`, then earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending_at.get(&prev))
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
            run_ending_at = next;
        }

        // Popular characters never seed a match but may still extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }
        (best_i, best_j, best_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn identical_and_empty() {
        assert_close(ratio("Villarreal CF", "Villarreal CF"), 1.0);
        assert_close(ratio("", ""), 1.0);
        assert_close(ratio("abc", ""), 0.0);
    }

    #[test]
    fn ignores_case() {
        assert_close(ratio("GETAFE CF", "getafe cf"), 1.0);
        assert_close(ratio("athleticclub", "Athletic Club"), 0.96);
    }

    #[test]
    fn matches_difflib_scores() {
        assert_close(ratio("Villarreal CF", "Villarreal"), 20.0 / 23.0);
        assert_close(ratio("Villarreal CF", "Real Madrid CF"), 14.0 / 27.0);
        assert_close(ratio("Real Madrid", "Real Madrid CF"), 0.88);
        assert_close(ratio("Atlético de Madrid", "Atletico Madrid"), 28.0 / 33.0);
        assert_close(ratio("Sevilla FC", "Villarreal CF"), 14.0 / 23.0);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_close(ratio("Deportivo Alavés", "Deportivo Alaves"), 30.0 / 32.0);
    }

    #[test]
    fn block_boundaries() {
        assert_close(ratio("abcdefghij", "abcdefgxyz"), 0.7);
        assert_close(ratio("abcdefg", "abcdexy"), 10.0 / 14.0);
    }

    #[test]
    fn not_symmetric_in_general() {
        assert_close(ratio("Sociedad", "Villarreal"), 1.0 / 3.0);
        assert_close(ratio("Villarreal", "Sociedad"), 2.0 / 9.0);
    }
}
