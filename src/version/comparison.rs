//! Version comparison utilities.
//!
//! [`VersionComparator`] holds the zero-padding comparison that every ordering
//! decision in the updater goes through, plus helpers for picking the newest
//! item out of a discovered set.

use std::cmp::Ordering;

/// Static helpers for ordering dotted numeric versions.
pub struct VersionComparator;

impl VersionComparator {
    /// Compare two component sequences.
    ///
    /// The shorter sequence is padded with zeros to the longer length, then
    /// components are compared left to right and the first inequality decides.
    /// An empty sequence compares as all zeros.
    ///
    /// ```rust
    /// use prelaunch_cli::version::VersionComparator;
    /// use std::cmp::Ordering;
    ///
    /// assert_eq!(VersionComparator::compare(&[1, 2], &[1, 2, 0]), Ordering::Equal);
    /// assert_eq!(VersionComparator::compare(&[1, 10], &[1, 2]), Ordering::Greater);
    /// assert_eq!(VersionComparator::compare(&[], &[0, 0, 1]), Ordering::Less);
    /// ```
    #[must_use]
    pub fn compare(a: &[u64], b: &[u64]) -> Ordering {
        let len = a.len().max(b.len());
        for i in 0..len {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        Ordering::Equal
    }

    /// Sign form of [`compare`](Self::compare): `-1`, `0`, or `1`.
    #[must_use]
    pub fn compare_sign(a: &[u64], b: &[u64]) -> i32 {
        match Self::compare(a, b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Sort items newest first by the key's version.
    ///
    /// The sort is stable, so items with equal versions keep their original order.
    pub fn sort_newest_first<T, K>(items: &mut [T], key: K)
    where
        K: Fn(&T) -> &[u64],
    {
        items.sort_by(|a, b| Self::compare(key(b), key(a)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&[u64]] = &[
        &[],
        &[0],
        &[0, 0, 1],
        &[1],
        &[1, 0],
        &[1, 2],
        &[1, 2, 0],
        &[1, 2, 1],
        &[1, 10],
        &[2],
        &[10, 0],
    ];

    #[test]
    fn test_padding_equality() {
        assert_eq!(VersionComparator::compare(&[1, 2], &[1, 2, 0]), Ordering::Equal);
        assert_eq!(VersionComparator::compare_sign(&[1, 2], &[1, 2, 0]), 0);
        assert_eq!(VersionComparator::compare(&[], &[0, 0]), Ordering::Equal);
    }

    #[test]
    fn test_antisymmetry() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(
                    VersionComparator::compare_sign(a, b),
                    -VersionComparator::compare_sign(b, a),
                    "antisymmetry failed for {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_transitivity() {
        for a in SAMPLES {
            for b in SAMPLES {
                for c in SAMPLES {
                    let ab = VersionComparator::compare(a, b);
                    let bc = VersionComparator::compare(b, c);
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(
                            VersionComparator::compare(a, c),
                            Ordering::Greater,
                            "transitivity failed for {a:?} <= {b:?} <= {c:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_ranks_lowest() {
        for v in SAMPLES.iter().filter(|v| v.iter().any(|&c| c != 0)) {
            assert_eq!(VersionComparator::compare(&[], v), Ordering::Less);
        }
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut items = vec![
            ("a", vec![1, 2]),
            ("b", vec![1, 10]),
            ("c", vec![1, 2, 0]),
            ("d", vec![]),
        ];
        VersionComparator::sort_newest_first(&mut items, |(_, v)| v.as_slice());
        let order: Vec<_> = items.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }
}
