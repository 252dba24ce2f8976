//! Period-over-period comparison

use std::collections::HashMap;
use std::hash::Hash;

/// Signed whole-percent change from `previous` to `current`.
///
/// A zero baseline yields 100 for any growth and 0 otherwise. Halves round
/// toward positive infinity, so -2.5 becomes -2.
pub fn percent_difference(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }

    let change = (current - previous) / previous * 100.0;
    (change + 0.5).floor() as i64
}

/// Pairs every current row with the first previous row sharing its key.
///
/// Output follows `current` exactly: keys found only in `previous` are
/// dropped.
pub fn join_by_key<'a, R, K, F>(
    current: &'a [R],
    previous: &'a [R],
    key: F,
) -> Vec<(&'a R, Option<&'a R>)>
where
    K: Eq + Hash,
    F: Fn(&'a R) -> K,
{
    let mut by_key: HashMap<K, &'a R> = HashMap::with_capacity(previous.len());
    for row in previous {
        by_key.entry(key(row)).or_insert(row);
    }

    current
        .iter()
        .map(|row| (row, by_key.get(&key(row)).copied()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_difference_from_zero_baseline() {
        assert_eq!(percent_difference(0.0, 0.0), 0);
        assert_eq!(percent_difference(5.0, 0.0), 100);
    }

    #[test]
    fn test_percent_difference_growth_and_decline() {
        assert_eq!(percent_difference(150.0, 100.0), 50);
        assert_eq!(percent_difference(50.0, 100.0), -50);
        assert_eq!(percent_difference(0.0, 40.0), -100);
        assert_eq!(percent_difference(1.0, 3.0), -67);
    }

    #[test]
    fn test_percent_difference_rounds_halves_up() {
        assert_eq!(percent_difference(201.0, 200.0), 1);
        assert_eq!(percent_difference(195.0, 200.0), -2);
    }

    struct Row {
        key: &'static str,
        clicks: u64,
    }

    #[test]
    fn test_join_is_driven_by_current_rows() {
        let current = [Row { key: "a", clicks: 5 }];
        let previous = [Row { key: "a", clicks: 3 }, Row { key: "b", clicks: 10 }];

        let joined = join_by_key(&current, &previous, |r| r.key);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0.key, "a");
        assert_eq!(joined[0].1.map(|r| r.clicks), Some(3));
    }

    #[test]
    fn test_join_uses_first_previous_match() {
        let current = [Row { key: "a", clicks: 1 }, Row { key: "c", clicks: 2 }];
        let previous = [Row { key: "a", clicks: 7 }, Row { key: "a", clicks: 9 }];

        let joined = join_by_key(&current, &previous, |r| r.key);
        assert_eq!(joined[0].1.map(|r| r.clicks), Some(7));
        assert!(joined[1].1.is_none());
    }
}
