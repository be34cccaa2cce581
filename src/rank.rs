use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Highest,
    Lowest,
}

/// The extremal item by `metric`. On ties the first occurrence wins, so the
/// caller's ordering decides. Items with a NaN metric are never picked.
/// Returns `None` for empty input.
pub fn top_by_metric<T, F>(items: &[T], metric: F, direction: Direction) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let m = metric(item);
        if m.is_nan() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, cur)) => match direction {
                Direction::Highest => m > cur,
                Direction::Lowest => m < cur,
            },
        };
        if better {
            best = Some((item, m));
        }
    }
    best.map(|(item, _)| item)
}

/// First `n` entries of an already ordered leaderboard.
pub fn top_n<T>(items: &[T], n: usize) -> &[T] {
    &items[..n.min(items.len())]
}
