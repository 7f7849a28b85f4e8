use crate::domain::rating::{Aggregate, Rating};

/// Count and arithmetic mean of the scores.
///
/// An empty slice yields `{ count: 0, average: 0.0 }`. No rounding is applied.
pub fn aggregate(ratings: &[Rating]) -> Aggregate {
    if ratings.is_empty() {
        return Aggregate::empty();
    }

    let total: i64 = ratings.iter().map(|rating| i64::from(rating.score)).sum();
    let count = ratings.len() as i64;

    Aggregate {
        count,
        average: total as f64 / count as f64,
    }
}
