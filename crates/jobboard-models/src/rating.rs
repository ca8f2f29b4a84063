//! Job ratings and the rating aggregate.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lowest accepted star rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: u8 = 5;

/// A single user's rating of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRating {
    pub user_id: String,
    /// 1-5 stars
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JobRating {
    pub fn new(user_id: impl Into<String>, rating: u8, comment: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            rating,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// Derived rating fields written next to the ratings array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub rating_count: u32,
}

/// Check a star value is within 1..=5.
pub fn validate_rating(rating: i64) -> Result<u8, String> {
    if (MIN_RATING as i64..=MAX_RATING as i64).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(format!(
            "Rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, rating
        ))
    }
}

/// Replace the entry for the same user in place, or append.
pub fn upsert_rating(ratings: &mut Vec<JobRating>, rating: JobRating) {
    match ratings.iter_mut().find(|r| r.user_id == rating.user_id) {
        Some(existing) => *existing = rating,
        None => ratings.push(rating),
    }
}

/// Mean of all ratings rounded half-up to one decimal; 0.0 for no ratings.
pub fn average_rating(ratings: &[JobRating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u64 = ratings.iter().map(|r| r.rating as u64).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

pub fn summarize(ratings: &[JobRating]) -> RatingSummary {
    RatingSummary {
        average_rating: average_rating(ratings),
        rating_count: ratings.len() as u32,
    }
}
