//! Review domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TripmateError;

/// A star rating, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = TripmateError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(TripmateError::validation(format!(
                "rating must be an integer between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

/// Numeric strings such as `"4"` are accepted; fractions are not.
impl FromStr for Rating {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: i64 = s
            .trim()
            .parse()
            .map_err(|_| TripmateError::validation(format!("rating is not an integer: {s:?}")))?;
        Rating::try_from(parsed)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub reviewee_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateReview {
    pub rating: Option<Rating>,
    pub comment: Option<String>,
}

/// Reviews received by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub user_id: Uuid,
    pub count: usize,
    pub average_rating: Option<f64>,
    pub reviews: Vec<Review>,
}

impl ReviewSummary {
    pub fn from_reviews(user_id: Uuid, reviews: Vec<Review>) -> Self {
        let count = reviews.len();
        let average_rating = (count > 0).then(|| {
            let total: u32 = reviews.iter().map(|r| u32::from(r.rating.value())).sum();
            f64::from(total) / count as f64
        });
        Self {
            user_id,
            count,
            average_rating,
            reviews,
        }
    }
}
