//! Customer reviews of completed bookings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, CustomerId, MechanicId, ReviewId};

/// Longest accepted review comment.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Raised for star ratings outside `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct RatingOutOfRange(pub u8);

/// A one-to-five star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Result<Self, RatingOutOfRange> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(RatingOutOfRange(stars))
        }
    }

    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub mechanic_id: MechanicId,
    pub customer_id: CustomerId,
    pub rating: Rating,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn accepts_bounds(#[case] stars: u8) {
        assert_eq!(Rating::new(stars).map(Rating::stars), Ok(stars));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn rejects_out_of_range(#[case] stars: u8) {
        assert_eq!(Rating::new(stars), Err(RatingOutOfRange(stars)));
    }

    #[rstest]
    fn deserialisation_validates() {
        assert!(serde_json::from_str::<Rating>("7").is_err());
        assert_eq!(
            serde_json::from_str::<Rating>("4").expect("valid rating").stars(),
            4
        );
    }
}
