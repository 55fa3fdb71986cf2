// ABOUTME: ReviewRecord linking a post-completion review to a booking
// ABOUTME: Immutable once created; one review per (booking, reviewer) pair
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;

/// Valid review ratings are whole stars from 1 to 5.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A review one party left for the other after a completed session.
///
/// `reviewee_id` is always the counterparty of `reviewer_id` on the
/// referenced booking. Records are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReviewRecord {
    /// Build a review, enforcing the rating range and distinct parties.
    ///
    /// # Errors
    /// Returns `InvalidRating` outside [1, 5], `InvalidParties` when
    /// reviewer and reviewee are the same account.
    pub fn new(
        booking_id: Uuid,
        reviewer_id: Uuid,
        reviewee_id: Uuid,
        rating: u8,
        text: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        validate_rating(rating)?;
        if reviewer_id == reviewee_id {
            return Err(EngineError::InvalidParties);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            booking_id,
            reviewer_id,
            reviewee_id,
            rating,
            text,
            created_at: now,
        })
    }
}

/// Range check shared by the record constructor and the submission path,
/// which rejects bad ratings before any store access.
///
/// # Errors
/// Returns `InvalidRating` outside [1, 5].
pub fn validate_rating(rating: u8) -> Result<(), EngineError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(EngineError::InvalidRating(rating))
    }
}
