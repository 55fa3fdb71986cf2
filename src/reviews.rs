// ABOUTME: Review linkage validating post-completion reviews against a booking
// ABOUTME: Derives the reviewee as the counterparty and enforces the completed gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::models::{review::validate_rating, BookingRecord, BookingStatus, ReviewRecord};

/// Validate a review submission against its booking and build the record.
///
/// Rating range is a validation error checked before any store access (the
/// engine re-runs [`validate_rating`] up front); the remaining checks are
/// policy gates against the fetched booking. The reviewee is derived as
/// the counterparty, never supplied by the caller.
///
/// # Errors
/// `InvalidRating`, `BookingNotCompleted`, `NotAParty`. Duplicate detection
/// is left to the store's uniqueness key so it stays race-free.
pub fn plan_review(
    booking: &BookingRecord,
    reviewer_id: Uuid,
    rating: u8,
    text: Option<String>,
    now: DateTime<Utc>,
) -> EngineResult<ReviewRecord> {
    validate_rating(rating)?;
    if booking.status != BookingStatus::Completed {
        return Err(EngineError::BookingNotCompleted);
    }
    let reviewee_id = booking
        .other_party(reviewer_id)
        .ok_or(EngineError::NotAParty)?;
    let review = ReviewRecord::new(booking.id, reviewer_id, reviewee_id, rating, text, now)?;
    debug!(
        review_id = %review.id,
        booking_id = %booking.id,
        reviewer_id = %reviewer_id,
        rating,
        "review accepted for completed booking"
    );
    Ok(review)
}
