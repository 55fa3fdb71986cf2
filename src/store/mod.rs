// ABOUTME: Durable record store abstraction for bookings and reviews
// ABOUTME: Versioned compare-and-swap writes, atomic slot claims, range queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! Store abstraction layer.
//!
//! All store implementations provide the same conditional-write semantics:
//! creates atomically claim the trainer's calendar slot, updates are
//! compare-and-swap on the record `version`, and review creation enforces
//! the one-per-(booking, reviewer) uniqueness key. The engine never holds a
//! lock across store calls; conflicts come back as typed errors.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::models::{BookingRecord, BookingStatus, ReviewRecord};

pub mod memory;

pub use memory::InMemoryStore;

/// Failures surfaced by store providers.
///
/// Providers translate backend-specific errors into these variants so the
/// engine can tell a lost race from an outage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("booking {0} not found")]
    NotFound(Uuid),

    #[error("version conflict on booking {booking_id}: expected {expected}, stored {actual}")]
    VersionConflict {
        booking_id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("active booking already claims an overlapping slot for trainer {trainer_id}")]
    SlotTaken { trainer_id: Uuid },

    #[error("review already exists for booking {booking_id} by reviewer {reviewer_id}")]
    DuplicateReview {
        booking_id: Uuid,
        reviewer_id: Uuid,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::BookingNotFound,
            StoreError::VersionConflict { .. } => Self::VersionConflict,
            StoreError::SlotTaken { .. } => Self::SlotConflict,
            StoreError::DuplicateReview { .. } => Self::DuplicateReview,
            StoreError::Unavailable(detail) => {
                tracing::warn!(error = %detail, "record store unavailable");
                Self::StoreUnavailable
            }
        }
    }
}

/// Durable booking storage with optimistic-concurrency writes
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new booking, atomically claiming the trainer's slot.
    ///
    /// The overlap check against the trainer's existing non-cancelled
    /// bookings and the insert happen under one guard; two concurrent
    /// creates for overlapping windows cannot both succeed.
    ///
    /// # Errors
    /// `SlotTaken` when an active booking already overlaps the window.
    async fn create_booking(&self, booking: &BookingRecord) -> Result<(), StoreError>;

    /// Fetch a booking by id
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<BookingRecord>, StoreError>;

    /// Compare-and-swap update: commits `booking` only when the stored
    /// version still equals `expected_version`, bumping the version by one.
    /// Returns the committed record.
    ///
    /// # Errors
    /// `VersionConflict` when a concurrent writer advanced the record,
    /// `NotFound` when the id does not exist.
    async fn update_booking(
        &self,
        booking: &BookingRecord,
        expected_version: u64,
    ) -> Result<BookingRecord, StoreError>;

    /// All bookings where the given account is the trainer
    async fn bookings_for_trainer(
        &self,
        trainer_id: Uuid,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// All bookings where the given account is the athlete
    async fn bookings_for_athlete(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// All bookings currently in the given status
    async fn bookings_with_status(
        &self,
        status: BookingStatus,
    ) -> Result<Vec<BookingRecord>, StoreError>;
}

/// Durable review storage
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a review, enforcing the (booking, reviewer) uniqueness key
    /// atomically.
    ///
    /// # Errors
    /// `DuplicateReview` when the reviewer already reviewed this booking.
    async fn create_review(&self, review: &ReviewRecord) -> Result<(), StoreError>;

    /// All reviews naming the given account as reviewee
    async fn reviews_for_reviewee(
        &self,
        reviewee_id: Uuid,
    ) -> Result<Vec<ReviewRecord>, StoreError>;

    /// All reviews attached to the given booking
    async fn reviews_for_booking(&self, booking_id: Uuid)
        -> Result<Vec<ReviewRecord>, StoreError>;
}
