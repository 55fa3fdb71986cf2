// ABOUTME: In-memory store provider backed by DashMap
// ABOUTME: Same conditional-write semantics a SQL backend gives via constraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{BookingRecord, BookingStatus, ReviewRecord, TimeWindow};

use super::{BookingStore, ReviewStore, StoreError};

/// One active booking's hold on a trainer's calendar
#[derive(Debug, Clone, Copy)]
struct SlotClaim {
    booking_id: Uuid,
    window: TimeWindow,
}

/// In-memory provider with the full conditional-write contract.
///
/// The slot index is a plain mutex held only for the duration of a claim
/// check-and-insert, which is what makes concurrent overlapping creates
/// lose deterministically. Record reads and CAS updates go through
/// `DashMap` shards and take no global lock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    bookings: DashMap<Uuid, BookingRecord>,
    trainer_slots: Mutex<HashMap<Uuid, Vec<SlotClaim>>>,
    reviews: DashMap<Uuid, ReviewRecord>,
    review_keys: DashMap<(Uuid, Uuid), Uuid>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slots_guard(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Vec<SlotClaim>>> {
        // A poisoned mutex means a panic mid-claim; the index may only be
        // missing removals, which is the conservative direction.
        self.trainer_slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn release_slot(&self, trainer_id: Uuid, booking_id: Uuid) {
        let mut slots = self.slots_guard();
        if let Some(claims) = slots.get_mut(&trainer_id) {
            claims.retain(|claim| claim.booking_id != booking_id);
            if claims.is_empty() {
                slots.remove(&trainer_id);
            }
        }
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<BookingRecord>
    where
        F: Fn(&BookingRecord) -> bool,
    {
        let mut records: Vec<BookingRecord> = self
            .bookings
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| (record.scheduled_at(), record.id));
        records
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn create_booking(&self, booking: &BookingRecord) -> Result<(), StoreError> {
        let mut slots = self.slots_guard();
        let claims = slots.entry(booking.trainer_id).or_default();
        if claims
            .iter()
            .any(|claim| claim.window.overlaps(&booking.window))
        {
            return Err(StoreError::SlotTaken {
                trainer_id: booking.trainer_id,
            });
        }
        claims.push(SlotClaim {
            booking_id: booking.id,
            window: booking.window,
        });
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<BookingRecord>, StoreError> {
        Ok(self.bookings.get(&booking_id).map(|r| r.value().clone()))
    }

    async fn update_booking(
        &self,
        booking: &BookingRecord,
        expected_version: u64,
    ) -> Result<BookingRecord, StoreError> {
        let committed = {
            let mut entry = self
                .bookings
                .get_mut(&booking.id)
                .ok_or(StoreError::NotFound(booking.id))?;
            if entry.version != expected_version {
                return Err(StoreError::VersionConflict {
                    booking_id: booking.id,
                    expected: expected_version,
                    actual: entry.version,
                });
            }
            let mut updated = booking.clone();
            updated.version = expected_version + 1;
            *entry.value_mut() = updated.clone();
            updated
        };
        // Claim release happens after the CAS commits; until then the slot
        // stays conservatively held.
        if !committed.status.holds_slot() {
            self.release_slot(committed.trainer_id, committed.id);
        }
        Ok(committed)
    }

    async fn bookings_for_trainer(
        &self,
        trainer_id: Uuid,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        Ok(self.collect_sorted(|record| record.trainer_id == trainer_id))
    }

    async fn bookings_for_athlete(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        Ok(self.collect_sorted(|record| record.athlete_id == athlete_id))
    }

    async fn bookings_with_status(
        &self,
        status: BookingStatus,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        Ok(self.collect_sorted(|record| record.status == status))
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn create_review(&self, review: &ReviewRecord) -> Result<(), StoreError> {
        match self
            .review_keys
            .entry((review.booking_id, review.reviewer_id))
        {
            Entry::Occupied(_) => Err(StoreError::DuplicateReview {
                booking_id: review.booking_id,
                reviewer_id: review.reviewer_id,
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(review.id);
                self.reviews.insert(review.id, review.clone());
                Ok(())
            }
        }
    }

    async fn reviews_for_reviewee(
        &self,
        reviewee_id: Uuid,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut records: Vec<ReviewRecord> = self
            .reviews
            .iter()
            .filter(|entry| entry.value().reviewee_id == reviewee_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        Ok(records)
    }

    async fn reviews_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let mut records: Vec<ReviewRecord> = self
            .reviews
            .iter()
            .filter(|entry| entry.value().booking_id == booking_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        Ok(records)
    }
}
