// ABOUTME: BookingEngine facade wiring config, store, state machine and events
// ABOUTME: Bounded-retry optimistic writes and timeout-wrapped store access
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! # Booking Engine
//!
//! The entry point collaborators call. Every mutation is a single
//! conditional write against the store: resolve claims the trainer slot
//! atomically, transitions commit via compare-and-swap on the version the
//! caller read, and settlement is written inside the completing write.
//! Domain events go out only after a write commits; failing to deliver one
//! never rolls anything back.
//!
//! The engine takes the acting account on every call. It holds no ambient
//! session state.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregation::{self, EarningsSummary, RatingSummary};
use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::events::{DomainEvent, EventBus};
use crate::lifecycle::{plan_transition, TransitionOutcome};
use crate::models::{
    Actor, BookingAction, BookingRecord, BookingStatus, ReviewRecord, Sport, TimeWindow,
    TrainerProfile,
};
use crate::resolver;
use crate::reviews::plan_review;
use crate::settlement::{self, Settlement};
use crate::store::{BookingStore, ReviewStore, StoreError};

/// Outcome of one automated completion sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bookings completed (including idempotent re-deliveries)
    pub completed: u64,
    /// Bookings that changed state concurrently and no longer qualify
    pub skipped: u64,
    /// Bookings that failed for infrastructure reasons and will be retried
    /// on the next sweep
    pub failed: u64,
}

/// The lifecycle engine. Cheap to clone; shares its store and event bus.
pub struct BookingEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
    events: EventBus,
}

impl<S> Clone for BookingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S> BookingEngine<S>
where
    S: BookingStore + ReviewStore,
{
    /// Build an engine over the given store
    #[must_use]
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        Self {
            store,
            config,
            events,
        }
    }

    /// Engine configuration in effect
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to domain events emitted after committed writes
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Resolve a match request into a pending booking, at the current time.
    ///
    /// # Errors
    /// `InvalidWindow`, `UnsupportedSport`, `SlotConflict`,
    /// `DuplicateRequest`, or store failures.
    pub async fn resolve_request(
        &self,
        trainer: &TrainerProfile,
        athlete_id: Uuid,
        sport: Sport,
        window: TimeWindow,
    ) -> EngineResult<BookingRecord> {
        self.resolve_request_at(trainer, athlete_id, sport, window, Utc::now())
            .await
    }

    /// [`resolve_request`](Self::resolve_request) with an explicit clock,
    /// for sweeps and tests.
    pub async fn resolve_request_at(
        &self,
        trainer: &TrainerProfile,
        athlete_id: Uuid,
        sport: Sport,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> EngineResult<BookingRecord> {
        // validation and capability run before any store access
        resolver::validate_window(&window, now)?;
        if !trainer.offers(sport) {
            return Err(EngineError::UnsupportedSport(sport));
        }

        let existing = self
            .store_call(self.store.bookings_for_trainer(trainer.trainer_id))
            .await?;
        let booking = resolver::resolve(trainer, &existing, athlete_id, sport, window, now)?;

        // The create re-checks the overlap under the store's own guard;
        // losing the race here comes back as a slot conflict.
        self.store_call(self.store.create_booking(&booking)).await?;
        info!(
            booking_id = %booking.id,
            trainer_id = %trainer.trainer_id,
            athlete_id = %athlete_id,
            price = %booking.price,
            "booking created"
        );
        Ok(booking)
    }

    /// Apply a lifecycle action using the version the caller read, at the
    /// current time. A stale version fails with `VersionConflict` and no
    /// mutation; the caller re-reads and retries.
    ///
    /// # Errors
    /// `BookingNotFound`, `NotAParty`, `InvalidTransition`,
    /// `VersionConflict`, or store failures.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        actor: Actor,
        action: BookingAction,
        expected_version: u64,
    ) -> EngineResult<BookingRecord> {
        self.transition_at(booking_id, actor, action, expected_version, Utc::now())
            .await
    }

    /// [`transition`](Self::transition) with an explicit clock
    pub async fn transition_at(
        &self,
        booking_id: Uuid,
        actor: Actor,
        action: BookingAction,
        expected_version: u64,
        now: DateTime<Utc>,
    ) -> EngineResult<BookingRecord> {
        let booking = self.fetch(booking_id).await?;
        if booking.version != expected_version {
            debug!(
                %booking_id,
                expected = expected_version,
                actual = booking.version,
                "stale version on transition request"
            );
            return Err(EngineError::VersionConflict);
        }
        self.apply(booking, actor, action, now).await
    }

    /// Apply a lifecycle action, re-reading and retrying up to the
    /// configured budget when a concurrent writer wins the race. Used by
    /// the sweep and by callers that do not track versions themselves.
    ///
    /// # Errors
    /// Same as [`transition`](Self::transition); `VersionConflict` only
    /// after the retry budget is spent.
    pub async fn transition_with_retry(
        &self,
        booking_id: Uuid,
        actor: Actor,
        action: BookingAction,
        now: DateTime<Utc>,
    ) -> EngineResult<BookingRecord> {
        let mut attempt = 0;
        loop {
            let booking = self.fetch(booking_id).await?;
            match self.apply(booking, actor, action, now).await {
                Err(EngineError::VersionConflict) if attempt < self.config.max_version_retries => {
                    attempt += 1;
                    debug!(%booking_id, attempt, "version conflict, re-reading");
                }
                other => return other,
            }
        }
    }

    /// Submit a review for a completed booking.
    ///
    /// # Errors
    /// `InvalidRating` (before any store access), `BookingNotFound`,
    /// `BookingNotCompleted`, `NotAParty`, `DuplicateReview`, or store
    /// failures.
    pub async fn submit_review(
        &self,
        booking_id: Uuid,
        reviewer_id: Uuid,
        rating: u8,
        text: Option<String>,
    ) -> EngineResult<ReviewRecord> {
        crate::models::review::validate_rating(rating)?;
        let now = Utc::now();
        let booking = self.fetch(booking_id).await?;
        let review = plan_review(&booking, reviewer_id, rating, text, now)?;
        self.store_call(self.store.create_review(&review)).await?;
        self.events.publish(DomainEvent::ReviewSubmitted {
            review_id: review.id,
            booking_id,
            reviewee_id: review.reviewee_id,
            rating,
            at: now,
        });
        Ok(review)
    }

    /// Compute the fee split for an unsettled booking under the configured
    /// policy, without committing anything.
    ///
    /// # Errors
    /// `AlreadySettled` when the booking's split is already frozen.
    pub fn settle(&self, booking: &BookingRecord) -> EngineResult<Settlement> {
        if booking.is_settled() {
            return Err(EngineError::AlreadySettled);
        }
        settlement::settle(booking.price, &self.config.fee_policy)
    }

    /// Lifetime and monthly earnings projection for a trainer.
    /// `local_offset` attributes sessions to the trainer's local calendar
    /// months; UTC when `None`.
    ///
    /// # Errors
    /// Store failures, or inconsistent settled records.
    pub async fn trainer_earnings(
        &self,
        trainer_id: Uuid,
        local_offset: Option<FixedOffset>,
    ) -> EngineResult<EarningsSummary> {
        let bookings = self
            .store_call(self.store.bookings_for_trainer(trainer_id))
            .await?;
        aggregation::trainer_earnings(
            trainer_id,
            &bookings,
            local_offset.unwrap_or_else(|| Utc.fix()),
        )
    }

    /// Average rating and star distribution for a trainer
    ///
    /// # Errors
    /// Store failures.
    pub async fn trainer_rating(&self, trainer_id: Uuid) -> EngineResult<RatingSummary> {
        let reviews = self
            .store_call(self.store.reviews_for_reviewee(trainer_id))
            .await?;
        Ok(aggregation::rating_summary(trainer_id, &reviews))
    }

    /// Complete every confirmed booking whose session has ended.
    ///
    /// Safe under at-least-once delivery: re-delivered completions are
    /// no-op successes, and bookings that changed state concurrently are
    /// skipped.
    ///
    /// # Errors
    /// Only when the confirmed-booking listing itself fails.
    pub async fn sweep_due_completions(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let confirmed = self
            .store_call(self.store.bookings_with_status(BookingStatus::Confirmed))
            .await?;
        let mut report = SweepReport::default();
        for booking in confirmed {
            if booking.window.end() > now {
                continue;
            }
            match self
                .transition_with_retry(booking.id, Actor::System, BookingAction::Complete, now)
                .await
            {
                Ok(_) => report.completed += 1,
                Err(
                    EngineError::InvalidTransition { .. }
                    | EngineError::BookingNotFound
                    | EngineError::VersionConflict,
                ) => {
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(booking_id = %booking.id, error = %err, "sweep completion failed");
                    report.failed += 1;
                }
            }
        }
        info!(
            completed = report.completed,
            skipped = report.skipped,
            failed = report.failed,
            "completion sweep finished"
        );
        Ok(report)
    }

    async fn fetch(&self, booking_id: Uuid) -> EngineResult<BookingRecord> {
        self.store_call(self.store.get_booking(booking_id))
            .await?
            .ok_or(EngineError::BookingNotFound)
    }

    async fn apply(
        &self,
        booking: BookingRecord,
        actor: Actor,
        action: BookingAction,
        now: DateTime<Utc>,
    ) -> EngineResult<BookingRecord> {
        let expected_version = booking.version;
        let policy = self.config.transition_policy();
        match plan_transition(&booking, actor, action, now, &policy)? {
            TransitionOutcome::Unchanged => Ok(booking),
            TransitionOutcome::Changed(updated) => {
                let committed = self
                    .store_call(self.store.update_booking(&updated, expected_version))
                    .await?;
                self.emit_for(&committed, action, now);
                Ok(committed)
            }
        }
    }

    fn emit_for(&self, committed: &BookingRecord, action: BookingAction, now: DateTime<Utc>) {
        match action {
            BookingAction::Confirm => self.events.publish(DomainEvent::BookingConfirmed {
                booking_id: committed.id,
                athlete_id: committed.athlete_id,
                trainer_id: committed.trainer_id,
                at: now,
            }),
            BookingAction::Cancel => {
                if let Some(cancellation) = committed.cancellation {
                    self.events.publish(DomainEvent::BookingCancelled {
                        booking_id: committed.id,
                        cancelled_by: cancellation.cancelled_by,
                        kind: cancellation.kind,
                        at: now,
                    });
                }
            }
            BookingAction::Complete => {
                if let (Some(platform_fee), Some(net_amount)) =
                    (committed.platform_fee, committed.net_amount)
                {
                    self.events.publish(DomainEvent::BookingCompleted {
                        booking_id: committed.id,
                        trainer_id: committed.trainer_id,
                        platform_fee,
                        net_amount,
                        at: now,
                    });
                }
            }
            // dispute resolution is external; no event contract yet
            BookingAction::Dispute => {}
        }
    }

    async fn store_call<T, F>(&self, call: F) -> EngineResult<T>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match timeout(self.config.store_timeout(), call).await {
            Ok(result) => result.map_err(EngineError::from),
            Err(_) => {
                warn!(
                    timeout_secs = self.config.store_timeout_secs,
                    "store call exceeded timeout"
                );
                Err(EngineError::StoreUnavailable)
            }
        }
    }
}
