// ABOUTME: Booking lifecycle state machine with per-action actor authorization
// ABOUTME: Pure transition planning; the engine commits outcomes via store CAS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! # Lifecycle State Machine
//!
//! Allowed progressions:
//!
//! ```text
//! pending --confirm--> confirmed          (trainer only)
//! pending --cancel---> cancelled          (either party)
//! confirmed --cancel-> cancelled          (either party, late flag inside cutoff)
//! confirmed --complete-> completed        (either party or sweep, after session end)
//! completed --dispute-> disputed          (either party, inside dispute window)
//! ```
//!
//! Planning is pure: [`plan_transition`] inspects a record and returns the
//! updated copy (or an idempotent no-op) without touching storage. The
//! engine commits the plan with a compare-and-swap on the version the
//! caller read, so a stale plan can never clobber a concurrent writer.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::errors::{EngineError, EngineResult};
use crate::models::{
    Actor, BookingAction, BookingRecord, BookingStatus, Cancellation, CancellationKind,
};
use crate::settlement::{apply_settlement, FeePolicy};

/// Timing rules and the fee policy the state machine needs
#[derive(Debug, Clone)]
pub struct TransitionPolicy {
    /// Cancelling a confirmed booking inside this window before the session
    /// start is flagged as a late cancellation.
    pub late_cancellation_cutoff: Duration,
    /// Disputes are accepted this long after `completed_at`.
    pub dispute_window: Duration,
    /// Fee policy applied when a completion settles the booking.
    pub fee_policy: FeePolicy,
}

/// What a transition plan decided
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Commit this record via CAS on the version the plan was built from
    Changed(BookingRecord),
    /// The request was already applied; return the record unchanged.
    /// Covers retried completions from at-least-once sweep delivery.
    Unchanged,
}

/// Validate an action against a booking and produce the updated record.
///
/// # Errors
/// `NotAParty` when a party-scoped action comes from an outsider,
/// `InvalidTransition` for any (status, action) pair outside the table or
/// when a timing gate fails.
pub fn plan_transition(
    booking: &BookingRecord,
    actor: Actor,
    action: BookingAction,
    now: DateTime<Utc>,
    policy: &TransitionPolicy,
) -> EngineResult<TransitionOutcome> {
    match (booking.status, action) {
        (BookingStatus::Pending, BookingAction::Confirm) => confirm(booking, actor, now),
        (BookingStatus::Pending | BookingStatus::Confirmed, BookingAction::Cancel) => {
            cancel(booking, actor, now, policy)
        }
        (BookingStatus::Confirmed, BookingAction::Complete) => complete(booking, actor, now, policy),
        // retried completion sweeps are a no-op success, not an error
        (BookingStatus::Completed, BookingAction::Complete) => {
            debug!(booking_id = %booking.id, "completion retry on settled booking, no-op");
            Ok(TransitionOutcome::Unchanged)
        }
        (BookingStatus::Completed, BookingAction::Dispute) => dispute(booking, actor, now, policy),
        (status, action) => Err(EngineError::invalid_transition(status, action)),
    }
}

fn require_party(booking: &BookingRecord, actor: Actor) -> EngineResult<uuid::Uuid> {
    match actor {
        Actor::Party(id) if booking.is_party(id) => Ok(id),
        Actor::Party(_) | Actor::System => Err(EngineError::NotAParty),
    }
}

fn confirm(
    booking: &BookingRecord,
    actor: Actor,
    now: DateTime<Utc>,
) -> EngineResult<TransitionOutcome> {
    let actor_id = require_party(booking, actor)?;
    if actor_id != booking.trainer_id {
        return Err(EngineError::invalid_transition_because(
            booking.status,
            BookingAction::Confirm,
            "only the trainer can confirm",
        ));
    }
    let mut updated = booking.clone();
    updated.status = BookingStatus::Confirmed;
    updated.updated_at = now;
    debug!(booking_id = %booking.id, "booking confirmed");
    Ok(TransitionOutcome::Changed(updated))
}

fn cancel(
    booking: &BookingRecord,
    actor: Actor,
    now: DateTime<Utc>,
    policy: &TransitionPolicy,
) -> EngineResult<TransitionOutcome> {
    let actor_id = require_party(booking, actor)?;
    let late = booking.status == BookingStatus::Confirmed
        && now >= booking.scheduled_at() - policy.late_cancellation_cutoff;
    let kind = if late {
        CancellationKind::Late
    } else {
        CancellationKind::Standard
    };
    let mut updated = booking.clone();
    updated.status = BookingStatus::Cancelled;
    updated.cancellation = Some(Cancellation {
        kind,
        cancelled_by: actor_id,
        cancelled_at: now,
    });
    updated.updated_at = now;
    debug!(booking_id = %booking.id, late, "booking cancelled");
    Ok(TransitionOutcome::Changed(updated))
}

fn complete(
    booking: &BookingRecord,
    actor: Actor,
    now: DateTime<Utc>,
    policy: &TransitionPolicy,
) -> EngineResult<TransitionOutcome> {
    if let Actor::Party(_) = actor {
        require_party(booking, actor)?;
    }
    if now < booking.window.end() {
        return Err(EngineError::invalid_transition_because(
            booking.status,
            BookingAction::Complete,
            "session has not ended yet",
        ));
    }
    let mut updated = booking.clone();
    // Settlement is part of the same committed write; a completed booking
    // without fee fields can never be observed.
    let settlement = apply_settlement(&mut updated, &policy.fee_policy)?;
    updated.status = BookingStatus::Completed;
    updated.completed_at = Some(now);
    updated.updated_at = now;
    debug!(
        booking_id = %booking.id,
        fee = %settlement.platform_fee,
        net = %settlement.net_amount,
        "booking completed and settled"
    );
    Ok(TransitionOutcome::Changed(updated))
}

fn dispute(
    booking: &BookingRecord,
    actor: Actor,
    now: DateTime<Utc>,
    policy: &TransitionPolicy,
) -> EngineResult<TransitionOutcome> {
    require_party(booking, actor)?;
    let completed_at = booking.completed_at.ok_or_else(|| {
        EngineError::Internal("completed booking is missing completed_at".into())
    })?;
    if now > completed_at + policy.dispute_window {
        return Err(EngineError::invalid_transition_because(
            booking.status,
            BookingAction::Dispute,
            "dispute window has closed",
        ));
    }
    let mut updated = booking.clone();
    updated.status = BookingStatus::Disputed;
    updated.updated_at = now;
    debug!(booking_id = %booking.id, "booking disputed");
    Ok(TransitionOutcome::Changed(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sport, TimeWindow};
    use crate::money::{Currency, Money};
    use uuid::Uuid;

    fn policy() -> TransitionPolicy {
        TransitionPolicy {
            late_cancellation_cutoff: Duration::hours(24),
            dispute_window: Duration::hours(72),
            fee_policy: FeePolicy::Percentage { rate_bps: 1500 },
        }
    }

    struct Fixture {
        booking: BookingRecord,
        athlete: Uuid,
        trainer: Uuid,
        now: DateTime<Utc>,
    }

    fn fixture() -> Fixture {
        let athlete = Uuid::new_v4();
        let trainer = Uuid::new_v4();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let booking = BookingRecord::new(
            athlete,
            trainer,
            Sport::Tennis,
            TimeWindow {
                start: now + Duration::hours(48),
                duration_minutes: 60,
            },
            Money::from_major(80, Currency::Usd),
            now,
        )
        .unwrap();
        Fixture {
            booking,
            athlete,
            trainer,
            now,
        }
    }

    fn changed(outcome: TransitionOutcome) -> BookingRecord {
        match outcome {
            TransitionOutcome::Changed(record) => record,
            TransitionOutcome::Unchanged => panic!("expected a changed record"),
        }
    }

    #[test]
    fn test_only_trainer_confirms() {
        let f = fixture();
        let err = plan_transition(
            &f.booking,
            Actor::Party(f.athlete),
            BookingAction::Confirm,
            f.now,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));

        let confirmed = changed(
            plan_transition(
                &f.booking,
                Actor::Party(f.trainer),
                BookingAction::Confirm,
                f.now,
                &policy(),
            )
            .unwrap(),
        );
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_outsider_is_not_a_party() {
        let f = fixture();
        let err = plan_transition(
            &f.booking,
            Actor::Party(Uuid::new_v4()),
            BookingAction::Cancel,
            f.now,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotAParty));
    }

    #[test]
    fn test_either_party_cancels_pending_without_late_flag() {
        let f = fixture();
        for party in [f.athlete, f.trainer] {
            let cancelled = changed(
                plan_transition(
                    &f.booking,
                    Actor::Party(party),
                    BookingAction::Cancel,
                    f.now,
                    &policy(),
                )
                .unwrap(),
            );
            assert_eq!(cancelled.status, BookingStatus::Cancelled);
            let cancellation = cancelled.cancellation.unwrap();
            assert_eq!(cancellation.kind, CancellationKind::Standard);
            assert_eq!(cancellation.cancelled_by, party);
        }
    }

    #[test]
    fn test_late_cancellation_flagged_inside_cutoff() {
        let f = fixture();
        let mut confirmed = f.booking.clone();
        confirmed.status = BookingStatus::Confirmed;

        // 12h before a session with a 24h cutoff
        let late_now = f.booking.scheduled_at() - Duration::hours(12);
        let cancelled = changed(
            plan_transition(
                &confirmed,
                Actor::Party(f.athlete),
                BookingAction::Cancel,
                late_now,
                &policy(),
            )
            .unwrap(),
        );
        assert_eq!(
            cancelled.cancellation.unwrap().kind,
            CancellationKind::Late
        );

        // 48h out is a standard cancellation
        let early_now = f.booking.scheduled_at() - Duration::hours(48);
        let cancelled = changed(
            plan_transition(
                &confirmed,
                Actor::Party(f.athlete),
                BookingAction::Cancel,
                early_now,
                &policy(),
            )
            .unwrap(),
        );
        assert_eq!(
            cancelled.cancellation.unwrap().kind,
            CancellationKind::Standard
        );
    }

    #[test]
    fn test_completion_gated_on_session_end() {
        let f = fixture();
        let mut confirmed = f.booking.clone();
        confirmed.status = BookingStatus::Confirmed;

        let too_early = confirmed.window.end() - Duration::minutes(1);
        let err = plan_transition(
            &confirmed,
            Actor::Party(f.trainer),
            BookingAction::Complete,
            too_early,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));

        let done = changed(
            plan_transition(
                &confirmed,
                Actor::Party(f.trainer),
                BookingAction::Complete,
                confirmed.window.end(),
                &policy(),
            )
            .unwrap(),
        );
        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(done.platform_fee.unwrap().minor(), 1200);
        assert_eq!(done.net_amount.unwrap().minor(), 6800);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_sweep_actor_may_complete_but_not_confirm() {
        let f = fixture();
        let mut confirmed = f.booking.clone();
        confirmed.status = BookingStatus::Confirmed;

        let done = plan_transition(
            &confirmed,
            Actor::System,
            BookingAction::Complete,
            confirmed.window.end(),
            &policy(),
        )
        .unwrap();
        assert!(matches!(done, TransitionOutcome::Changed(_)));

        let err = plan_transition(
            &f.booking,
            Actor::System,
            BookingAction::Confirm,
            f.now,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NotAParty));
    }

    #[test]
    fn test_retried_completion_is_a_noop() {
        let f = fixture();
        let mut completed = f.booking.clone();
        completed.status = BookingStatus::Completed;
        completed.completed_at = Some(f.now);
        completed.platform_fee = Some(Money::from_minor(1200, Currency::Usd));
        completed.net_amount = Some(Money::from_minor(6800, Currency::Usd));

        let outcome = plan_transition(
            &completed,
            Actor::System,
            BookingAction::Complete,
            f.now + Duration::hours(1),
            &policy(),
        )
        .unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged);
    }

    #[test]
    fn test_dispute_window_enforced() {
        let f = fixture();
        let mut completed = f.booking.clone();
        completed.status = BookingStatus::Completed;
        completed.completed_at = Some(f.now);
        completed.platform_fee = Some(Money::from_minor(1200, Currency::Usd));
        completed.net_amount = Some(Money::from_minor(6800, Currency::Usd));

        let inside = f.now + Duration::hours(71);
        let disputed = changed(
            plan_transition(
                &completed,
                Actor::Party(f.athlete),
                BookingAction::Dispute,
                inside,
                &policy(),
            )
            .unwrap(),
        );
        assert_eq!(disputed.status, BookingStatus::Disputed);

        let outside = f.now + Duration::hours(73);
        let err = plan_transition(
            &completed,
            Actor::Party(f.athlete),
            BookingAction::Dispute,
            outside,
            &policy(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn test_disallowed_pairs_fail_closed() {
        let f = fixture();
        let cases = [
            (BookingStatus::Pending, BookingAction::Complete),
            (BookingStatus::Pending, BookingAction::Dispute),
            (BookingStatus::Confirmed, BookingAction::Confirm),
            (BookingStatus::Confirmed, BookingAction::Dispute),
            (BookingStatus::Completed, BookingAction::Confirm),
            (BookingStatus::Completed, BookingAction::Cancel),
            (BookingStatus::Cancelled, BookingAction::Confirm),
            (BookingStatus::Cancelled, BookingAction::Cancel),
            (BookingStatus::Cancelled, BookingAction::Complete),
            (BookingStatus::Cancelled, BookingAction::Dispute),
            (BookingStatus::Disputed, BookingAction::Confirm),
            (BookingStatus::Disputed, BookingAction::Cancel),
            (BookingStatus::Disputed, BookingAction::Complete),
            (BookingStatus::Disputed, BookingAction::Dispute),
        ];
        for (status, action) in cases {
            let mut booking = f.booking.clone();
            booking.status = status;
            if status == BookingStatus::Completed {
                booking.completed_at = Some(f.now);
            }
            let err = plan_transition(
                &booking,
                Actor::Party(f.trainer),
                action,
                f.booking.window.end() + Duration::hours(1),
                &policy(),
            )
            .unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidTransition { .. }),
                "{status} + {action} must be rejected"
            );
        }
    }
}
