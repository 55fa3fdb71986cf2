// ABOUTME: Matching request resolver turning an athlete request into a pending booking
// ABOUTME: Ordered capability, overlap and duplicate checks plus rate-based pricing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! Match-request resolution.
//!
//! The checks here are pure and run in contract order (first failure wins):
//! window preconditions, sport capability, trainer-slot overlap, duplicate
//! athlete request. The authoritative overlap claim is the store's atomic
//! create; these functions decide what rejection the caller sees, the store
//! decides who wins a race.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::models::{BookingRecord, Sport, TimeWindow, TrainerProfile};
use crate::money::Money;

/// Validate the requested window shape and timing.
///
/// # Errors
/// `InvalidWindow` when the duration is zero or the start is not strictly
/// in the future.
pub fn validate_window(window: &TimeWindow, now: DateTime<Utc>) -> EngineResult<()> {
    if window.duration_minutes == 0 {
        return Err(EngineError::InvalidWindow(
            "duration must be positive".into(),
        ));
    }
    if window.start <= now {
        return Err(EngineError::InvalidWindow(
            "start time must be in the future".into(),
        ));
    }
    Ok(())
}

/// Classify conflicts between the requested window and the trainer's
/// existing bookings.
///
/// An overlap with another athlete's booking is a `SlotConflict`; an
/// overlap with the requesting athlete's own booking for this trainer is a
/// `DuplicateRequest`. Cancelled bookings hold no slot and are ignored.
///
/// # Errors
/// `SlotConflict` or `DuplicateRequest` as above.
pub fn check_conflicts(
    existing: &[BookingRecord],
    athlete_id: Uuid,
    window: &TimeWindow,
) -> EngineResult<()> {
    let mut own_overlap = false;
    for booking in existing {
        if !booking.status.holds_slot() || !booking.window.overlaps(window) {
            continue;
        }
        if booking.athlete_id == athlete_id {
            own_overlap = true;
        } else {
            return Err(EngineError::SlotConflict);
        }
    }
    if own_overlap {
        return Err(EngineError::DuplicateRequest);
    }
    Ok(())
}

/// Price a session from the trainer's hourly rate, minute-proportional,
/// rounding half-to-even at minor-unit precision.
///
/// # Errors
/// Internal error on money overflow.
pub fn price_for(hourly_rate: Money, duration_minutes: u32) -> EngineResult<Money> {
    Ok(hourly_rate.scale(i64::from(duration_minutes), 60)?)
}

/// Run the full resolution pipeline and build the pending booking.
///
/// `existing` must be the trainer's current bookings; the caller commits
/// the result through the store's atomic slot-claiming create, which
/// re-checks the overlap under its own guard.
///
/// # Errors
/// Precondition and policy failures in contract order: `InvalidWindow`,
/// `UnsupportedSport`, `SlotConflict`, `DuplicateRequest`, then record
/// invariant violations from construction.
pub fn resolve(
    trainer: &TrainerProfile,
    existing: &[BookingRecord],
    athlete_id: Uuid,
    sport: Sport,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> EngineResult<BookingRecord> {
    validate_window(&window, now)?;
    if !trainer.offers(sport) {
        return Err(EngineError::UnsupportedSport(sport));
    }
    check_conflicts(existing, athlete_id, &window)?;
    let price = price_for(trainer.hourly_rate, window.duration_minutes)?;
    let booking = BookingRecord::new(athlete_id, trainer.trainer_id, sport, window, price, now)?;
    debug!(
        booking_id = %booking.id,
        trainer_id = %trainer.trainer_id,
        athlete_id = %athlete_id,
        %sport,
        price = %price,
        "match request resolved to pending booking"
    );
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use chrono::Duration;
    use std::collections::HashSet;

    fn trainer_profile(rate_major: i64) -> TrainerProfile {
        TrainerProfile {
            trainer_id: Uuid::new_v4(),
            sports: HashSet::from([Sport::Tennis, Sport::Running]),
            hourly_rate: Money::from_major(rate_major, Currency::Usd),
        }
    }

    fn window_in(now: DateTime<Utc>, hours: i64, duration: u32) -> TimeWindow {
        TimeWindow {
            start: now + Duration::hours(hours),
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_past_start_rejected() {
        let now = Utc::now();
        let window = TimeWindow {
            start: now - Duration::minutes(1),
            duration_minutes: 60,
        };
        assert!(matches!(
            validate_window(&window, now),
            Err(EngineError::InvalidWindow(_))
        ));
        // a start exactly at "now" is not strictly in the future
        let window = TimeWindow {
            start: now,
            duration_minutes: 60,
        };
        assert!(validate_window(&window, now).is_err());
    }

    #[test]
    fn test_unsupported_sport_rejected_before_conflicts() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let err = resolve(
            &trainer,
            &[],
            Uuid::new_v4(),
            Sport::Yoga,
            window_in(now, 2, 60),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedSport(Sport::Yoga)));
    }

    #[test]
    fn test_hourly_rate_times_duration() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let booking = resolve(
            &trainer,
            &[],
            Uuid::new_v4(),
            Sport::Tennis,
            window_in(now, 2, 60),
            now,
        )
        .unwrap();
        assert_eq!(booking.price, Money::from_major(80, Currency::Usd));

        let half_hour = resolve(
            &trainer,
            &[],
            Uuid::new_v4(),
            Sport::Tennis,
            window_in(now, 5, 30),
            now,
        )
        .unwrap();
        assert_eq!(half_hour.price, Money::from_major(40, Currency::Usd));
    }

    #[test]
    fn test_other_athletes_overlap_is_slot_conflict() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let athlete_a = Uuid::new_v4();
        let athlete_b = Uuid::new_v4();
        let taken = BookingRecord::new(
            athlete_a,
            trainer.trainer_id,
            Sport::Tennis,
            window_in(now, 2, 60),
            Money::from_major(80, Currency::Usd),
            now,
        )
        .unwrap();

        let err = resolve(
            &trainer,
            std::slice::from_ref(&taken),
            athlete_b,
            Sport::Tennis,
            window_in(now, 2, 60),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::SlotConflict));
    }

    #[test]
    fn test_own_overlap_is_duplicate_request() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let athlete = Uuid::new_v4();
        let existing = BookingRecord::new(
            athlete,
            trainer.trainer_id,
            Sport::Tennis,
            window_in(now, 2, 60),
            Money::from_major(80, Currency::Usd),
            now,
        )
        .unwrap();

        let err = resolve(
            &trainer,
            std::slice::from_ref(&existing),
            athlete,
            Sport::Tennis,
            window_in(now, 2, 60),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateRequest));
    }

    #[test]
    fn test_cancelled_bookings_do_not_block() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let mut cancelled = BookingRecord::new(
            Uuid::new_v4(),
            trainer.trainer_id,
            Sport::Tennis,
            window_in(now, 2, 60),
            Money::from_major(80, Currency::Usd),
            now,
        )
        .unwrap();
        cancelled.status = crate::models::BookingStatus::Cancelled;

        let booking = resolve(
            &trainer,
            std::slice::from_ref(&cancelled),
            Uuid::new_v4(),
            Sport::Tennis,
            window_in(now, 2, 60),
            now,
        )
        .unwrap();
        assert_eq!(booking.version, 0);
    }

    #[test]
    fn test_non_overlapping_request_accepted() {
        let now = Utc::now();
        let trainer = trainer_profile(80);
        let existing = BookingRecord::new(
            Uuid::new_v4(),
            trainer.trainer_id,
            Sport::Tennis,
            window_in(now, 2, 60),
            Money::from_major(80, Currency::Usd),
            now,
        )
        .unwrap();

        // back to back with the existing session
        let window = TimeWindow {
            start: existing.window.end(),
            duration_minutes: 60,
        };
        assert!(resolve(
            &trainer,
            std::slice::from_ref(&existing),
            Uuid::new_v4(),
            Sport::Running,
            window,
            now,
        )
        .is_ok());
    }
}
