// ABOUTME: Shared helpers for engine integration tests
// ABOUTME: Engine construction, trainer profiles and booked fixtures

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use trainlink_engine::config::EngineConfig;
use trainlink_engine::engine::BookingEngine;
use trainlink_engine::models::{Actor, BookingAction, BookingRecord, Sport, TimeWindow, TrainerProfile};
use trainlink_engine::money::{Currency, Money};
use trainlink_engine::store::InMemoryStore;
use uuid::Uuid;

pub fn engine() -> BookingEngine<InMemoryStore> {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> BookingEngine<InMemoryStore> {
    BookingEngine::new(Arc::new(InMemoryStore::new()), config)
}

pub fn trainer(rate_major: i64, sports: &[Sport]) -> TrainerProfile {
    TrainerProfile {
        trainer_id: Uuid::new_v4(),
        sports: sports.iter().copied().collect::<HashSet<_>>(),
        hourly_rate: Money::from_major(rate_major, Currency::Usd),
    }
}

pub fn future_window(hours_from_now: i64, duration_minutes: u32) -> TimeWindow {
    TimeWindow {
        start: Utc::now() + Duration::hours(hours_from_now),
        duration_minutes,
    }
}

/// Resolve, confirm and complete a booking, returning the settled record.
pub async fn completed_booking(
    engine: &BookingEngine<InMemoryStore>,
    trainer_profile: &TrainerProfile,
    athlete_id: Uuid,
    window: TimeWindow,
) -> BookingRecord {
    let booking = engine
        .resolve_request(trainer_profile, athlete_id, Sport::Tennis, window)
        .await
        .unwrap();
    let confirmed = engine
        .transition(
            booking.id,
            Actor::Party(trainer_profile.trainer_id),
            BookingAction::Confirm,
            booking.version,
        )
        .await
        .unwrap();
    engine
        .transition_at(
            booking.id,
            Actor::Party(athlete_id),
            BookingAction::Complete,
            confirmed.version,
            window.end(),
        )
        .await
        .unwrap()
}
