// ABOUTME: Main library entry point for the TrainLink booking engine
// ABOUTME: Owns booking lifecycle, settlement, reviews and earnings projections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

#![deny(unsafe_code)]

//! # TrainLink Engine
//!
//! The booking and settlement lifecycle engine for a two-sided marketplace
//! connecting athletes with sports trainers. The engine owns:
//!
//! - **Resolution**: turning a match request into a priced pending booking,
//!   with an atomic claim on the trainer's calendar slot
//! - **Lifecycle**: the `pending → confirmed → completed | cancelled`
//!   state machine (plus post-completion disputes), with per-action actor
//!   authorization
//! - **Settlement**: the one-time, policy-driven split of a booking price
//!   into platform fee and trainer net, frozen at completion
//! - **Reviews**: one post-completion review per party per booking
//! - **Projections**: recomputable earnings and rating read models
//!
//! Identity, notification delivery, matching heuristics and the persistence
//! backend are external collaborators. Storage is abstracted behind the
//! [`store::BookingStore`] and [`store::ReviewStore`] traits; writes use
//! optimistic concurrency, and the bundled [`store::InMemoryStore`]
//! provides the full conditional-write semantics for embedding and tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use trainlink_engine::config::EngineConfig;
//! use trainlink_engine::engine::BookingEngine;
//! use trainlink_engine::models::{Sport, TimeWindow, TrainerProfile};
//! use trainlink_engine::money::{Currency, Money};
//! use trainlink_engine::store::InMemoryStore;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = BookingEngine::new(Arc::new(InMemoryStore::new()), EngineConfig::from_env());
//!     let trainer = TrainerProfile {
//!         trainer_id: Uuid::new_v4(),
//!         sports: HashSet::from([Sport::Tennis]),
//!         hourly_rate: Money::from_major(80, Currency::Usd),
//!     };
//!     let window = TimeWindow::new(Utc::now() + Duration::hours(24), 60)?;
//!     let booking = engine
//!         .resolve_request(&trainer, Uuid::new_v4(), Sport::Tennis, window)
//!         .await?;
//!     println!("booked {} for {}", booking.id, booking.price);
//!     Ok(())
//! }
//! ```

/// Read-model projections for earnings and ratings
pub mod aggregation;

/// Engine configuration from environment variables
pub mod config;

/// The `BookingEngine` facade collaborators call
pub mod engine;

/// Unified error taxonomy with stable reason codes
pub mod errors;

/// Domain events and the broadcast bus
pub mod events;

/// Booking lifecycle state machine
pub mod lifecycle;

/// Structured logging setup
pub mod logging;

/// Domain records: bookings, reviews and their value types
pub mod models;

/// Fixed-point money with round-half-to-even scaling
pub mod money;

/// Match-request resolution
pub mod resolver;

/// Post-completion review linkage
pub mod reviews;

/// Fee policies and settlement computation
pub mod settlement;

/// Store abstraction and the in-memory provider
pub mod store;

pub use engine::{BookingEngine, SweepReport};
pub use errors::{EngineError, EngineResult, ErrorCode, ErrorKind};
pub use models::{
    Actor, BookingAction, BookingRecord, BookingStatus, ReviewRecord, Sport, TimeWindow,
    TrainerProfile,
};
pub use money::{Currency, Money};
