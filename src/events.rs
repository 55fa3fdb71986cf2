// ABOUTME: Domain events emitted after committed state changes
// ABOUTME: Fire-and-forget broadcast; delivery never affects a committed transition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::CancellationKind;
use crate::money::Money;

/// Events collaborators (notification dispatchers, audit sinks) may
/// subscribe to. Emitted strictly after the corresponding write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingConfirmed {
        booking_id: Uuid,
        athlete_id: Uuid,
        trainer_id: Uuid,
        at: DateTime<Utc>,
    },
    BookingCancelled {
        booking_id: Uuid,
        cancelled_by: Uuid,
        kind: CancellationKind,
        at: DateTime<Utc>,
    },
    BookingCompleted {
        booking_id: Uuid,
        trainer_id: Uuid,
        platform_fee: Money,
        net_amount: Money,
        at: DateTime<Utc>,
    },
    ReviewSubmitted {
        review_id: Uuid,
        booking_id: Uuid,
        reviewee_id: Uuid,
        rating: u8,
        at: DateTime<Utc>,
    },
}

/// Broadcast fan-out for domain events.
///
/// Publishing is fire-and-forget: no subscribers, or a subscriber that has
/// lagged past the channel capacity, never surfaces as an error to the
/// write path.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus retaining up to `capacity` undelivered events per
    /// subscriber before older ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to whoever is listening
    pub fn publish(&self, event: DomainEvent) {
        if let Err(err) = self.sender.send(event) {
            // send fails only when no receiver exists
            debug!(event = ?err.0, "no subscribers for domain event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
