// ABOUTME: BookingRecord and the enums describing a scheduled training session
// ABOUTME: Status, action, sport, time window and trainer profile definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::EngineError;
use crate::money::Money;

/// Sport categories a trainer can offer
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Tennis,
    Running,
    Swimming,
    Cycling,
    Soccer,
    Basketball,
    Boxing,
    Climbing,
    Yoga,
    StrengthTraining,
}

impl Display for Sport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Tennis => "tennis",
            Self::Running => "running",
            Self::Swimming => "swimming",
            Self::Cycling => "cycling",
            Self::Soccer => "soccer",
            Self::Basketball => "basketball",
            Self::Boxing => "boxing",
            Self::Climbing => "climbing",
            Self::Yoga => "yoga",
            Self::StrengthTraining => "strength_training",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Sport {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tennis" => Ok(Self::Tennis),
            "running" => Ok(Self::Running),
            "swimming" => Ok(Self::Swimming),
            "cycling" => Ok(Self::Cycling),
            "soccer" => Ok(Self::Soccer),
            "basketball" => Ok(Self::Basketball),
            "boxing" => Ok(Self::Boxing),
            "climbing" => Ok(Self::Climbing),
            "yoga" => Ok(Self::Yoga),
            "strength_training" => Ok(Self::StrengthTraining),
            other => Err(EngineError::Internal(format!("unknown sport: {other}"))),
        }
    }
}

/// A session time window: start instant plus duration in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl TimeWindow {
    /// Build a window, rejecting zero-length durations
    ///
    /// # Errors
    /// Returns `InvalidWindow` when `duration_minutes` is zero.
    pub fn new(start: DateTime<Utc>, duration_minutes: u32) -> Result<Self, EngineError> {
        if duration_minutes == 0 {
            return Err(EngineError::InvalidWindow(
                "duration must be positive".into(),
            ));
        }
        Ok(Self {
            start,
            duration_minutes,
        })
    }

    /// Exclusive end instant of the window
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// True when the two windows share any instant.
    ///
    /// End instants are exclusive: a 10:00-11:00 session does not overlap
    /// an 11:00-12:00 one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Disputed,
}

impl BookingStatus {
    /// Terminal statuses never regress to an earlier one.
    ///
    /// `Completed` still admits the dispute action inside the dispute
    /// window; it is terminal with respect to the session itself.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Disputed)
    }

    /// Statuses that hold a claim on the trainer's calendar slot
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
        };
        write!(f, "{name}")
    }
}

impl FromStr for BookingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "disputed" => Ok(Self::Disputed),
            other => Err(EngineError::Internal(format!(
                "unknown booking status: {other}"
            ))),
        }
    }
}

/// Actions a caller can request against a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
    Dispute,
}

impl Display for BookingAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Dispute => "dispute",
        };
        write!(f, "{name}")
    }
}

/// Who is requesting a lifecycle action.
///
/// `System` is the automated completion sweep; it is never a party to the
/// booking and may only complete sessions whose window has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Party(Uuid),
    System,
}

/// How a booking was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancellationKind {
    /// Cancelled outside the late-cancellation cutoff
    Standard,
    /// Cancelled after confirmation, inside the cutoff window before start.
    /// Recorded for audit; never blocks the cancellation itself.
    Late,
}

/// Audit metadata kept on a cancelled booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub kind: CancellationKind,
    pub cancelled_by: Uuid,
    pub cancelled_at: DateTime<Utc>,
}

/// Trainer data the resolver needs: offered sports and the hourly rate.
///
/// Owned by the external users service; passed in as plain data on every
/// resolve call rather than looked up through ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerProfile {
    pub trainer_id: Uuid,
    pub sports: HashSet<Sport>,
    pub hourly_rate: Money,
}

impl TrainerProfile {
    /// Whether the trainer offers the given sport
    #[must_use]
    pub fn offers(&self, sport: Sport) -> bool {
        self.sports.contains(&sport)
    }
}

/// A scheduled, paid training session between one athlete and one trainer.
///
/// Created by the resolver in `Pending` status, mutated only through the
/// lifecycle state machine, settled exactly once on completion, never
/// deleted. The `version` counter backs optimistic concurrency: every
/// committed mutation increments it and stale writers are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub trainer_id: Uuid,
    pub sport: Sport,
    pub window: TimeWindow,
    pub status: BookingStatus,
    pub price: Money,
    pub platform_fee: Option<Money>,
    pub net_amount: Option<Money>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl BookingRecord {
    /// Build a new pending booking, enforcing the record invariants.
    ///
    /// # Errors
    /// Returns `InvalidParties` when athlete and trainer are the same
    /// account, `InvalidPrice` when the price is not strictly positive.
    pub fn new(
        athlete_id: Uuid,
        trainer_id: Uuid,
        sport: Sport,
        window: TimeWindow,
        price: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if athlete_id == trainer_id {
            return Err(EngineError::InvalidParties);
        }
        if !price.is_positive() {
            return Err(EngineError::InvalidPrice);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            athlete_id,
            trainer_id,
            sport,
            window,
            status: BookingStatus::Pending,
            price,
            platform_fee: None,
            net_amount: None,
            cancellation: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            version: 0,
        })
    }

    /// Session start instant
    #[must_use]
    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.window.start
    }

    /// True when the given account is one of the two parties
    #[must_use]
    pub fn is_party(&self, account_id: Uuid) -> bool {
        account_id == self.athlete_id || account_id == self.trainer_id
    }

    /// The counterparty of the given account, if the account is a party
    #[must_use]
    pub fn other_party(&self, account_id: Uuid) -> Option<Uuid> {
        if account_id == self.athlete_id {
            Some(self.trainer_id)
        } else if account_id == self.trainer_id {
            Some(self.athlete_id)
        } else {
            None
        }
    }

    /// True once settlement has written the fee split
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.platform_fee.is_some()
    }
}
