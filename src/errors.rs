// ABOUTME: Unified error taxonomy for the booking engine
// ABOUTME: Stable machine-readable reason codes with HTTP mapping and wire envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! # Unified Error Handling
//!
//! Every failure the engine can produce is a typed `EngineError` variant
//! carrying a stable machine-readable [`ErrorCode`]. Callers distinguish
//! four classes via [`ErrorKind`]: validation failures (rejected before any
//! store access), policy failures (business rules), concurrency conflicts
//! (expected, retryable), and infrastructure failures (retryable, detail
//! never leaked on the wire).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{BookingAction, BookingStatus, Sport};
use crate::money::MoneyError;

/// Broad classification of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Bad input shape or range, rejected before touching the store
    Validation,
    /// Business-rule violation; the request is well-formed but not allowed
    Policy,
    /// Optimistic-concurrency conflict; re-read and retry
    Concurrency,
    /// Store or runtime trouble; retry later
    Infrastructure,
}

/// Stable wire codes for every engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "INVALID_WINDOW")]
    InvalidWindow,
    #[serde(rename = "INVALID_RATING")]
    InvalidRating,
    #[serde(rename = "INVALID_PARTIES")]
    InvalidParties,
    #[serde(rename = "INVALID_PRICE")]
    InvalidPrice,
    #[serde(rename = "UNSUPPORTED_SPORT")]
    UnsupportedSport,
    #[serde(rename = "SLOT_CONFLICT")]
    SlotConflict,
    #[serde(rename = "DUPLICATE_REQUEST")]
    DuplicateRequest,
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition,
    #[serde(rename = "NOT_A_PARTY")]
    NotAParty,
    #[serde(rename = "BOOKING_NOT_FOUND")]
    BookingNotFound,
    #[serde(rename = "BOOKING_NOT_COMPLETED")]
    BookingNotCompleted,
    #[serde(rename = "DUPLICATE_REVIEW")]
    DuplicateReview,
    #[serde(rename = "ALREADY_SETTLED")]
    AlreadySettled,
    #[serde(rename = "VERSION_CONFLICT")]
    VersionConflict,
    #[serde(rename = "STORE_UNAVAILABLE")]
    StoreUnavailable,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    /// HTTP status a transport layer should map this code to
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidWindow | Self::InvalidRating | Self::InvalidParties
            | Self::InvalidPrice => 400,
            Self::BookingNotFound => 404,
            Self::UnsupportedSport
            | Self::InvalidTransition
            | Self::NotAParty
            | Self::BookingNotCompleted => 422,
            Self::SlotConflict
            | Self::DuplicateRequest
            | Self::DuplicateReview
            | Self::AlreadySettled
            | Self::VersionConflict => 409,
            Self::StoreUnavailable => 503,
            Self::Internal => 500,
        }
    }
}

/// Typed failure surface of the engine.
///
/// Display strings are safe for end users; infrastructure variants carry no
/// internal detail in their message (it is logged at the point of failure
/// instead).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("requested window is invalid: {0}")]
    InvalidWindow(String),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("athlete and trainer must be two distinct accounts")]
    InvalidParties,

    #[error("booking price must be positive")]
    InvalidPrice,

    #[error("trainer does not offer {0}")]
    UnsupportedSport(Sport),

    #[error("trainer already has a booking overlapping the requested window")]
    SlotConflict,

    #[error("athlete already has an overlapping request with this trainer")]
    DuplicateRequest,

    #[error("cannot {action} a booking in status {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    InvalidTransition {
        status: BookingStatus,
        action: BookingAction,
        detail: Option<String>,
    },

    #[error("actor is not a party to this booking")]
    NotAParty,

    #[error("booking not found")]
    BookingNotFound,

    #[error("booking is not completed")]
    BookingNotCompleted,

    #[error("a review for this booking by this reviewer already exists")]
    DuplicateReview,

    #[error("booking has already been settled")]
    AlreadySettled,

    #[error("booking was modified concurrently, re-read and retry")]
    VersionConflict,

    #[error("record store is temporarily unavailable, try again")]
    StoreUnavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Shorthand for an invalid transition without extra detail
    #[must_use]
    pub fn invalid_transition(status: BookingStatus, action: BookingAction) -> Self {
        Self::InvalidTransition {
            status,
            action,
            detail: None,
        }
    }

    /// Invalid transition with a human-readable explanation
    #[must_use]
    pub fn invalid_transition_because(
        status: BookingStatus,
        action: BookingAction,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            status,
            action,
            detail: Some(detail.into()),
        }
    }

    /// Stable wire code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidWindow(_) => ErrorCode::InvalidWindow,
            Self::InvalidRating(_) => ErrorCode::InvalidRating,
            Self::InvalidParties => ErrorCode::InvalidParties,
            Self::InvalidPrice => ErrorCode::InvalidPrice,
            Self::UnsupportedSport(_) => ErrorCode::UnsupportedSport,
            Self::SlotConflict => ErrorCode::SlotConflict,
            Self::DuplicateRequest => ErrorCode::DuplicateRequest,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::NotAParty => ErrorCode::NotAParty,
            Self::BookingNotFound => ErrorCode::BookingNotFound,
            Self::BookingNotCompleted => ErrorCode::BookingNotCompleted,
            Self::DuplicateReview => ErrorCode::DuplicateReview,
            Self::AlreadySettled => ErrorCode::AlreadySettled,
            Self::VersionConflict => ErrorCode::VersionConflict,
            Self::StoreUnavailable => ErrorCode::StoreUnavailable,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Taxonomy class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWindow(_)
            | Self::InvalidRating(_)
            | Self::InvalidParties
            | Self::InvalidPrice => ErrorKind::Validation,
            Self::UnsupportedSport(_)
            | Self::SlotConflict
            | Self::DuplicateRequest
            | Self::InvalidTransition { .. }
            | Self::NotAParty
            | Self::BookingNotFound
            | Self::BookingNotCompleted
            | Self::DuplicateReview
            | Self::AlreadySettled => ErrorKind::Policy,
            Self::VersionConflict => ErrorKind::Concurrency,
            Self::StoreUnavailable | Self::Internal(_) => ErrorKind::Infrastructure,
        }
    }

    /// True when the caller may retry the same request unchanged
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Concurrency | ErrorKind::Infrastructure
        )
    }

    /// HTTP status a transport layer should use
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }
}

impl From<MoneyError> for EngineError {
    fn from(err: MoneyError) -> Self {
        // Currency mixing and overflow inside the engine are programming or
        // data errors, not caller mistakes.
        Self::Internal(err.to_string())
    }
}

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Wire envelope for reporting a failure to external callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&EngineError> for ErrorResponse {
    fn from(error: &EngineError) -> Self {
        // Infrastructure detail stays in the logs.
        let message = match error {
            EngineError::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        };
        Self {
            code: error.code(),
            kind: error.kind(),
            message,
            retryable: error.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_wire_strings() {
        let json = serde_json::to_string(&ErrorCode::SlotConflict).unwrap();
        assert_eq!(json, "\"SLOT_CONFLICT\"");
        let json = serde_json::to_string(&ErrorCode::VersionConflict).unwrap();
        assert_eq!(json, "\"VERSION_CONFLICT\"");
    }

    #[test]
    fn test_taxonomy_classification() {
        assert_eq!(EngineError::InvalidRating(9).kind(), ErrorKind::Validation);
        assert_eq!(EngineError::SlotConflict.kind(), ErrorKind::Policy);
        assert_eq!(EngineError::VersionConflict.kind(), ErrorKind::Concurrency);
        assert_eq!(
            EngineError::StoreUnavailable.kind(),
            ErrorKind::Infrastructure
        );
    }

    #[test]
    fn test_retryable_flags() {
        assert!(EngineError::VersionConflict.is_retryable());
        assert!(EngineError::StoreUnavailable.is_retryable());
        assert!(!EngineError::SlotConflict.is_retryable());
        assert!(!EngineError::InvalidRating(0).is_retryable());
    }

    #[test]
    fn test_internal_detail_not_leaked_in_response() {
        let err = EngineError::Internal("connection refused at 10.0.0.3".into());
        let response = ErrorResponse::from(&err);
        assert!(!response.message.contains("10.0.0.3"));
        assert!(response.retryable);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(EngineError::InvalidRating(0).http_status(), 400);
        assert_eq!(EngineError::BookingNotFound.http_status(), 404);
        assert_eq!(EngineError::SlotConflict.http_status(), 409);
        assert_eq!(EngineError::StoreUnavailable.http_status(), 503);
    }
}
