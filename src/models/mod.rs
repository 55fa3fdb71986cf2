// ABOUTME: Domain records for the booking and settlement engine
// ABOUTME: BookingRecord, ReviewRecord and the supporting enums and value types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

/// Booking record, lifecycle status and time-window types
pub mod booking;

/// Post-completion review records
pub mod review;

pub use booking::{
    Actor, BookingAction, BookingRecord, BookingStatus, Cancellation, CancellationKind, Sport,
    TimeWindow, TrainerProfile,
};
pub use review::ReviewRecord;
