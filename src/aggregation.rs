// ABOUTME: Read-model projections for trainer earnings and ratings
// ABOUTME: Pure, re-runnable derivations over booking and review records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

//! # Earnings & Rating Aggregation
//!
//! Deterministic, side-effect-free projections over committed records.
//! Dashboards read these; they are recomputable at any time and are never
//! a source of truth. Monthly grouping uses an explicit `(year, month)`
//! key in the trainer's local offset rather than a formatted month string,
//! so ordering and equality never depend on locale.

use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EngineError, EngineResult};
use crate::models::{BookingRecord, BookingStatus, ReviewRecord};
use crate::money::{div_round_half_even, Currency, Money};

/// Earnings for one calendar month of completed sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEarnings {
    pub year: i32,
    pub month: u32,
    pub earnings: Money,
    pub fees: Money,
    pub net: Money,
    pub sessions: u64,
}

/// Lifetime earnings projection for one trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    pub trainer_id: Uuid,
    pub total_earnings: Money,
    pub total_fees: Money,
    pub net_earnings: Money,
    pub sessions: u64,
    /// Months in ascending `(year, month)` order
    pub monthly: Vec<MonthlyEarnings>,
}

/// Count and share of one star value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBucket {
    pub stars: u8,
    pub count: u64,
    pub percentage: f64,
}

/// Rating projection for one reviewee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub reviewee_id: Uuid,
    /// Mean rating rounded half-to-even to one decimal; `None` with no reviews
    pub average: Option<f64>,
    pub total_reviews: u64,
    /// Buckets for stars 1 through 5, always all five present
    pub distribution: Vec<RatingBucket>,
}

/// Project lifetime and monthly earnings for a trainer from completed
/// bookings. Bookings for other trainers or in other statuses are skipped.
///
/// `offset` is the trainer's local UTC offset used for month attribution;
/// the engine does not own user profiles, so callers pass it in (UTC when
/// absent).
///
/// # Errors
/// Internal error when completed bookings mix currencies or a settled
/// record is missing its fee fields.
pub fn trainer_earnings(
    trainer_id: Uuid,
    bookings: &[BookingRecord],
    offset: FixedOffset,
) -> EngineResult<EarningsSummary> {
    let completed: Vec<&BookingRecord> = bookings
        .iter()
        .filter(|b| b.trainer_id == trainer_id && b.status == BookingStatus::Completed)
        .collect();

    let currency = completed
        .first()
        .map_or(Currency::Usd, |b| b.price.currency());

    let mut total_earnings = Money::zero(currency);
    let mut total_fees = Money::zero(currency);
    let mut net_earnings = Money::zero(currency);
    let mut monthly: BTreeMap<(i32, u32), MonthlyEarnings> = BTreeMap::new();

    for booking in &completed {
        let fee = booking.platform_fee.ok_or_else(|| {
            EngineError::Internal(format!("completed booking {} has no fee", booking.id))
        })?;
        let net = booking.net_amount.ok_or_else(|| {
            EngineError::Internal(format!("completed booking {} has no net", booking.id))
        })?;

        total_earnings = total_earnings.checked_add(booking.price)?;
        total_fees = total_fees.checked_add(fee)?;
        net_earnings = net_earnings.checked_add(net)?;

        let local = booking.scheduled_at().with_timezone(&offset);
        let entry = monthly
            .entry((local.year(), local.month()))
            .or_insert_with(|| MonthlyEarnings {
                year: local.year(),
                month: local.month(),
                earnings: Money::zero(currency),
                fees: Money::zero(currency),
                net: Money::zero(currency),
                sessions: 0,
            });
        entry.earnings = entry.earnings.checked_add(booking.price)?;
        entry.fees = entry.fees.checked_add(fee)?;
        entry.net = entry.net.checked_add(net)?;
        entry.sessions += 1;
    }

    Ok(EarningsSummary {
        trainer_id,
        total_earnings,
        total_fees,
        net_earnings,
        sessions: completed.len() as u64,
        monthly: monthly.into_values().collect(),
    })
}

/// Project the average rating and star distribution for a reviewee.
/// Reviews naming a different reviewee are skipped.
#[must_use]
pub fn rating_summary(reviewee_id: Uuid, reviews: &[ReviewRecord]) -> RatingSummary {
    let mut counts = [0_u64; 5];
    let mut sum: u64 = 0;
    for review in reviews
        .iter()
        .filter(|r| r.reviewee_id == reviewee_id)
    {
        if (1..=5).contains(&review.rating) {
            counts[usize::from(review.rating) - 1] += 1;
            sum += u64::from(review.rating);
        }
    }
    let total: u64 = counts.iter().sum();

    let average = (total > 0).then(|| {
        // mean scaled to tenths, rounded half-to-even, back to f64
        let tenths = div_round_half_even(i128::from(sum) * 10, i128::from(total));
        tenths as f64 / 10.0
    });

    let distribution = counts
        .iter()
        .enumerate()
        .map(|(index, &count)| RatingBucket {
            stars: index as u8 + 1,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        })
        .collect();

    RatingSummary {
        reviewee_id,
        average,
        total_reviews: total,
        distribution,
    }
}
