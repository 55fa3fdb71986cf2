// ABOUTME: Settlement calculator splitting a booking price into fee and net
// ABOUTME: Configuration-driven fee policies with round-half-to-even money math
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::models::BookingRecord;
use crate::money::Money;

/// One tier of a tiered fee schedule.
///
/// The rate applies to the whole price when the price is at most
/// `up_to_minor` (in minor units); `None` marks the catch-all top tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBracket {
    pub up_to_minor: Option<i64>,
    pub rate_bps: u32,
}

/// How the platform fee is derived from a booking price.
///
/// The rule is configuration, not code: deployments pick a variant in
/// `EngineConfig` and numeric behavior follows without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeePolicy {
    /// Flat percentage of the price, expressed in basis points
    Percentage { rate_bps: u32 },
    /// Rate picked by the bracket the price falls into. Brackets are
    /// checked in order; the first with `up_to_minor >= price` wins.
    Tiered { brackets: Vec<FeeBracket> },
    /// Fixed amount (minor units, same currency as the price) plus a
    /// percentage. The combined fee is capped at the price.
    FlatPlusPercentage { flat_minor: i64, rate_bps: u32 },
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::Percentage { rate_bps: 1500 }
    }
}

impl FeePolicy {
    /// Platform fee for the given price under this policy.
    ///
    /// Rounds half-to-even at minor-unit precision and clamps the result
    /// into `[0, price]`.
    ///
    /// # Errors
    /// Returns an internal error when the scaled amount overflows.
    pub fn fee_for(&self, price: Money) -> EngineResult<Money> {
        let raw = match self {
            Self::Percentage { rate_bps } => price.apply_rate_bps(*rate_bps)?,
            Self::Tiered { brackets } => {
                let rate = brackets
                    .iter()
                    .find(|bracket| {
                        bracket
                            .up_to_minor
                            .map_or(true, |limit| price.minor() <= limit)
                    })
                    .map_or(0, |bracket| bracket.rate_bps);
                price.apply_rate_bps(rate)?
            }
            Self::FlatPlusPercentage {
                flat_minor,
                rate_bps,
            } => {
                let percentage = price.apply_rate_bps(*rate_bps)?;
                percentage.checked_add(Money::from_minor(*flat_minor, price.currency()))?
            }
        };
        let clamped = raw
            .minor()
            .clamp(0, price.minor());
        Ok(Money::from_minor(clamped, price.currency()))
    }
}

/// The frozen outcome of settling one booking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub platform_fee: Money,
    pub net_amount: Money,
}

/// Split a price into platform fee and trainer net.
///
/// Pure function of the price and the policy; `net + fee == price` holds
/// for every policy because the net is derived by subtraction.
///
/// # Errors
/// Returns an internal error on money overflow.
pub fn settle(price: Money, policy: &FeePolicy) -> EngineResult<Settlement> {
    let platform_fee = policy.fee_for(price)?;
    let net_amount = price.checked_sub(platform_fee)?;
    Ok(Settlement {
        platform_fee,
        net_amount,
    })
}

/// Write the settlement split onto a booking exactly once.
///
/// # Errors
/// Returns `AlreadySettled` when the fee fields were already written.
pub fn apply_settlement(booking: &mut BookingRecord, policy: &FeePolicy) -> EngineResult<Settlement> {
    if booking.is_settled() {
        return Err(EngineError::AlreadySettled);
    }
    let settlement = settle(booking.price, policy)?;
    booking.platform_fee = Some(settlement.platform_fee);
    booking.net_amount = Some(settlement.net_amount);
    Ok(settlement)
}
