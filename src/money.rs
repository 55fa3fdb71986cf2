// ABOUTME: Fixed-point currency value type backed by integer minor units
// ABOUTME: Provides checked arithmetic and round-half-to-even scaling for fee math
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TrainLink

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by `Money` arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Arithmetic across two different currencies
    #[error("currency mismatch: {0} vs {1}")]
    CurrencyMismatch(Currency, Currency),
    /// Result does not fit in the minor-unit integer range
    #[error("amount overflow")]
    Overflow,
}

/// Supported settlement currencies
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Cad,
}

impl Currency {
    /// Number of decimal digits in the currency's minor unit
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Usd | Self::Eur | Self::Gbp | Self::Cad => 2,
        }
    }

    /// ISO 4217 alphabetic code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.code())
    }
}

/// A monetary amount stored as an integer count of minor units (cents).
///
/// All scaling operations round half-to-even at the currency's minor-unit
/// precision so that fee computation carries no systematic bias across many
/// transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Build from a count of minor units (e.g. cents)
    #[must_use]
    pub const fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Build from whole major units (e.g. `from_major(80, Usd)` is $80.00)
    #[must_use]
    pub fn from_major(major: i64, currency: Currency) -> Self {
        let scale = 10_i64.pow(currency.minor_units());
        Self {
            minor: major.saturating_mul(scale),
            currency,
        }
    }

    /// Zero in the given currency
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Minor-unit count
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    /// Currency of this amount
    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// True when strictly greater than zero
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor > 0
    }

    /// True when exactly zero
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.minor == 0
    }

    /// Checked addition
    ///
    /// # Errors
    /// Returns `CurrencyMismatch` for mixed currencies, `Overflow` when the
    /// sum leaves the minor-unit range.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        let minor = self
            .minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self { minor, ..self })
    }

    /// Checked subtraction
    ///
    /// # Errors
    /// Returns `CurrencyMismatch` for mixed currencies, `Overflow` when the
    /// difference leaves the minor-unit range.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        let minor = self
            .minor
            .checked_sub(other.minor)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self { minor, ..self })
    }

    /// Apply a basis-point rate (1 bps = 0.01%), rounding half-to-even at
    /// minor-unit precision.
    ///
    /// # Errors
    /// Returns `Overflow` when the scaled amount leaves the minor-unit range.
    pub fn apply_rate_bps(self, rate_bps: u32) -> Result<Self, MoneyError> {
        let minor = scale_round_half_even(self.minor, i64::from(rate_bps), 10_000)?;
        Ok(Self { minor, ..self })
    }

    /// Scale by an integer ratio (`amount * numerator / denominator`),
    /// rounding half-to-even. Used for minute-proportional pricing.
    ///
    /// # Errors
    /// Returns `Overflow` when the scaled amount leaves the minor-unit range,
    /// or when `denominator` is zero.
    pub fn scale(self, numerator: i64, denominator: i64) -> Result<Self, MoneyError> {
        let minor = scale_round_half_even(self.minor, numerator, denominator)?;
        Ok(Self { minor, ..self })
    }

    fn require_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch(self.currency, other.currency))
        }
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency == other.currency {
            Some(self.minor.cmp(&other.minor))
        } else {
            None
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let scale = 10_u64.pow(self.currency.minor_units());
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let major = abs / scale;
        let frac = abs % scale;
        let width = self.currency.minor_units() as usize;
        write!(f, "{sign}{major}.{frac:0width$} {}", self.currency)
    }
}

/// `value * numerator / denominator` with banker's rounding.
///
/// Intermediate math runs in i128 so `i64::MAX * 10_000` cannot overflow.
fn scale_round_half_even(value: i64, numerator: i64, denominator: i64) -> Result<i64, MoneyError> {
    if denominator == 0 {
        return Err(MoneyError::Overflow);
    }
    let rounded = div_round_half_even(
        i128::from(value) * i128::from(numerator),
        i128::from(denominator),
    );
    i64::try_from(rounded).map_err(|_| MoneyError::Overflow)
}

/// Integer division rounding half-to-even.
pub(crate) fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    let denominator = if denominator < 0 {
        // Normalize so the remainder comparison below works on one sign case.
        return div_round_half_even(-numerator, -denominator);
    } else {
        denominator
    };
    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    match (remainder * 2).cmp(&denominator) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal => {
            if quotient % 2 == 0 {
                quotient
            } else {
                quotient + 1
            }
        }
    }
}
