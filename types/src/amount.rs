//! Coin amounts in minor units.
//!
//! Amounts are signed 64-bit integers of the smallest unit, matching the
//! chain's consensus representation. One coin is `COIN` minor units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Minor units per whole coin.
pub const COIN: i64 = 100_000_000;

/// An amount of coin in minor units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Whole coins to minor units.
    pub fn from_coin(coins: i64) -> Self {
        Self(coins * COIN)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// Renders whole-coin notation, e.g. `12.5` for 1_250_000_000 minor units.
/// Used in log and error messages, never on the wire.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / COIN as u64;
        let frac = abs % COIN as u64;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let frac = format!("{:08}", frac);
            write!(f, "{}{}.{}", sign, whole, frac.trim_end_matches('0'))
        }
    }
}
