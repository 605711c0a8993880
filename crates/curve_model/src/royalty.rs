//! Royalty percentages and the royalty adjustment layer
//!
//! Percentages use the on-chain encoding: a `u32` numerator over
//! `u32::MAX`, so `u32::MAX` is exactly 100%. Adjustments are applied as the
//! exact rational `num / den` with one truncation, never through a rounded
//! decimal intermediate.
//!
//! - Buying: `gross_up(amount, pct) = amount / (1 - pct)`
//! - Selling: `net_of(amount, pct) = amount * (1 - pct)`

use crate::{CurveError, FixedPoint, Result, ROYALTY_DENOMINATOR};

/// Royalty fraction, `raw / u32::MAX`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RoyaltyPercentage(u32);

impl RoyaltyPercentage {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(ROYALTY_DENOMINATOR);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// From a human percentage in `[0, 100]`, truncating toward zero
    pub fn from_percent(percent: FixedPoint) -> Result<Self> {
        let hundred = FixedPoint::from_int(100);
        if percent.is_negative() || percent > hundred {
            return Err(CurveError::InvalidRoyalty);
        }
        let raw = percent
            .mul_div(ROYALTY_DENOMINATOR as u128, 100)?
            .raw()
            / crate::SCALE;
        Ok(Self(raw as u32))
    }

    /// Back to a human percentage (truncated to 12 fractional digits)
    pub fn as_percent(self) -> Result<FixedPoint> {
        FixedPoint::from_int(100).mul_div(self.0 as u128, ROYALTY_DENOMINATOR as u128)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `1 - pct` numerator
    #[inline]
    fn complement(self) -> u128 {
        (ROYALTY_DENOMINATOR - self.0) as u128
    }
}

/// The four independent royalties a curve charges
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Royalties {
    pub buy_base: RoyaltyPercentage,
    pub buy_target: RoyaltyPercentage,
    pub sell_base: RoyaltyPercentage,
    pub sell_target: RoyaltyPercentage,
}

impl Royalties {
    pub const NONE: Self = Self {
        buy_base: RoyaltyPercentage::ZERO,
        buy_target: RoyaltyPercentage::ZERO,
        sell_base: RoyaltyPercentage::ZERO,
        sell_target: RoyaltyPercentage::ZERO,
    };
}

/// `amount / (1 - pct)`; a 100% royalty is rejected instead of dividing by zero
pub fn gross_up(amount: FixedPoint, pct: RoyaltyPercentage) -> Result<FixedPoint> {
    if pct == RoyaltyPercentage::FULL {
        return Err(CurveError::InvalidRoyalty);
    }
    if pct.is_zero() {
        return Ok(amount);
    }
    amount.mul_div(ROYALTY_DENOMINATOR as u128, pct.complement())
}

/// `amount * (1 - pct)`
pub fn net_of(amount: FixedPoint, pct: RoyaltyPercentage) -> Result<FixedPoint> {
    if pct.is_zero() {
        return Ok(amount);
    }
    amount.mul_div(pct.complement(), ROYALTY_DENOMINATOR as u128)
}
