//! Fixed-point decimal arithmetic (12 fractional digits)
//!
//! A [`FixedPoint`] is an `i128` holding `value * 10^12`. Multiplication and
//! division widen to 256 bits so the only rounding is a single truncation
//! toward zero, matching settlement-engine rounding exactly. Every operation
//! that can leave the `i128` range returns [`CurveError::Overflow`].
//!
//! Decimal literals with more than 12 fractional digits are truncated (not
//! rounded) when parsed.

use core::fmt;
use core::str::FromStr;

use crate::{CurveError, Result, DECIMALS, LN_2_RAW, SCALE};

mod wide {
    uint::construct_uint! {
        /// 256-bit intermediate used for exact truncating mul/div.
        pub struct U256(4);
    }

    uint::construct_uint! {
        /// Holds `S^(pow+frac)` for rational powers before the root is taken.
        pub struct U1024(16);
    }
}

pub use wide::{U1024, U256};

/// Scaled-integer decimal with 12 fractional digits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FixedPoint(i128);

/// Split a raw value into sign and 256-bit magnitude
#[inline]
fn widen(raw: i128) -> (bool, U256) {
    (raw < 0, U256::from(raw.unsigned_abs()))
}

/// Recombine sign and magnitude, failing if the magnitude leaves i128
#[inline]
fn narrow(negative: bool, magnitude: U256) -> Result<FixedPoint> {
    if magnitude > U256::from(i128::MAX as u128) {
        return Err(CurveError::Overflow);
    }
    let value = magnitude.low_u128() as i128;
    Ok(FixedPoint(if negative { -value } else { value }))
}

fn wide_pow(base: U1024, exp: u32) -> Result<U1024> {
    let mut result = U1024::one();
    for _ in 0..exp {
        result = result.checked_mul(base).ok_or(CurveError::Overflow)?;
    }
    Ok(result)
}

/// `floor(value^(1/degree))` by integer Newton iteration from above
fn integer_root(value: U1024, degree: u32) -> Result<U1024> {
    if value.is_zero() || degree == 1 {
        return Ok(value);
    }
    let bits = value.bits() as u32;
    let mut x = U1024::one() << ((bits + degree - 1) / degree) as usize;
    let weight = U1024::from(degree - 1);
    loop {
        let next = (x * weight + value / wide_pow(x, degree - 1)?) / U1024::from(degree);
        if next >= x {
            return Ok(x);
        }
        x = next;
    }
}

#[inline]
fn pow10(exp: u32) -> i128 {
    10i128.pow(exp)
}

impl FixedPoint {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE);
    /// Smallest representable positive step (10^-12)
    pub const UNIT: Self = Self(1);
    pub const MAX: Self = Self(i128::MAX);

    /// Create from an already-scaled raw value (no conversion)
    #[inline]
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Raw scaled value
    #[inline]
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Create from a whole number
    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Self(value as i128 * SCALE)
    }

    /// Convert an on-chain amount in base units of a mint with `decimals`
    pub fn from_amount(amount: u64, decimals: u8) -> Result<Self> {
        let decimals = decimals as u32;
        if decimals > DECIMALS {
            return Err(CurveError::InvalidAmount);
        }
        Ok(Self(amount as i128 * pow10(DECIMALS - decimals)))
    }

    /// Convert to base units of a mint with `decimals`, truncating
    pub fn to_amount(self, decimals: u8) -> Result<u64> {
        let decimals = decimals as u32;
        if decimals > DECIMALS || self.0 < 0 {
            return Err(CurveError::InvalidAmount);
        }
        u64::try_from(self.0 / pow10(DECIMALS - decimals)).map_err(|_| CurveError::Overflow)
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0.checked_add(other.0).map(Self).ok_or(CurveError::Overflow)
    }

    #[inline]
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0.checked_sub(other.0).map(Self).ok_or(CurveError::Overflow)
    }

    #[inline]
    pub fn checked_neg(self) -> Result<Self> {
        self.0.checked_neg().map(Self).ok_or(CurveError::Overflow)
    }

    /// `self * other`, truncated toward zero
    pub fn checked_mul(self, other: Self) -> Result<Self> {
        let (neg_a, a) = widen(self.0);
        let (neg_b, b) = widen(other.0);
        let product = a.checked_mul(b).ok_or(CurveError::Overflow)?;
        narrow(neg_a != neg_b, product / U256::from(SCALE as u128))
    }

    /// `self / other`, truncated toward zero. Dividing by zero is an overflow.
    pub fn checked_div(self, other: Self) -> Result<Self> {
        if other.0 == 0 {
            return Err(CurveError::Overflow);
        }
        let (neg_a, a) = widen(self.0);
        let (neg_b, b) = widen(other.0);
        let scaled = a
            .checked_mul(U256::from(SCALE as u128))
            .ok_or(CurveError::Overflow)?;
        narrow(neg_a != neg_b, scaled / b)
    }

    /// `self * numerator / denominator` with a single truncation
    pub fn mul_div(self, numerator: u128, denominator: u128) -> Result<Self> {
        if denominator == 0 {
            return Err(CurveError::Overflow);
        }
        let (neg, a) = widen(self.0);
        let product = a
            .checked_mul(U256::from(numerator))
            .ok_or(CurveError::Overflow)?;
        narrow(neg, product / U256::from(denominator))
    }

    #[inline]
    pub fn mul_int(self, factor: u128) -> Result<Self> {
        self.mul_div(factor, 1)
    }

    #[inline]
    pub fn div_int(self, divisor: u128) -> Result<Self> {
        self.mul_div(1, divisor)
    }

    /// Integer power by repeated left-to-right multiplication.
    ///
    /// Each step truncates, so the result is the settlement engine's value,
    /// not the exact power.
    pub fn pow(self, exp: u32) -> Result<Self> {
        let mut result = Self::ONE;
        for _ in 0..exp {
            result = result.checked_mul(self)?;
        }
        Ok(result)
    }

    /// Largest value `r` such that `r^n <= self`, exactly
    pub fn nth_root(self, n: u32) -> Result<Self> {
        if n == 0 {
            return Err(CurveError::InvalidCurveDefinition("zero root degree"));
        }
        self.pow_ratio(1, n)
    }

    /// `self^(num/den)` truncated once toward zero.
    ///
    /// Integer exponents (`den == 1`) use [`Self::pow`]. Otherwise the power
    /// is carried out in 1024 bits and only the root is narrowed, so large
    /// supplies do not overflow before the result does.
    pub fn pow_ratio(self, num: u32, den: u32) -> Result<Self> {
        if den == 0 {
            return Err(CurveError::InvalidCurveDefinition("zero exponent denominator"));
        }
        if self.0 < 0 {
            return Err(CurveError::InvalidAmount);
        }
        if den == 1 {
            return self.pow(num);
        }
        if self.0 == 0 || num == 0 {
            return Ok(if num == 0 { Self::ONE } else { Self::ZERO });
        }

        // raw result r = floor((raw^num * SCALE^(den - num))^(1/den))
        let scale = U1024::from(SCALE as u128);
        let mut radicand = wide_pow(U1024::from(self.0 as u128), num)?;
        if num <= den {
            radicand = radicand
                .checked_mul(wide_pow(scale, den - num)?)
                .ok_or(CurveError::Overflow)?;
        } else {
            radicand /= wide_pow(scale, num - den)?;
        }

        let root = integer_root(radicand, den)?;
        if root > U1024::from(i128::MAX as u128) {
            return Err(CurveError::Overflow);
        }
        Ok(Self(root.low_u128() as i128))
    }

    /// Natural logarithm with exactly `taylor_iterations` series terms.
    ///
    /// The argument is reduced to `m * 2^k` with `m` in `[1, 2)`, then
    /// `ln(m) = 2 * sum(z^(2i+1) / (2i+1))` with `z = (m - 1) / (m + 1)`.
    pub fn ln(self, taylor_iterations: u32) -> Result<Self> {
        if self.0 <= 0 {
            return Err(CurveError::InvalidAmount);
        }

        let whole = self.0 / SCALE;
        let (mantissa, exponent) = if whole >= 1 {
            let k = 127 - whole.leading_zeros();
            (self.div_int(1u128 << k)?, k as i128)
        } else {
            let mut m = self;
            let mut k: i128 = 0;
            while m < Self::ONE {
                m = m.mul_int(2)?;
                k -= 1;
            }
            (m, k)
        };

        let z = mantissa
            .checked_sub(Self::ONE)?
            .checked_div(mantissa.checked_add(Self::ONE)?)?;
        let z2 = z.checked_mul(z)?;
        let mut term = z;
        let mut sum = Self::ZERO;
        for i in 0..taylor_iterations {
            sum = sum.checked_add(term.div_int(2 * i as u128 + 1)?)?;
            term = term.checked_mul(z2)?;
        }

        let ln2_part = Self(LN_2_RAW).mul_int(exponent.unsigned_abs())?;
        let ln2_part = if exponent < 0 { ln2_part.checked_neg()? } else { ln2_part };
        sum.mul_int(2)?.checked_add(ln2_part)
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / SCALE as u128;
        let frac = magnitude % SCALE as u128;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let digits = format!("{:012}", frac);
            write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
        }
    }
}

impl FromStr for FixedPoint {
    type Err = CurveError;

    /// Parse a decimal literal; digits past the 12th fractional place are dropped
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_str, frac_str) = body.split_once('.').unwrap_or((body, ""));
        if int_str.is_empty() && frac_str.is_empty() {
            return Err(CurveError::ParseError);
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_str) || !all_digits(frac_str) {
            return Err(CurveError::ParseError);
        }

        let whole: i128 = if int_str.is_empty() {
            0
        } else {
            int_str.parse().map_err(|_| CurveError::Overflow)?
        };

        let kept = &frac_str[..frac_str.len().min(DECIMALS as usize)];
        let mut frac: i128 = 0;
        for b in kept.bytes() {
            frac = frac * 10 + (b - b'0') as i128;
        }
        frac *= pow10(DECIMALS - kept.len() as u32);

        let raw = whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or(CurveError::Overflow)?;
        Ok(Self(if negative { -raw } else { raw }))
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::FixedPoint;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for FixedPoint {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    /// Accept `"1.5"`, `3` or `0.25` in config files
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(i64),
        Float(f64),
    }

    impl<'de> Deserialize<'de> for FixedPoint {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            match Repr::deserialize(deserializer)? {
                Repr::Text(text) => text.parse().map_err(de::Error::custom),
                Repr::Int(value) => Ok(FixedPoint::from_int(value)),
                Repr::Float(value) => value.to_string().parse().map_err(de::Error::custom),
            }
        }
    }
}
