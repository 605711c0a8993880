//! Primitive curve shapes
//!
//! The set of shapes is fixed by the settlement protocol, so this is a closed
//! enum matched exhaustively everywhere. Field order mirrors the settlement
//! encoding: `Log { g, c, taylor_iterations }`, `Power { c, b, pow, frac }`.
//!
//! `integral(a, b)` is the primitive every buy/sell formula is built on:
//! - Power: `∫ c·S^(pow/frac) + b dS = c·frac/(pow+frac)·S^((pow+frac)/frac) + b·S`
//! - Log:   `∫ c·ln(1 + S/g) dS = c·g·(u·ln(u) - u)` with `u = 1 + S/g`
//!
//! Both are evaluated as `F(b) - F(a)` before any scaling so that
//! `integral(a, b) == -integral(b, a)` holds bit-for-bit. Rational powers
//! are exact powers truncated once ([`FixedPoint::pow_ratio`]), which keeps
//! them strictly increasing at unit resolution and finite up to the point
//! where the result itself leaves the `i128` range.

use crate::{CurveError, FixedPoint, Result};

/// Primitive bonding curve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum CurveShape {
    /// `price = c·ln(1 + S/g)`, logarithm expanded with `taylor_iterations` terms
    Log {
        g: FixedPoint,
        c: FixedPoint,
        taylor_iterations: u16,
    },
    /// `price = c·S^(pow/frac) + b`
    Power {
        c: FixedPoint,
        b: FixedPoint,
        pow: u8,
        frac: u8,
    },
}

impl CurveShape {
    pub fn log(g: FixedPoint, c: FixedPoint, taylor_iterations: u16) -> Result<Self> {
        let shape = Self::Log { g, c, taylor_iterations };
        shape.validate()?;
        Ok(shape)
    }

    pub fn power(c: FixedPoint, b: FixedPoint, pow: u8, frac: u8) -> Result<Self> {
        let shape = Self::Power { c, b, pow, frac };
        shape.validate()?;
        Ok(shape)
    }

    /// Reject parameters the settlement engine would refuse
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Log { g, c, taylor_iterations } => {
                if g <= FixedPoint::ZERO {
                    return Err(CurveError::InvalidCurveDefinition("log g must be positive"));
                }
                if c.is_negative() {
                    return Err(CurveError::InvalidCurveDefinition("log c must be non-negative"));
                }
                if taylor_iterations == 0 {
                    return Err(CurveError::InvalidCurveDefinition("zero taylor iterations"));
                }
            }
            Self::Power { c, b, frac, .. } => {
                if frac == 0 {
                    return Err(CurveError::InvalidCurveDefinition("zero exponent denominator"));
                }
                if c.is_negative() || b.is_negative() {
                    return Err(CurveError::InvalidCurveDefinition(
                        "power coefficients must be non-negative",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Instantaneous marginal price at `supply`
    pub fn price_at(&self, supply: FixedPoint) -> Result<FixedPoint> {
        if supply.is_negative() {
            return Err(CurveError::InvalidAmount);
        }
        match *self {
            Self::Log { g, c, taylor_iterations } => {
                let u = FixedPoint::ONE.checked_add(supply.checked_div(g)?)?;
                c.checked_mul(u.ln(taylor_iterations as u32)?)
            }
            Self::Power { c, b, pow, frac } => {
                let scaled = supply.pow_ratio(pow as u32, frac as u32)?;
                c.checked_mul(scaled)?.checked_add(b)
            }
        }
    }

    /// Base-asset cost of moving supply from `from` to `to` (negative when `to < from`)
    pub fn integral(&self, from: FixedPoint, to: FixedPoint) -> Result<FixedPoint> {
        if from.is_negative() || to.is_negative() {
            return Err(CurveError::InvalidAmount);
        }
        match *self {
            Self::Log { g, c, taylor_iterations } => {
                let anti = |s: FixedPoint| -> Result<FixedPoint> {
                    let u = FixedPoint::ONE.checked_add(s.checked_div(g)?)?;
                    u.checked_mul(u.ln(taylor_iterations as u32)?)?.checked_sub(u)
                };
                anti(to)?
                    .checked_sub(anti(from)?)?
                    .checked_mul(g)?
                    .checked_mul(c)
            }
            Self::Power { c, b, pow, frac } => {
                let exp = pow as u32 + frac as u32;
                let anti = |s: FixedPoint| s.pow_ratio(exp, frac as u32);
                let curved = anti(to)?
                    .checked_sub(anti(from)?)?
                    .checked_mul(c)?
                    .mul_div(frac as u128, exp as u128)?;
                let flat = b.checked_mul(to.checked_sub(from)?)?;
                curved.checked_add(flat)
            }
        }
    }

    /// Intermediate roots the integral evaluates, in evaluation order.
    ///
    /// Only fractional-exponent power curves extract roots
    /// (`S^((pow+frac)/frac)` at each end of the range); every other shape
    /// yields an empty sequence.
    pub fn integral_root_estimates(&self, from: FixedPoint, to: FixedPoint) -> Result<Vec<FixedPoint>> {
        match *self {
            Self::Power { pow, frac, .. } if frac > 1 => {
                let exp = pow as u32 + frac as u32;
                Ok(vec![from.pow_ratio(exp, frac as u32)?, to.pow_ratio(exp, frac as u32)?])
            }
            Self::Power { .. } | Self::Log { .. } => Ok(Vec::new()),
        }
    }
}
