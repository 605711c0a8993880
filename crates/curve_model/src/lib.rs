//! Curve Model - Bonding curve pricing engine
//!
//! Prices trades against deterministic bonding curves: given a reserve/supply
//! snapshot, answers "how much base for this much target" and the inverse
//! questions. Every computation is fixed-point with truncating rounding so
//! that quotes reproduce what the settlement engine computes from the same
//! curve definition.
//!
//! The crate performs no I/O and keeps no state between calls. Reserve and
//! supply balances are supplied by the caller on every call.

pub mod composite;
pub mod fixed;
pub mod hierarchy;
pub mod pricing;
pub mod root_finder;
pub mod royalty;
pub mod shape;

pub use composite::{TimeComposite, TimedShape};
pub use fixed::FixedPoint;
pub use hierarchy::{CurveHierarchy, CurveId, Direction, Hop, Market, Mint, PricePath, SwapResult};
pub use pricing::{PricingCurve, PricingQuote, ReserveState};
pub use root_finder::{RootFinder, Solution};
pub use royalty::{Royalties, RoyaltyPercentage};
pub use shape::CurveShape;

/// Fractional decimal digits carried by every [`FixedPoint`]
pub const DECIMALS: u32 = 12;

/// Scaling factor (1e12)
pub const SCALE: i128 = 1_000_000_000_000;

/// Royalty numerators are expressed over this denominator (u32::MAX = 100%)
pub const ROYALTY_DENOMINATOR: u32 = u32::MAX;

/// Bisection budget shared with the settlement engine's solver.
///
/// Versioned protocol constant: changing it changes every base-driven quote.
pub const ROOT_FINDER_ITERATIONS: u32 = 128;

/// ln(2) truncated to 12 fractional digits (raw scaled value)
pub const LN_2_RAW: i128 = 693_147_180_559;

/// Error types for pricing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    /// Fixed-point magnitude exceeded the representable range
    #[error("arithmetic overflow")]
    Overflow,
    /// Malformed shape or composite parameters
    #[error("invalid curve definition: {0}")]
    InvalidCurveDefinition(&'static str),
    /// Royalty of 100% used where `1 - pct` is a divisor, or a percentage outside [0, 100]
    #[error("invalid royalty percentage")]
    InvalidRoyalty,
    /// Reserve/supply snapshot does not describe an initialized curve
    #[error("curve state is undefined")]
    CurveUndefined,
    /// Root-finder bracket does not contain the target
    #[error("root finder bracket does not contain a sign change")]
    NoConvergence,
    /// Hierarchy has no route between the two mints
    #[error("no pricing path between mints")]
    NoPathFound,
    /// Sell burns more target than is in circulation
    #[error("insufficient target supply")]
    InsufficientSupply,
    /// Sell proceeds exceed the reserve balance
    #[error("insufficient reserve balance")]
    InsufficientReserve,
    /// Trade attempted at or after the curve's swap-freeze time
    #[error("swaps are frozen on this curve")]
    SwapFrozen,
    /// Negative trade amount or slippage outside [0, 1]
    #[error("invalid amount")]
    InvalidAmount,
    /// Malformed decimal literal or mint address
    #[error("parse error")]
    ParseError,
}

pub type Result<T> = core::result::Result<T, CurveError>;
