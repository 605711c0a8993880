//! Bounded-iteration bisection solver
//!
//! Inverts a non-decreasing function `f` on `[0, ∞)` to within one
//! fixed-point unit once the bracket has been narrowed. Where truncation
//! leaves `f` flat across several units, an exact hit resolves to the low
//! edge of the flat run. The iteration budget is shared with the settlement engine's
//! solver, and the full estimate sequence (initial bracket, then every
//! midpoint in order) is returned so the settlement layer can replay it.

use log::trace;

use crate::{CurveError, FixedPoint, Result, ROOT_FINDER_ITERATIONS};

/// Solver output: the root and every estimate that led to it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub root: FixedPoint,
    /// `[lo, hi, mid_1, mid_2, ...]`
    pub estimates: Vec<FixedPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootFinder {
    iterations: u32,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self::new(ROOT_FINDER_ITERATIONS)
    }
}

impl RootFinder {
    pub const fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Solve `f(x) = target` for a non-decreasing `f`.
    ///
    /// Returns the smallest `x` with `f(x) == target` when one exists, and
    /// otherwise the largest `x` with `f(x) < target`.
    ///
    /// The bracket starts at `[0, initial_guess]`; while `f(hi) < target` the
    /// bracket slides up by doubling `hi` (at most `iterations` times). An
    /// overflow while evaluating `f` means the value is above any target, so
    /// it narrows the bracket rather than failing.
    ///
    /// Fails with `NoConvergence` when `f(0) > target` or no upper bound
    /// can be found.
    pub fn solve<F>(&self, f: F, target: FixedPoint, initial_guess: FixedPoint) -> Result<Solution>
    where
        F: Fn(FixedPoint) -> Result<FixedPoint>,
    {
        if target.is_negative() {
            return Err(CurveError::InvalidAmount);
        }

        // f(x) <= target, with overflow counted as "above"
        let fits = |x: FixedPoint| -> Result<bool> {
            match f(x) {
                Ok(value) => Ok(value <= target),
                Err(CurveError::Overflow) => Ok(false),
                Err(e) => Err(e),
            }
        };
        // f(x) >= target
        let reaches = |x: FixedPoint| -> Result<bool> {
            match f(x) {
                Ok(value) => Ok(value >= target),
                Err(CurveError::Overflow) => Ok(true),
                Err(e) => Err(e),
            }
        };

        let mut lo = FixedPoint::ZERO;
        if !fits(lo)? {
            return Err(CurveError::NoConvergence);
        }

        let mut hi = initial_guess.max(FixedPoint::UNIT);
        let mut expansions = 0;
        while !reaches(hi)? {
            if expansions >= self.iterations {
                return Err(CurveError::NoConvergence);
            }
            lo = hi;
            hi = hi.mul_int(2).map_err(|_| CurveError::NoConvergence)?;
            expansions += 1;
        }
        trace!("bracket [{}, {}] after {} expansions", lo, hi, expansions);

        let mut estimates = vec![lo, hi];
        // lo stays below the target (or at 0), hi stays at or above it
        for _ in 0..self.iterations {
            let width = hi.raw() - lo.raw();
            if width <= 1 {
                break;
            }
            let mid = FixedPoint::from_raw(lo.raw() + width / 2);
            estimates.push(mid);
            if reaches(mid)? {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let root = if reaches(lo)? {
            lo
        } else if fits(hi)? {
            hi
        } else {
            lo
        };
        trace!("root {} after {} estimates", root, estimates.len());
        Ok(Solution { root, estimates })
    }
}
