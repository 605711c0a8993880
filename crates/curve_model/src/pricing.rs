//! Pricing façade: curve + live reserve/supply snapshot -> trade amounts
//!
//! Buy by target (closed form):
//! - needed = desired / (1 - buy_target_royalty)
//! - cost   = ∫[S, S + needed] price dS
//! - base   = cost / (1 - buy_base_royalty)
//!
//! Buy with base (no closed form): bisection on the royalty-inclusive
//! buy-by-target function itself, seeded by linear extrapolation at the
//! current supply. Royalties are therefore folded into the solver's target
//! function here, but applied as post-hoc divisions for buys by target. This
//! asymmetry matches the settlement engine.
//!
//! Sell:
//! - burned   = target_in * (1 - sell_target_royalty)
//! - proceeds = ∫[S - burned, S] price dS
//! - payout   = proceeds * (1 - sell_base_royalty)

use crate::royalty::{gross_up, net_of};
use crate::{
    CurveError, CurveShape, FixedPoint, Result, RootFinder, Royalties, RoyaltyPercentage, Solution,
    TimeComposite, DECIMALS,
};

/// Caller-supplied snapshot of the curve's on-chain balances
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReserveState {
    pub reserve_balance: FixedPoint,
    pub reserve_decimals: u8,
    pub supply: FixedPoint,
    pub supply_decimals: u8,
    /// Seconds since the curve went live (negative before go-live)
    pub elapsed_seconds: i64,
    /// Elapsed time at which swaps freeze, on the same clock as `elapsed_seconds`
    #[cfg_attr(feature = "serde", serde(default))]
    pub freeze_after_seconds: Option<i64>,
}

impl ReserveState {
    /// Build from raw token-account balances
    pub fn from_amounts(
        reserve_amount: u64,
        reserve_decimals: u8,
        supply_amount: u64,
        supply_decimals: u8,
        elapsed_seconds: i64,
    ) -> Result<Self> {
        let undefined = |_| CurveError::CurveUndefined;
        Ok(Self {
            reserve_balance: FixedPoint::from_amount(reserve_amount, reserve_decimals).map_err(undefined)?,
            reserve_decimals,
            supply: FixedPoint::from_amount(supply_amount, supply_decimals).map_err(undefined)?,
            supply_decimals,
            elapsed_seconds,
            freeze_after_seconds: None,
        })
    }

    /// Freeze swaps once `elapsed_seconds` reaches `freeze_after_seconds`
    pub fn with_freeze_after(self, freeze_after_seconds: Option<i64>) -> Self {
        Self {
            freeze_after_seconds,
            ..self
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.freeze_after_seconds, Some(freeze) if self.elapsed_seconds >= freeze)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reserve_balance.is_negative() || self.supply.is_negative() {
            return Err(CurveError::CurveUndefined);
        }
        if self.reserve_decimals as u32 > DECIMALS || self.supply_decimals as u32 > DECIMALS {
            return Err(CurveError::CurveUndefined);
        }
        Ok(())
    }
}

/// Ephemeral quote result
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricingQuote {
    /// Required input (buy by target) or returned output (buy with base, sell)
    pub amount: FixedPoint,
    /// Worst case the caller accepts after slippage: the maximum base in for
    /// buys by target, the minimum output otherwise
    pub bounded_price: FixedPoint,
    /// Solver estimates the settlement engine seeds its own solver with
    pub root_estimates: Vec<FixedPoint>,
}

#[inline]
fn non_negative(amount: FixedPoint) -> Result<FixedPoint> {
    if amount.is_negative() {
        return Err(CurveError::InvalidAmount);
    }
    Ok(amount)
}

#[inline]
fn check_slippage(slippage: FixedPoint) -> Result<FixedPoint> {
    if slippage.is_negative() || slippage > FixedPoint::ONE {
        return Err(CurveError::InvalidAmount);
    }
    Ok(slippage)
}

/// Bonding curve pricing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingCurve {
    curve: TimeComposite,
    solver: RootFinder,
}

impl PricingCurve {
    pub fn new(curve: impl Into<TimeComposite>) -> Result<Self> {
        // CurveShape variants are public, so shapes may arrive unvalidated
        let curve: TimeComposite = curve.into();
        let curve = TimeComposite::from_entries(curve.into())?;
        Ok(Self {
            curve,
            solver: RootFinder::default(),
        })
    }

    pub fn curve(&self) -> &TimeComposite {
        &self.curve
    }

    fn active(&self, state: &ReserveState) -> Result<&CurveShape> {
        state.validate()?;
        Ok(self.curve.active_shape(state.elapsed_seconds))
    }

    /// Active shape for a trade; spot values stay readable after a freeze
    fn tradable(&self, state: &ReserveState) -> Result<&CurveShape> {
        let shape = self.active(state)?;
        if state.is_frozen() {
            return Err(CurveError::SwapFrozen);
        }
        Ok(shape)
    }

    // ========================================================================
    // Buy by target amount
    // ========================================================================

    /// Base required to receive `desired_target`, royalties included
    pub fn buy_target_amount(
        &self,
        state: &ReserveState,
        desired_target: FixedPoint,
        buy_base_royalty: RoyaltyPercentage,
        buy_target_royalty: RoyaltyPercentage,
    ) -> Result<FixedPoint> {
        let shape = self.tradable(state)?;
        let needed = gross_up(non_negative(desired_target)?, buy_target_royalty)?;
        let cost = shape.integral(state.supply, state.supply.checked_add(needed)?)?;
        gross_up(cost, buy_base_royalty)
    }

    /// Roots the buy-by-target integral extracts (empty for integer exponents)
    pub fn buy_target_amount_root_estimates(
        &self,
        state: &ReserveState,
        desired_target: FixedPoint,
        _buy_base_royalty: RoyaltyPercentage,
        buy_target_royalty: RoyaltyPercentage,
    ) -> Result<Vec<FixedPoint>> {
        let shape = self.tradable(state)?;
        let needed = gross_up(non_negative(desired_target)?, buy_target_royalty)?;
        shape.integral_root_estimates(state.supply, state.supply.checked_add(needed)?)
    }

    // ========================================================================
    // Buy with base amount
    // ========================================================================

    fn solve_buy_with_base(
        &self,
        state: &ReserveState,
        base_in: FixedPoint,
        buy_base_royalty: RoyaltyPercentage,
        buy_target_royalty: RoyaltyPercentage,
    ) -> Result<Solution> {
        let shape = self.tradable(state)?;
        let base_in = non_negative(base_in)?;

        // Linear extrapolation at the current supply
        let unit_price = gross_up(
            gross_up(shape.price_at(state.supply)?, buy_target_royalty)?,
            buy_base_royalty,
        )?;
        let guess = if unit_price.is_zero() {
            base_in
        } else {
            base_in.checked_div(unit_price)?
        };

        self.solver.solve(
            |target| self.buy_target_amount(state, target, buy_base_royalty, buy_target_royalty),
            base_in,
            guess,
        )
    }

    /// Target received for spending `base_in`, royalties included
    pub fn buy_with_base_amount(
        &self,
        state: &ReserveState,
        base_in: FixedPoint,
        buy_base_royalty: RoyaltyPercentage,
        buy_target_royalty: RoyaltyPercentage,
    ) -> Result<FixedPoint> {
        self.solve_buy_with_base(state, base_in, buy_base_royalty, buy_target_royalty)
            .map(|solution| solution.root)
    }

    /// Solver trace for [`Self::buy_with_base_amount`]: bracket, then midpoints
    pub fn buy_with_base_root_estimates(
        &self,
        state: &ReserveState,
        base_in: FixedPoint,
        buy_base_royalty: RoyaltyPercentage,
        buy_target_royalty: RoyaltyPercentage,
    ) -> Result<Vec<FixedPoint>> {
        self.solve_buy_with_base(state, base_in, buy_base_royalty, buy_target_royalty)
            .map(|solution| solution.estimates)
    }

    // ========================================================================
    // Sell
    // ========================================================================

    /// Supply range `[S - burned, S]` a sell walks down
    fn sell_range(
        &self,
        state: &ReserveState,
        target_in: FixedPoint,
        sell_target_royalty: RoyaltyPercentage,
    ) -> Result<(FixedPoint, FixedPoint)> {
        let burned = net_of(non_negative(target_in)?, sell_target_royalty)?;
        if burned > state.supply {
            return Err(CurveError::InsufficientSupply);
        }
        Ok((state.supply.checked_sub(burned)?, state.supply))
    }

    /// Base returned for selling `target_in`, royalties deducted
    pub fn sell_target_amount(
        &self,
        state: &ReserveState,
        target_in: FixedPoint,
        sell_base_royalty: RoyaltyPercentage,
        sell_target_royalty: RoyaltyPercentage,
    ) -> Result<FixedPoint> {
        let shape = self.tradable(state)?;
        let (from, to) = self.sell_range(state, target_in, sell_target_royalty)?;
        let proceeds = shape.integral(from, to)?;
        if proceeds > state.reserve_balance {
            return Err(CurveError::InsufficientReserve);
        }
        net_of(proceeds, sell_base_royalty)
    }

    // ========================================================================
    // Spot values
    // ========================================================================

    /// Instantaneous buy price of one target unit, buy royalties included
    pub fn current(&self, state: &ReserveState, royalties: &Royalties) -> Result<FixedPoint> {
        let shape = self.active(state)?;
        let price = shape.price_at(state.supply)?;
        gross_up(gross_up(price, royalties.buy_target)?, royalties.buy_base)
    }

    /// Instantaneous base received per target unit sold, sell royalties deducted
    pub fn current_sell(&self, state: &ReserveState, royalties: &Royalties) -> Result<FixedPoint> {
        let shape = self.active(state)?;
        let price = shape.price_at(state.supply)?;
        net_of(net_of(price, royalties.sell_target)?, royalties.sell_base)
    }

    /// Base locked in the reserve backing the curve
    pub fn locked(&self, state: &ReserveState) -> Result<FixedPoint> {
        state.validate()?;
        Ok(state.reserve_balance)
    }

    // ========================================================================
    // Slippage-bounded quotes
    // ========================================================================

    /// Base required for `desired_target`, bounded above by `1 + slippage`
    pub fn quote_buy_target(
        &self,
        state: &ReserveState,
        desired_target: FixedPoint,
        royalties: &Royalties,
        slippage: FixedPoint,
    ) -> Result<PricingQuote> {
        let slippage = check_slippage(slippage)?;
        let amount =
            self.buy_target_amount(state, desired_target, royalties.buy_base, royalties.buy_target)?;
        let root_estimates = self.buy_target_amount_root_estimates(
            state,
            desired_target,
            royalties.buy_base,
            royalties.buy_target,
        )?;
        Ok(PricingQuote {
            amount,
            bounded_price: amount.checked_mul(FixedPoint::ONE.checked_add(slippage)?)?,
            root_estimates,
        })
    }

    /// Target received for `base_in`, bounded below by `1 - slippage`
    pub fn quote_buy_with_base(
        &self,
        state: &ReserveState,
        base_in: FixedPoint,
        royalties: &Royalties,
        slippage: FixedPoint,
    ) -> Result<PricingQuote> {
        let slippage = check_slippage(slippage)?;
        let solution =
            self.solve_buy_with_base(state, base_in, royalties.buy_base, royalties.buy_target)?;
        Ok(PricingQuote {
            amount: solution.root,
            bounded_price: solution.root.checked_mul(FixedPoint::ONE.checked_sub(slippage)?)?,
            root_estimates: solution.estimates,
        })
    }

    /// Base returned for `target_in`, bounded below by `1 - slippage`
    pub fn quote_sell_target(
        &self,
        state: &ReserveState,
        target_in: FixedPoint,
        royalties: &Royalties,
        slippage: FixedPoint,
    ) -> Result<PricingQuote> {
        let slippage = check_slippage(slippage)?;
        let amount =
            self.sell_target_amount(state, target_in, royalties.sell_base, royalties.sell_target)?;
        let (from, to) = self.sell_range(state, target_in, royalties.sell_target)?;
        let root_estimates = self.tradable(state)?.integral_root_estimates(from, to)?;
        Ok(PricingQuote {
            amount,
            bounded_price: amount.checked_mul(FixedPoint::ONE.checked_sub(slippage)?)?,
            root_estimates,
        })
    }
}
