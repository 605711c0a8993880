//! Property tests for the pricing engine
//!
//! Increase cases: PROPTEST_CASES=2000 cargo test -p curve_model --test properties

use curve_model::royalty::{gross_up, net_of};
use curve_model::{
    CurveError, CurveShape, FixedPoint, PricingCurve, ReserveState, RoyaltyPercentage, TimeComposite,
    ROOT_FINDER_ITERATIONS, ROYALTY_DENOMINATOR, SCALE,
};
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

fn fp(s: &str) -> FixedPoint {
    s.parse().unwrap()
}

/// Supply between 1 and 1,000,000 tokens with a fractional part
fn supply() -> impl Strategy<Value = FixedPoint> {
    (SCALE..=1_000_000 * SCALE).prop_map(FixedPoint::from_raw)
}

/// Supply between 1e9 and 1e10 tokens, where `S^(pow+frac)` leaves i128
fn large_supply() -> impl Strategy<Value = FixedPoint> {
    (1_000_000_000 * SCALE..=10_000_000_000 * SCALE).prop_map(FixedPoint::from_raw)
}

/// Trade size between one millionth and 10,000 tokens
fn trade() -> impl Strategy<Value = FixedPoint> {
    (1_000_000i128..=10_000 * SCALE).prop_map(FixedPoint::from_raw)
}

fn any_shape() -> impl Strategy<Value = CurveShape> {
    prop_oneof![
        Just(CurveShape::power(FixedPoint::ONE, FixedPoint::ZERO, 1, 1).unwrap()),
        Just(CurveShape::power(fp("0.001"), FixedPoint::ZERO, 2, 1).unwrap()),
        Just(CurveShape::power(FixedPoint::ONE, fp("0.5"), 1, 2).unwrap()),
        Just(CurveShape::log(fp("100"), fp("2"), 16).unwrap()),
    ]
}

/// Shapes whose integral stays inside i128 at [`large_supply`]
fn large_supply_shape() -> impl Strategy<Value = CurveShape> {
    prop_oneof![
        Just(CurveShape::power(FixedPoint::ONE, FixedPoint::ZERO, 1, 1).unwrap()),
        Just(CurveShape::power(FixedPoint::ONE, fp("0.5"), 1, 2).unwrap()),
        Just(CurveShape::power(FixedPoint::ONE, FixedPoint::ZERO, 1, 10).unwrap()),
        Just(CurveShape::log(fp("100"), fp("2"), 16).unwrap()),
    ]
}

/// Integer-exponent shapes whose price stays at or above 1 for supply >= 1
fn steep_shape() -> impl Strategy<Value = CurveShape> {
    (1i64..=10, 0i64..=100).prop_map(|(c, b)| {
        CurveShape::power(FixedPoint::from_int(c), FixedPoint::from_int(b), 1, 1).unwrap()
    })
}

fn royalty() -> impl Strategy<Value = RoyaltyPercentage> {
    (0u32..ROYALTY_DENOMINATOR).prop_map(RoyaltyPercentage::from_raw)
}

fn state_at(supply: FixedPoint) -> ReserveState {
    ReserveState {
        reserve_balance: FixedPoint::from_int(1_000_000_000),
        reserve_decimals: 9,
        supply,
        supply_decimals: 9,
        elapsed_seconds: 0,
        freeze_after_seconds: None,
    }
}

// ============================================================================
// CURVE PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn integral_is_antisymmetric(shape in any_shape(), a in supply(), b in supply()) {
        let forward = shape.integral(a, b).unwrap();
        let backward = shape.integral(b, a).unwrap();
        prop_assert_eq!(forward, backward.checked_neg().unwrap());
    }

    #[test]
    fn integral_grows_with_range(
        shape in any_shape(),
        a in supply(),
        b in supply(),
        extra in 1i64..=1_000,
    ) {
        let b2 = b.checked_add(FixedPoint::from_int(extra)).unwrap();
        let short = shape.integral(a, b).unwrap();
        let long = shape.integral(a, b2).unwrap();
        prop_assert!(long > short, "{:?}: {} vs {}", shape, short, long);
    }

    #[test]
    fn buy_round_trips_within_one_unit(shape in steep_shape(), s in supply(), x in trade()) {
        let curve = PricingCurve::new(shape).unwrap();
        let state = state_at(s);
        let none = RoyaltyPercentage::ZERO;

        let base = curve.buy_target_amount(&state, x, none, none).unwrap();
        let back = curve.buy_with_base_amount(&state, base, none, none).unwrap();
        let gap = (back.raw() - x.raw()).abs();
        prop_assert!(gap <= 1, "x {} base {} back {}", x, base, back);
    }

    #[test]
    fn inverse_lands_on_lowest_target_for_the_cost(shape in any_shape(), s in supply(), x in trade()) {
        // Cheap curves map several targets to one cost; the inverse must
        // still cost exactly what was paid and never hand out more than x
        let curve = PricingCurve::new(shape).unwrap();
        let state = state_at(s);
        let none = RoyaltyPercentage::ZERO;

        let base = curve.buy_target_amount(&state, x, none, none).unwrap();
        let back = curve.buy_with_base_amount(&state, base, none, none).unwrap();
        prop_assert!(back <= x, "{:?}: x {} back {}", shape, x, back);
        prop_assert_eq!(curve.buy_target_amount(&state, back, none, none).unwrap(), base);
        if !back.is_zero() {
            let below = FixedPoint::from_raw(back.raw() - 1);
            prop_assert!(curve.buy_target_amount(&state, below, none, none).unwrap() < base);
        }
    }

    #[test]
    fn solver_never_overspends(shape in any_shape(), s in supply(), base in trade()) {
        let curve = PricingCurve::new(shape).unwrap();
        let state = state_at(s);
        let none = RoyaltyPercentage::ZERO;

        let target = curve.buy_with_base_amount(&state, base, none, none).unwrap();
        let cost = curve.buy_target_amount(&state, target, none, none).unwrap();
        prop_assert!(cost <= base, "{:?}: base {} target {} cost {}", shape, base, target, cost);

        let estimates = curve.buy_with_base_root_estimates(&state, base, none, none).unwrap();
        prop_assert!(estimates.len() >= 2);
        prop_assert!(estimates.len() <= ROOT_FINDER_ITERATIONS as usize + 2);
    }

    #[test]
    fn sell_returns_buy_cost(shape in any_shape(), s in supply(), x in trade()) {
        // Selling what was just bought walks back over the same supply range
        let curve = PricingCurve::new(shape).unwrap();
        let none = RoyaltyPercentage::ZERO;
        let before = state_at(s);
        let cost = curve.buy_target_amount(&before, x, none, none).unwrap();

        let after = ReserveState {
            supply: s.checked_add(x).unwrap(),
            reserve_balance: before.reserve_balance.checked_add(cost).unwrap(),
            ..before
        };
        let proceeds = curve.sell_target_amount(&after, x, none, none).unwrap();
        prop_assert_eq!(proceeds, cost);
    }
}

// ============================================================================
// LARGE SUPPLIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn large_supply_trades_round_trip(shape in large_supply_shape(), s in large_supply(), x in trade()) {
        let curve = PricingCurve::new(shape).unwrap();
        let none = RoyaltyPercentage::ZERO;
        let before = state_at(s);

        let cost = curve.buy_target_amount(&before, x, none, none).unwrap();
        prop_assert!(cost > FixedPoint::ZERO);
        let back = curve.buy_with_base_amount(&before, cost, none, none).unwrap();
        prop_assert!(back <= x);
        prop_assert_eq!(curve.buy_target_amount(&before, back, none, none).unwrap(), cost);

        let after = ReserveState {
            supply: s.checked_add(x).unwrap(),
            reserve_balance: before.reserve_balance.checked_add(cost).unwrap(),
            ..before
        };
        prop_assert_eq!(curve.sell_target_amount(&after, x, none, none).unwrap(), cost);
    }
}

// ============================================================================
// ROYALTY PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn zero_royalty_is_identity(raw in 0i128..=1_000_000_000 * SCALE) {
        let amount = FixedPoint::from_raw(raw);
        prop_assert_eq!(gross_up(amount, RoyaltyPercentage::ZERO).unwrap(), amount);
        prop_assert_eq!(net_of(amount, RoyaltyPercentage::ZERO).unwrap(), amount);
    }

    #[test]
    fn full_royalty_is_rejected_on_buys(raw in 0i128..=1_000_000 * SCALE) {
        prop_assert_eq!(
            gross_up(FixedPoint::from_raw(raw), RoyaltyPercentage::FULL),
            Err(CurveError::InvalidRoyalty)
        );
    }

    #[test]
    fn royalties_only_cost_more(pct in royalty(), raw in 0i128..=1_000_000 * SCALE) {
        let amount = FixedPoint::from_raw(raw);
        let grossed = gross_up(amount, pct).unwrap();
        prop_assert!(grossed >= amount);
        prop_assert!(net_of(amount, pct).unwrap() <= amount);
        prop_assert!(net_of(grossed, pct).unwrap() <= amount);
    }
}

// ============================================================================
// TIME COMPOSITE SELECTION
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn composite_selects_last_started_shape(
        gaps in prop::collection::vec(1u64..=10_000, 0..8),
        elapsed in -1_000i64..=100_000,
    ) {
        let mut offsets = vec![0u64];
        for gap in gaps {
            let next = offsets[offsets.len() - 1] + gap;
            offsets.push(next);
        }
        let pieces = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| {
                let price = FixedPoint::from_int(i as i64 + 1);
                (offset, CurveShape::power(FixedPoint::ZERO, price, 1, 1).unwrap())
            })
            .collect();
        let composite = TimeComposite::new(pieces).unwrap();

        let expected = offsets
            .iter()
            .rposition(|&offset| elapsed >= 0 && offset <= elapsed as u64)
            .unwrap_or(0);
        prop_assert_eq!(composite.active_index(elapsed), expected);
        prop_assert_eq!(
            composite.price_at(elapsed, FixedPoint::ONE).unwrap(),
            FixedPoint::from_int(expected as i64 + 1)
        );
    }
}
