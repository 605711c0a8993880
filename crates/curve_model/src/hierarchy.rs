//! Multi-hop pricing across registered curves
//!
//! Each registered market is an edge between its base and target mint. It can
//! be walked forwards (spend base, receive target: a buy) or backwards (burn
//! target, receive base: a sell). `path` is a breadth-first search, so it
//! returns a fewest-hops route; among equal-length routes the one reached
//! through the earliest registered market wins.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::{CurveError, FixedPoint, PricingCurve, ReserveState, Result, Royalties};

/// 32-byte mint address, base58 in text form
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Mint([u8; 32]);

impl Mint {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for Mint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Mint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mint({})", self)
    }
}

impl FromStr for Mint {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|_| CurveError::ParseError)?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| CurveError::ParseError)?;
        Ok(Self(bytes))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Mint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Mint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Index of a market in its hierarchy (registration order)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CurveId(pub usize);

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Spend base, receive target
    Buy,
    /// Burn target, receive base
    Sell,
}

/// One step of a [`PricePath`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hop {
    pub curve: CurveId,
    pub direction: Direction,
    pub from: Mint,
    pub to: Mint,
}

/// Ordered hops from one mint to another
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricePath {
    pub hops: Vec<Hop>,
}

impl PricePath {
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Mints visited, endpoints included
    pub fn mints(&self) -> Vec<Mint> {
        let mut mints: Vec<Mint> = self.hops.first().map(|hop| hop.from).into_iter().collect();
        mints.extend(self.hops.iter().map(|hop| hop.to));
        mints
    }
}

/// A curve registered between two mints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Market {
    pub base_mint: Mint,
    pub target_mint: Mint,
    pub curve: PricingCurve,
    pub royalties: Royalties,
}

/// Result of a multi-hop swap
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapResult {
    pub path: PricePath,
    /// Amount held after each hop
    pub hop_amounts: Vec<FixedPoint>,
    pub amount_out: FixedPoint,
}

#[derive(Clone, Debug, Default)]
pub struct CurveHierarchy {
    markets: Vec<Market>,
}

impl CurveHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, market: Market) -> CurveId {
        self.markets.push(market);
        CurveId(self.markets.len() - 1)
    }

    pub fn market(&self, id: CurveId) -> Option<&Market> {
        self.markets.get(id.0)
    }

    pub fn markets(&self) -> impl Iterator<Item = (CurveId, &Market)> {
        self.markets.iter().enumerate().map(|(i, m)| (CurveId(i), m))
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Edges leaving `mint`, in registration order
    fn hops_from(&self, mint: Mint) -> impl Iterator<Item = Hop> + '_ {
        self.markets().filter_map(move |(id, market)| {
            if market.base_mint == mint {
                Some(Hop {
                    curve: id,
                    direction: Direction::Buy,
                    from: mint,
                    to: market.target_mint,
                })
            } else if market.target_mint == mint {
                Some(Hop {
                    curve: id,
                    direction: Direction::Sell,
                    from: mint,
                    to: market.base_mint,
                })
            } else {
                None
            }
        })
    }

    /// Fewest-hops route from `from` to `to`
    pub fn path(&self, from: Mint, to: Mint) -> Result<PricePath> {
        if from == to {
            return Ok(PricePath::default());
        }

        let mut visited = HashSet::from([from]);
        let mut came_by: HashMap<Mint, Hop> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(mint) = queue.pop_front() {
            for hop in self.hops_from(mint) {
                if !visited.insert(hop.to) {
                    continue;
                }
                came_by.insert(hop.to, hop);
                if hop.to == to {
                    let mut hops = Vec::new();
                    let mut cursor = to;
                    while let Some(hop) = came_by.get(&cursor) {
                        hops.push(*hop);
                        cursor = hop.from;
                    }
                    hops.reverse();
                    debug!("path {} -> {}: {} hops", from, to, hops.len());
                    return Ok(PricePath { hops });
                }
                queue.push_back(hop.to);
            }
        }
        Err(CurveError::NoPathFound)
    }

    fn hop_context<'a>(
        &'a self,
        hop: &Hop,
        states: &'a HashMap<CurveId, ReserveState>,
    ) -> Result<(&'a Market, &'a ReserveState)> {
        let market = self.market(hop.curve).ok_or(CurveError::CurveUndefined)?;
        let state = states.get(&hop.curve).ok_or(CurveError::CurveUndefined)?;
        Ok((market, state))
    }

    /// Trade `amount` of `from` into `to`, feeding each hop's output into the next
    pub fn swap(
        &self,
        amount: FixedPoint,
        from: Mint,
        to: Mint,
        states: &HashMap<CurveId, ReserveState>,
    ) -> Result<SwapResult> {
        let path = self.path(from, to)?;
        let mut held = amount;
        let mut hop_amounts = Vec::with_capacity(path.len());

        for hop in &path.hops {
            let (market, state) = self.hop_context(hop, states)?;
            let r = &market.royalties;
            held = match hop.direction {
                Direction::Buy => market
                    .curve
                    .buy_with_base_amount(state, held, r.buy_base, r.buy_target)?,
                Direction::Sell => market
                    .curve
                    .sell_target_amount(state, held, r.sell_base, r.sell_target)?,
            };
            debug!("hop {} {:?} {} -> {}: {}", hop.curve, hop.direction, hop.from, hop.to, held);
            hop_amounts.push(held);
        }

        Ok(SwapResult {
            path,
            hop_amounts,
            amount_out: held,
        })
    }

    /// Instantaneous cost of one unit of `to`, in units of `from`
    pub fn current_price(
        &self,
        from: Mint,
        to: Mint,
        states: &HashMap<CurveId, ReserveState>,
    ) -> Result<FixedPoint> {
        let path = self.path(from, to)?;
        let mut price = FixedPoint::ONE;
        for hop in &path.hops {
            let (market, state) = self.hop_context(hop, states)?;
            let factor = match hop.direction {
                Direction::Buy => market.curve.current(state, &market.royalties)?,
                Direction::Sell => {
                    let proceeds = market.curve.current_sell(state, &market.royalties)?;
                    // Nothing comes back for a sell, so no rate exists
                    if proceeds.is_zero() {
                        return Err(CurveError::CurveUndefined);
                    }
                    FixedPoint::ONE.checked_div(proceeds)?
                }
            };
            price = price.checked_mul(factor)?;
        }
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CurveShape;

    const A: Mint = Mint::new([1; 32]);
    const B: Mint = Mint::new([2; 32]);
    const C: Mint = Mint::new([3; 32]);
    const D: Mint = Mint::new([4; 32]);

    fn fp(s: &str) -> FixedPoint {
        s.parse().unwrap()
    }

    fn market(base: Mint, target: Mint, shape: CurveShape) -> Market {
        Market {
            base_mint: base,
            target_mint: target,
            curve: PricingCurve::new(shape).unwrap(),
            royalties: Royalties::NONE,
        }
    }

    fn linear() -> CurveShape {
        CurveShape::power(FixedPoint::ONE, FixedPoint::ZERO, 1, 1).unwrap()
    }

    fn flat(price: &str) -> CurveShape {
        CurveShape::power(FixedPoint::ZERO, fp(price), 1, 1).unwrap()
    }

    fn state(reserve: &str, supply: &str) -> ReserveState {
        ReserveState {
            reserve_balance: fp(reserve),
            reserve_decimals: 9,
            supply: fp(supply),
            supply_decimals: 9,
            elapsed_seconds: 0,
            freeze_after_seconds: None,
        }
    }

    /// A -> B (linear), B -> C (flat at 2)
    fn chain() -> (CurveHierarchy, HashMap<CurveId, ReserveState>) {
        let mut hierarchy = CurveHierarchy::new();
        let ab = hierarchy.register(market(A, B, linear()));
        let bc = hierarchy.register(market(B, C, flat("2")));
        let states = HashMap::from([(ab, state("500000", "1000")), (bc, state("100", "50"))]);
        (hierarchy, states)
    }

    #[test]
    fn test_mint_base58_round_trip() {
        let text = A.to_string();
        assert_eq!(text.parse::<Mint>().unwrap(), A);
        assert_eq!("not-base58!".parse::<Mint>(), Err(CurveError::ParseError));
        // Valid base58, wrong length
        assert_eq!("3mJr7AoUXx2Wqd".parse::<Mint>(), Err(CurveError::ParseError));
    }

    #[test]
    fn test_two_hop_path() {
        let (hierarchy, _) = chain();
        let path = hierarchy.path(A, C).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.mints(), vec![A, B, C]);
        assert!(path.hops.iter().all(|hop| hop.direction == Direction::Buy));

        assert_eq!(hierarchy.path(A, D), Err(CurveError::NoPathFound));
        assert!(hierarchy.path(A, A).unwrap().is_empty());
    }

    #[test]
    fn test_reverse_path_sells() {
        let (hierarchy, _) = chain();
        let path = hierarchy.path(C, A).unwrap();
        assert_eq!(path.mints(), vec![C, B, A]);
        assert!(path.hops.iter().all(|hop| hop.direction == Direction::Sell));
    }

    #[test]
    fn test_ties_broken_by_registration_order() {
        let mut hierarchy = CurveHierarchy::new();
        hierarchy.register(market(A, C, linear()));
        hierarchy.register(market(A, B, linear()));
        hierarchy.register(market(B, D, linear()));
        hierarchy.register(market(C, D, linear()));

        // Both A-B-D and A-C-D are two hops; A-C was registered first
        assert_eq!(hierarchy.path(A, D).unwrap().mints(), vec![A, C, D]);
    }

    #[test]
    fn test_swap_feeds_each_hop() {
        let (hierarchy, states) = chain();
        // 105,000 A buys 100 B; 100 B buys 50 C at a flat price of 2
        let result = hierarchy.swap(fp("105000"), A, C, &states).unwrap();
        assert_eq!(result.hop_amounts, vec![fp("100"), fp("50")]);
        assert_eq!(result.amount_out, fp("50"));

        // Selling 50 C back down the flat curve returns 100 B
        let result = hierarchy.swap(fp("50"), C, B, &states).unwrap();
        assert_eq!(result.amount_out, fp("100"));
    }

    #[test]
    fn test_swap_requires_every_hop_state() {
        let (hierarchy, mut states) = chain();
        states.remove(&CurveId(1));
        assert_eq!(
            hierarchy.swap(fp("105000"), A, C, &states),
            Err(CurveError::CurveUndefined)
        );
    }

    #[test]
    fn test_current_price_multiplies_hops() {
        let (hierarchy, states) = chain();
        // One C costs 2 B, one B costs 1000 A
        assert_eq!(hierarchy.current_price(A, C, &states).unwrap(), fp("2000"));
        assert_eq!(hierarchy.current_price(C, B, &states).unwrap(), fp("0.5"));
    }

    #[test]
    fn test_zero_sell_price_has_no_rate() {
        let (hierarchy, mut states) = chain();
        // Linear curve at zero supply pays nothing per unit sold
        states.insert(CurveId(0), state("0", "0"));
        assert_eq!(hierarchy.current_price(B, A, &states), Err(CurveError::CurveUndefined));
        assert_eq!(hierarchy.current_price(A, B, &states).unwrap(), FixedPoint::ZERO);
    }
}
