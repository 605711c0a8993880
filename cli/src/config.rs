//! Market file loading
//!
//! Markets are described in a TOML file, one `[[market]]` table per curve:
//!
//! ```toml
//! [[market]]
//! name = "sol-xyz"
//! base_mint = "So11111111111111111111111111111111111111112"
//! target_mint = "..."
//! curve = [{ offset = 0, shape = { kind = "power", c = "1", b = "0", pow = 1, frac = 1 } }]
//! royalties = { buy_base = "5", sell_base = "5" }
//! reserve = { reserve_amount = 500000000000000, reserve_decimals = 9, supply_amount = 1000000000000, supply_decimals = 9 }
//! ```

use anyhow::{Context, Result};
use curve_model::{
    CurveHierarchy, CurveId, FixedPoint, Market, Mint, PricingCurve, ReserveState, Royalties,
    RoyaltyPercentage, TimeComposite, TimedShape,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_MARKET_FILE: &str = "~/.config/curve-quote/markets.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketFile {
    #[serde(default, rename = "market")]
    pub markets: Vec<MarketConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketConfig {
    pub name: String,
    pub base_mint: Mint,
    pub target_mint: Mint,
    /// Shapes with their go-live offsets, first offset 0
    pub curve: Vec<TimedShape>,
    #[serde(default)]
    pub royalties: RoyaltyConfig,
    pub reserve: ReserveConfig,
}

/// Royalties as human percentages in [0, 100]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoyaltyConfig {
    pub buy_base: FixedPoint,
    pub buy_target: FixedPoint,
    pub sell_base: FixedPoint,
    pub sell_target: FixedPoint,
}

impl RoyaltyConfig {
    pub fn to_royalties(&self) -> Result<Royalties> {
        let pct = |field: &str, value: FixedPoint| {
            RoyaltyPercentage::from_percent(value)
                .with_context(|| format!("Invalid {} royalty: {}%", field, value))
        };
        Ok(Royalties {
            buy_base: pct("buy_base", self.buy_base)?,
            buy_target: pct("buy_target", self.buy_target)?,
            sell_base: pct("sell_base", self.sell_base)?,
            sell_target: pct("sell_target", self.sell_target)?,
        })
    }
}

/// Token-account snapshot in raw on-chain units
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReserveConfig {
    pub reserve_amount: u64,
    pub reserve_decimals: u8,
    pub supply_amount: u64,
    pub supply_decimals: u8,
    /// Unix time the curve went live; elapsed time is measured against now
    #[serde(default)]
    pub go_live_unix_time: Option<i64>,
    /// Unix time the curve was created; an earlier go-live is moved up to it
    #[serde(default)]
    pub created_unix_time: Option<i64>,
    /// Fixed elapsed time, takes precedence over `go_live_unix_time`
    #[serde(default)]
    pub elapsed_seconds: Option<i64>,
    /// Unix time after which the curve refuses trades
    #[serde(default)]
    pub freeze_swap_unix_time: Option<i64>,
}

impl ReserveConfig {
    /// Go-live time, never earlier than creation
    pub fn effective_go_live(&self) -> Option<i64> {
        match (self.go_live_unix_time, self.created_unix_time) {
            (Some(go_live), Some(created)) => Some(go_live.max(created)),
            (go_live, _) => go_live,
        }
    }

    pub fn to_state(&self, now_unix: i64) -> Result<ReserveState> {
        let elapsed = match (self.elapsed_seconds, self.effective_go_live()) {
            (Some(elapsed), _) => elapsed,
            (None, Some(go_live)) => now_unix.saturating_sub(go_live),
            (None, None) => 0,
        };
        // Freeze time moved onto the elapsed clock
        let freeze_after = self
            .freeze_swap_unix_time
            .map(|freeze| elapsed.saturating_add(freeze.saturating_sub(now_unix)));
        let state = ReserveState::from_amounts(
            self.reserve_amount,
            self.reserve_decimals,
            self.supply_amount,
            self.supply_decimals,
            elapsed,
        )?
        .with_freeze_after(freeze_after);
        Ok(state)
    }
}

/// Loaded markets: the routing hierarchy plus each curve's snapshot
pub struct Markets {
    pub hierarchy: CurveHierarchy,
    pub states: HashMap<CurveId, ReserveState>,
    names: Vec<String>,
}

impl Markets {
    /// Read and parse a market file, expanding `~` and environment variables
    pub fn load(raw_path: &str) -> Result<Self> {
        let path = resolve_path(raw_path)?;
        if !path.exists() {
            anyhow::bail!(
                "Market file not found: {}\n\
                 Pass one with --market-file or create {}",
                path.display(),
                DEFAULT_MARKET_FILE
            );
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read market file: {}", path.display()))?;
        Self::from_toml(&text, chrono::Utc::now().timestamp())
            .with_context(|| format!("Invalid market file: {}", path.display()))
    }

    pub fn from_toml(text: &str, now_unix: i64) -> Result<Self> {
        let file: MarketFile = toml::from_str(text).context("Failed to parse market TOML")?;

        let mut hierarchy = CurveHierarchy::new();
        let mut states = HashMap::new();
        let mut names: Vec<String> = Vec::with_capacity(file.markets.len());

        for market in file.markets {
            if names.contains(&market.name) {
                anyhow::bail!("Duplicate market name: {}", market.name);
            }
            let curve = TimeComposite::from_entries(market.curve)
                .with_context(|| format!("Market {}: bad curve", market.name))?;
            let royalties = market
                .royalties
                .to_royalties()
                .with_context(|| format!("Market {}: bad royalties", market.name))?;
            let state = market
                .reserve
                .to_state(now_unix)
                .with_context(|| format!("Market {}: bad reserve snapshot", market.name))?;

            let id = hierarchy.register(Market {
                base_mint: market.base_mint,
                target_mint: market.target_mint,
                curve: PricingCurve::new(curve)?,
                royalties,
            });
            log::debug!("registered market {} as {}", market.name, id);
            states.insert(id, state);
            names.push(market.name);
        }

        Ok(Self {
            hierarchy,
            states,
            names,
        })
    }

    /// Look a market up by name, or by `#index`
    pub fn resolve(&self, name: &str) -> Result<CurveId> {
        if let Some(index) = name.strip_prefix('#') {
            let index: usize = index
                .parse()
                .with_context(|| format!("Invalid market index: {}", name))?;
            if index < self.names.len() {
                return Ok(CurveId(index));
            }
            anyhow::bail!("No market at index {}", index);
        }
        self.names
            .iter()
            .position(|n| n == name)
            .map(CurveId)
            .with_context(|| format!("Unknown market: {}", name))
    }

    pub fn name(&self, id: CurveId) -> &str {
        self.names.get(id.0).map(String::as_str).unwrap_or("?")
    }

    pub fn market(&self, id: CurveId) -> Result<(&Market, &ReserveState)> {
        let market = self
            .hierarchy
            .market(id)
            .with_context(|| format!("No market {}", id))?;
        let state = self
            .states
            .get(&id)
            .with_context(|| format!("No reserve snapshot for market {}", id))?;
        Ok((market, state))
    }
}

fn resolve_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.into_owned()))
}
