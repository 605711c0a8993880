//! Single-market quotes

use anyhow::{Context, Result};
use colored::Colorize;
use curve_model::{CurveId, FixedPoint, PricingQuote, Royalties};
use serde::Serialize;

use crate::config::Markets;
use crate::print_json;

#[derive(Serialize)]
struct QuoteReport<'a> {
    market: &'a str,
    operation: &'static str,
    input: FixedPoint,
    slippage: FixedPoint,
    #[serde(flatten)]
    quote: PricingQuote,
}

#[derive(Serialize)]
struct PriceReport<'a> {
    market: &'a str,
    supply: FixedPoint,
    buy_price: FixedPoint,
    sell_price: FixedPoint,
    locked: FixedPoint,
    elapsed_seconds: i64,
    frozen: bool,
    active_shape: usize,
    royalties: RoyaltyReport,
}

/// Royalties back in human percentages
#[derive(Serialize)]
struct RoyaltyReport {
    buy_base: FixedPoint,
    buy_target: FixedPoint,
    sell_base: FixedPoint,
    sell_target: FixedPoint,
}

impl RoyaltyReport {
    fn new(royalties: &Royalties) -> Result<Self> {
        Ok(Self {
            buy_base: royalties.buy_base.as_percent()?,
            buy_target: royalties.buy_target.as_percent()?,
            sell_base: royalties.sell_base.as_percent()?,
            sell_target: royalties.sell_target.as_percent()?,
        })
    }
}

fn print_quote(report: &QuoteReport, amount_label: &str, bound_label: &str, show_estimates: bool) {
    println!("{}", format!("=== {} ===", report.operation).bright_green().bold());
    println!("{} {}", "Market:".bright_cyan(), report.market);
    println!("{} {}", "Input:".bright_cyan(), report.input);
    println!("{} {}", amount_label.bright_cyan(), report.quote.amount.to_string().bold());
    if !report.slippage.is_zero() {
        println!("{} {}", bound_label.bright_cyan(), report.quote.bounded_price);
    }
    if show_estimates && !report.quote.root_estimates.is_empty() {
        println!("{}", "Root estimates:".bright_cyan());
        for (i, estimate) in report.quote.root_estimates.iter().enumerate() {
            println!("  {:>3}  {}", i, estimate.to_string().dimmed());
        }
    } else if !report.quote.root_estimates.is_empty() {
        println!(
            "{} {}",
            "Root estimates:".bright_cyan(),
            report.quote.root_estimates.len()
        );
    }
}

fn lookup<'a>(markets: &'a Markets, name: &str) -> Result<(CurveId, &'a str)> {
    let id = markets.resolve(name)?;
    Ok((id, markets.name(id)))
}

pub fn buy(markets: &Markets, market: &str, amount: FixedPoint, slippage: FixedPoint, json: bool) -> Result<()> {
    let (id, name) = lookup(markets, market)?;
    let (market, state) = markets.market(id)?;
    let quote = market
        .curve
        .quote_buy_target(state, amount, &market.royalties, slippage)
        .with_context(|| format!("Failed to quote buy of {} on {}", amount, name))?;
    log::info!("buy {} on {}: {} base", amount, name, quote.amount);

    let report = QuoteReport {
        market: name,
        operation: "Buy",
        input: amount,
        slippage,
        quote,
    };
    if json {
        return print_json(&report);
    }
    print_quote(&report, "Base required:", "Max base in:", true);
    Ok(())
}

pub fn buy_with_base(
    markets: &Markets,
    market: &str,
    amount: FixedPoint,
    slippage: FixedPoint,
    show_estimates: bool,
    json: bool,
) -> Result<()> {
    let (id, name) = lookup(markets, market)?;
    let (market, state) = markets.market(id)?;
    let quote = market
        .curve
        .quote_buy_with_base(state, amount, &market.royalties, slippage)
        .with_context(|| format!("Failed to quote buy with {} base on {}", amount, name))?;
    log::info!("buy with {} base on {}: {} target", amount, name, quote.amount);

    let report = QuoteReport {
        market: name,
        operation: "Buy With Base",
        input: amount,
        slippage,
        quote,
    };
    if json {
        return print_json(&report);
    }
    print_quote(&report, "Target received:", "Min target out:", show_estimates);
    Ok(())
}

pub fn sell(markets: &Markets, market: &str, amount: FixedPoint, slippage: FixedPoint, json: bool) -> Result<()> {
    let (id, name) = lookup(markets, market)?;
    let (market, state) = markets.market(id)?;
    let quote = market
        .curve
        .quote_sell_target(state, amount, &market.royalties, slippage)
        .with_context(|| format!("Failed to quote sell of {} on {}", amount, name))?;
    log::info!("sell {} on {}: {} base", amount, name, quote.amount);

    let report = QuoteReport {
        market: name,
        operation: "Sell",
        input: amount,
        slippage,
        quote,
    };
    if json {
        return print_json(&report);
    }
    print_quote(&report, "Base returned:", "Min base out:", true);
    Ok(())
}

pub fn show_price(markets: &Markets, market: &str, json: bool) -> Result<()> {
    let (id, name) = lookup(markets, market)?;
    let (market, state) = markets.market(id)?;
    let curve = &market.curve;

    let report = PriceReport {
        market: name,
        supply: state.supply,
        buy_price: curve.current(state, &market.royalties)?,
        sell_price: curve.current_sell(state, &market.royalties)?,
        locked: curve.locked(state)?,
        elapsed_seconds: state.elapsed_seconds,
        frozen: state.is_frozen(),
        active_shape: curve.curve().active_index(state.elapsed_seconds),
        royalties: RoyaltyReport::new(&market.royalties)?,
    };
    if json {
        return print_json(&report);
    }

    println!("{}", "=== Spot Price ===".bright_green().bold());
    println!("{} {}", "Market:".bright_cyan(), report.market);
    println!("{} {}", "Supply:".bright_cyan(), report.supply);
    println!("{} {}", "Buy price:".bright_cyan(), report.buy_price.to_string().bold());
    println!("{} {}", "Sell price:".bright_cyan(), report.sell_price.to_string().bold());
    println!("{} {}", "Locked:".bright_cyan(), report.locked);
    println!(
        "{} {} of {} (elapsed {}s)",
        "Active shape:".bright_cyan(),
        report.active_shape + 1,
        curve.curve().entries().len(),
        report.elapsed_seconds
    );
    if report.frozen {
        println!("{}", "Swaps are frozen".red().bold());
    }
    let r = &report.royalties;
    println!(
        "{} buy {}% / {}%, sell {}% / {}% (base / target)",
        "Royalties:".bright_cyan(),
        r.buy_base,
        r.buy_target,
        r.sell_base,
        r.sell_target
    );
    Ok(())
}
