//! Market listing and multi-hop routing

use anyhow::{Context, Result};
use colored::Colorize;
use curve_model::{Direction, FixedPoint, Hop, Mint, PricePath, SwapResult};
use serde::Serialize;

use crate::config::Markets;
use crate::print_json;

#[derive(Serialize)]
struct MarketSummary<'a> {
    id: usize,
    name: &'a str,
    base_mint: Mint,
    target_mint: Mint,
    shapes: usize,
    supply: Option<FixedPoint>,
    reserve: Option<FixedPoint>,
}

pub fn list_markets(markets: &Markets, json: bool) -> Result<()> {
    let summaries: Vec<MarketSummary> = markets
        .hierarchy
        .markets()
        .map(|(id, market)| {
            let state = markets.states.get(&id);
            MarketSummary {
                id: id.0,
                name: markets.name(id),
                base_mint: market.base_mint,
                target_mint: market.target_mint,
                shapes: market.curve.curve().entries().len(),
                supply: state.map(|s| s.supply),
                reserve: state.map(|s| s.reserve_balance),
            }
        })
        .collect();

    if json {
        return print_json(&summaries);
    }

    println!("{}", "=== Markets ===".bright_green().bold());
    if summaries.is_empty() {
        println!("{}", "No markets configured".dimmed());
        return Ok(());
    }
    for summary in &summaries {
        println!("{} {}", format!("#{}", summary.id).bright_cyan(), summary.name.bold());
        println!("    {} {}", "Base:".bright_cyan(), summary.base_mint);
        println!("    {} {}", "Target:".bright_cyan(), summary.target_mint);
        println!("    {} {}", "Shapes:".bright_cyan(), summary.shapes);
        if let (Some(supply), Some(reserve)) = (summary.supply, summary.reserve) {
            println!("    {} {}", "Supply:".bright_cyan(), supply);
            println!("    {} {}", "Reserve:".bright_cyan(), reserve);
        }
    }
    Ok(())
}

fn describe_hop(markets: &Markets, hop: &Hop) -> String {
    let action = match hop.direction {
        Direction::Buy => "buy".green(),
        Direction::Sell => "sell".red(),
    };
    format!(
        "{} on {} ({} -> {})",
        action,
        markets.name(hop.curve),
        hop.from,
        hop.to
    )
}

fn find_path(markets: &Markets, from: Mint, to: Mint) -> Result<PricePath> {
    markets
        .hierarchy
        .path(from, to)
        .with_context(|| format!("No route from {} to {}", from, to))
}

pub fn show_path(markets: &Markets, from: Mint, to: Mint, json: bool) -> Result<()> {
    let path = find_path(markets, from, to)?;
    if json {
        return print_json(&path);
    }

    println!("{}", "=== Route ===".bright_green().bold());
    if path.is_empty() {
        println!("{}", "Same mint, nothing to route".dimmed());
        return Ok(());
    }
    for (i, hop) in path.hops.iter().enumerate() {
        println!("  {}. {}", i + 1, describe_hop(markets, hop));
    }
    Ok(())
}

pub fn swap(markets: &Markets, from: Mint, to: Mint, amount: FixedPoint, json: bool) -> Result<()> {
    let result: SwapResult = markets
        .hierarchy
        .swap(amount, from, to, &markets.states)
        .with_context(|| format!("Failed to swap {} {} into {}", amount, from, to))?;
    log::info!("swap {} {} -> {} {}", amount, from, result.amount_out, to);

    if json {
        return print_json(&result);
    }

    println!("{}", "=== Swap ===".bright_green().bold());
    println!("{} {} {}", "Spend:".bright_cyan(), amount, from);
    for (hop, held) in result.path.hops.iter().zip(&result.hop_amounts) {
        println!("  {} => {}", describe_hop(markets, hop), held);
    }
    println!("{} {} {}", "Receive:".bright_cyan(), result.amount_out.to_string().bold(), to);
    Ok(())
}

#[derive(Serialize)]
struct RateReport {
    from: Mint,
    to: Mint,
    price: FixedPoint,
    hops: usize,
}

pub fn show_rate(markets: &Markets, from: Mint, to: Mint, json: bool) -> Result<()> {
    let hops = find_path(markets, from, to)?.len();
    let price = markets
        .hierarchy
        .current_price(from, to, &markets.states)
        .with_context(|| format!("Failed to price {} in {}", to, from))?;

    if json {
        return print_json(&RateReport { from, to, price, hops });
    }

    println!("{}", "=== Spot Rate ===".bright_green().bold());
    println!("{} {} {} per {}", "Price:".bright_cyan(), price.to_string().bold(), from, to);
    println!("{} {}", "Hops:".bright_cyan(), hops);
    Ok(())
}
