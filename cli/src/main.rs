//! Curve Quote CLI - Offline bonding curve pricing
//!
//! Quotes buys and sells against bonding curves described in a market file,
//! and routes trades across curves that share mints.

use clap::{Parser, Subcommand};
use colored::Colorize;
use curve_model::{FixedPoint, Mint};

mod config;
mod quote;
mod route;

use config::{Markets, DEFAULT_MARKET_FILE};

#[derive(Parser)]
#[command(name = "curve-quote")]
#[command(about = "Bonding curve pricing - quote buys, sells and multi-hop swaps", long_about = None)]
#[command(version)]
struct Cli {
    /// Market definitions (TOML)
    #[arg(short, long, default_value = DEFAULT_MARKET_FILE)]
    market_file: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured markets
    Markets,

    /// Quote a trade against one market
    Quote {
        #[command(subcommand)]
        command: QuoteCommands,
    },

    /// Spot prices and locked reserve of a market
    Price {
        /// Market name or #index
        market: String,
    },

    /// Fewest-hops route between two mints
    Path {
        /// Mint to spend (base58)
        from: Mint,

        /// Mint to receive (base58)
        to: Mint,
    },

    /// Chain a trade across every hop between two mints
    Swap {
        /// Mint to spend (base58)
        from: Mint,

        /// Mint to receive (base58)
        to: Mint,

        /// Amount of `from` to spend
        amount: FixedPoint,
    },

    /// Spot price of one unit of `to` in units of `from`
    Rate {
        /// Mint to spend (base58)
        from: Mint,

        /// Mint to receive (base58)
        to: Mint,
    },
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Base required to receive an exact target amount
    Buy {
        /// Market name or #index
        market: String,

        /// Target amount to receive
        amount: FixedPoint,

        /// Accepted slippage as a fraction (0.01 = 1%)
        #[arg(short, long, default_value = "0")]
        slippage: FixedPoint,
    },

    /// Target received for an exact base amount
    BuyWithBase {
        /// Market name or #index
        market: String,

        /// Base amount to spend
        amount: FixedPoint,

        /// Accepted slippage as a fraction (0.01 = 1%)
        #[arg(short, long, default_value = "0")]
        slippage: FixedPoint,

        /// Also print every solver estimate
        #[arg(long)]
        estimates: bool,
    },

    /// Base returned for selling an exact target amount
    Sell {
        /// Market name or #index
        market: String,

        /// Target amount to sell
        amount: FixedPoint,

        /// Accepted slippage as a fraction (0.01 = 1%)
        #[arg(short, long, default_value = "0")]
        slippage: FixedPoint,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let markets = Markets::load(&cli.market_file)?;

    if cli.verbose {
        println!("{} {}", "Market file:".bright_cyan(), cli.market_file);
        println!("{} {}", "Markets:".bright_cyan(), markets.hierarchy.len());
    }

    match cli.command {
        Commands::Markets => route::list_markets(&markets, cli.json)?,
        Commands::Quote { command } => match command {
            QuoteCommands::Buy { market, amount, slippage } => {
                quote::buy(&markets, &market, amount, slippage, cli.json)?;
            }
            QuoteCommands::BuyWithBase { market, amount, slippage, estimates } => {
                quote::buy_with_base(&markets, &market, amount, slippage, estimates, cli.json)?;
            }
            QuoteCommands::Sell { market, amount, slippage } => {
                quote::sell(&markets, &market, amount, slippage, cli.json)?;
            }
        },
        Commands::Price { market } => quote::show_price(&markets, &market, cli.json)?,
        Commands::Path { from, to } => route::show_path(&markets, from, to, cli.json)?,
        Commands::Swap { from, to, amount } => route::swap(&markets, from, to, amount, cli.json)?,
        Commands::Rate { from, to } => route::show_rate(&markets, from, to, cli.json)?,
    }

    Ok(())
}

/// Print a serializable report as pretty JSON
pub(crate) fn print_json<T: serde::Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
