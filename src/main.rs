// =============================================================================
// Chartist — Multi-Indicator Market Analyzer
// =============================================================================
//
// Fetches a window of candles per configured symbol from the Binance public
// API, runs the four indicator engines (Ichimoku, RSI, Williams Fractals,
// MA cross), and renders a colorized console report.  One failing symbol or
// engine degrades to a partial report; it never aborts the run.
// =============================================================================

mod binance;
mod config;
mod indicators;
mod report;
mod series;
mod signal;
mod types;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::binance::BinanceClient;
use crate::config::AnalyzerConfig;
use crate::indicators::fractals::Fractals;
use crate::indicators::ichimoku::Ichimoku;
use crate::indicators::ma_cross::MaCross;
use crate::indicators::rsi::Rsi;
use crate::types::Candle;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = AnalyzerConfig::load("analyzer_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });
    config.apply_env_overrides();
    config.validate().context("invalid analyzer configuration")?;

    info!(
        symbols = ?config.symbols,
        interval = %config.interval,
        candles = config.candle_limit,
        "starting analysis run"
    );

    let client = BinanceClient::new();

    for symbol in &config.symbols {
        if let Err(e) = analyze_symbol(&client, &config, symbol).await {
            error!(symbol, error = %e, "symbol analysis failed — continuing");
        }
    }

    Ok(())
}

/// Fetch market data for one symbol and render all four analysis sections.
async fn analyze_symbol(
    client: &BinanceClient,
    config: &AnalyzerConfig,
    symbol: &str,
) -> Result<()> {
    let candles = client
        .get_klines(symbol, &config.interval, config.candle_limit)
        .await
        .with_context(|| format!("failed to fetch klines for {symbol}"))?;
    let current_price = client
        .get_ticker_price(symbol)
        .await
        .with_context(|| format!("failed to fetch ticker price for {symbol}"))?;

    info!(
        symbol,
        candles = candles.len(),
        price = current_price,
        "market data fetched"
    );

    run_engines(config, symbol, &candles, current_price);
    Ok(())
}

/// Run every engine over the shared candle slice.  A failed engine logs and
/// skips its section; the rest of the report still renders.
fn run_engines(config: &AnalyzerConfig, symbol: &str, candles: &[Candle], current_price: f64) {
    match Ichimoku::compute(candles, config.ichimoku.clone()) {
        Ok(ichimoku) => {
            let (values, analysis) = ichimoku.analyze(current_price);
            report::print_ichimoku(symbol, current_price, &values, &analysis);
        }
        Err(e) => warn!(symbol, error = %e, "ichimoku engine skipped"),
    }

    match Rsi::compute(candles, config.rsi.clone()) {
        Ok(rsi) => {
            let (values, analysis) = rsi.analyze();
            let divergence = rsi.divergence();
            report::print_rsi(symbol, &values, &analysis, divergence.as_ref());
        }
        Err(e) => warn!(symbol, error = %e, "rsi engine skipped"),
    }

    match Fractals::compute(candles, config.fractal.clone()) {
        Ok(fractals) => {
            let (values, analysis) = fractals.analyze(current_price);
            report::print_fractals(symbol, &values, &analysis);
        }
        Err(e) => warn!(symbol, error = %e, "fractal engine skipped"),
    }

    match MaCross::compute(candles, config.ma_cross.clone()) {
        Ok(ma_cross) => {
            let (values, analysis) = ma_cross.analyze(current_price);
            let history = ma_cross.cross_history(config.cross_lookback);
            report::print_ma_cross(
                symbol,
                &config.ma_cross,
                &values,
                &analysis,
                &history,
                candles,
            );
        }
        Err(e) => warn!(symbol, error = %e, "ma-cross engine skipped"),
    }
}
