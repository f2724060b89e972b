// =============================================================================
// Shared types used across the Chartist analyzer
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLCV candle fetched from the exchange.
///
/// Candles arrive ordered by strictly increasing `open_time` and are never
/// mutated after ingestion; every engine reads the same shared slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        close_time: i64,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
        }
    }
}

/// Moving-average flavor shared by the RSI smoothing pass and the MA-cross
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaType {
    Sma,
    Ema,
}

impl Default for MaType {
    fn default() -> Self {
        Self::Sma
    }
}

impl std::fmt::Display for MaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma => write!(f, "SMA"),
            Self::Ema => write!(f, "EMA"),
        }
    }
}

/// Extract the close series from a candle slice.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract the high series from a candle slice.
pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

/// Extract the low series from a candle slice.
pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}
