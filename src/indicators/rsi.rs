// =============================================================================
// Relative Strength Index (RSI) — Wilder's smoothing plus divergence scan
// =============================================================================
//
// Step 1 — delta[i] = close[i] - close[i-1]; gains clamp negative deltas to 0,
//          losses clamp positive deltas to 0 (position 0 counts as zero gain
//          and zero loss).
// Step 2 — avg_gain / avg_loss = exponential mean with Wilder's constant
//          alpha = 1 / length.
// Step 3 — RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS).
//          Zero-division policy: avg_loss == 0 with gains present => RSI 100;
//          avg_loss == 0 with no gains either (flat so far) => no value.
// Step 4 — a second smoothing pass (SMA or EMA per config) produces the
//          smoothed RSI; every signal reads the smoothed series, not the raw.
//
// Divergence compares the two most recent price peaks (troughs) against the
// RSI peaks (troughs) nearest to them by bar index.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::series::{self, Series};
use crate::signal::{Signal, SignalKind};
use crate::types::{closes, Candle, MaType};

/// RSI parameters.  Limits must be strictly ordered, lengths positive, and
/// the divergence peak window odd (it is a centered window).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub length: usize,
    pub smoothing: MaType,
    pub smoothing_length: usize,
    pub upper_limit: f64,
    pub middle_limit: f64,
    pub lower_limit: f64,
    pub divergence_lookback: usize,
    pub peak_window: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            length: 14,
            smoothing: MaType::Sma,
            smoothing_length: 14,
            upper_limit: 70.0,
            middle_limit: 50.0,
            lower_limit: 30.0,
            divergence_lookback: 30,
            peak_window: 5,
        }
    }
}

impl RsiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.length == 0 || self.smoothing_length == 0 {
            bail!("rsi lengths must be positive");
        }
        if !(self.lower_limit < self.middle_limit && self.middle_limit < self.upper_limit) {
            bail!(
                "rsi limits must satisfy lower < middle < upper (got {}/{}/{})",
                self.lower_limit,
                self.middle_limit,
                self.upper_limit
            );
        }
        if self.divergence_lookback == 0 {
            bail!("rsi divergence lookback must be positive");
        }
        if self.peak_window == 0 || self.peak_window % 2 == 0 {
            bail!(
                "rsi peak window must be odd (centered window), got {}",
                self.peak_window
            );
        }
        Ok(())
    }
}

/// Latest RSI snapshot plus the configured limits, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiValues {
    pub rsi: Option<f64>,
    pub smoothed_rsi: Option<f64>,
    pub upper_limit: f64,
    pub middle_limit: f64,
    pub lower_limit: f64,
}

/// Signal set derived from the latest smoothed RSI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiAnalysis {
    pub condition: Option<Signal>,
    pub momentum: Option<Signal>,
    pub trend: Option<Signal>,
}

/// Outcome of a divergence scan that had enough data to run.
///
/// Both flags false means "checked, none found" — distinct from the
/// `Option::None` the engine returns when fewer than `lookback` candles
/// exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
    pub description: String,
}

impl Divergence {
    fn none_found() -> Self {
        Self {
            bullish_divergence: false,
            bearish_divergence: false,
            description: "No divergence detected".to_string(),
        }
    }
}

/// RSI engine: raw and smoothed series computed once at construction.
#[derive(Debug, Clone)]
pub struct Rsi {
    config: RsiConfig,
    close: Series,
    rsi: Series,
    smoothed: Series,
}

impl Rsi {
    /// Compute the raw and smoothed RSI series over `candles`.
    pub fn compute(candles: &[Candle], config: RsiConfig) -> Result<Self> {
        config.validate()?;

        let close_values = closes(candles);
        let mut gains = Vec::with_capacity(close_values.len());
        let mut losses = Vec::with_capacity(close_values.len());
        for (i, &c) in close_values.iter().enumerate() {
            if i == 0 {
                // No predecessor: zero gain and zero loss seed the averages.
                gains.push(Some(0.0));
                losses.push(Some(0.0));
            } else {
                let delta = c - close_values[i - 1];
                gains.push(Some(delta.max(0.0)));
                losses.push(Some((-delta).max(0.0)));
            }
        }

        let alpha = series::wilder_alpha(config.length);
        let avg_gains = series::ewm_mean(&gains, alpha);
        let avg_losses = series::ewm_mean(&losses, alpha);

        let rsi: Series = avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(g, l)| match (g, l) {
                (Some(gain), Some(loss)) if *loss > 0.0 => {
                    let rs = gain / loss;
                    Some(100.0 - 100.0 / (1.0 + rs))
                }
                // Only gains so far: RS is unbounded, RSI saturates at 100.
                (Some(gain), Some(_)) if *gain > 0.0 => Some(100.0),
                // Flat so far: 0/0 carries no information.
                _ => None,
            })
            .collect();

        let smoothed = match config.smoothing {
            MaType::Sma => series::rolling_mean(&rsi, config.smoothing_length),
            MaType::Ema => series::ewm_mean(&rsi, series::span_alpha(config.smoothing_length)),
        };

        Ok(Self {
            config,
            close: series::from_values(&close_values),
            rsi,
            smoothed,
        })
    }

    /// Latest raw and smoothed RSI values.
    pub fn current_values(&self) -> RsiValues {
        RsiValues {
            rsi: series::latest(&self.rsi),
            smoothed_rsi: series::latest(&self.smoothed),
            upper_limit: self.config.upper_limit,
            middle_limit: self.config.middle_limit,
            lower_limit: self.config.lower_limit,
        }
    }

    /// Derive condition, momentum, and trend signals from the smoothed RSI.
    pub fn analyze(&self) -> (RsiValues, RsiAnalysis) {
        let values = self.current_values();
        let config = &self.config;

        let (condition, momentum) = match values.smoothed_rsi {
            Some(current) => {
                let condition = if current >= config.upper_limit {
                    Signal::new(
                        SignalKind::Overbought,
                        format!(
                            "RSI {current:.2} >= {} (Potential reversal down)",
                            config.upper_limit
                        ),
                    )
                } else if current <= config.lower_limit {
                    Signal::new(
                        SignalKind::Oversold,
                        format!(
                            "RSI {current:.2} <= {} (Potential reversal up)",
                            config.lower_limit
                        ),
                    )
                } else {
                    Signal::new(
                        SignalKind::Neutral,
                        format!(
                            "RSI {current:.2} between {}-{}",
                            config.lower_limit, config.upper_limit
                        ),
                    )
                };
                let momentum = if current > config.middle_limit {
                    Signal::new(
                        SignalKind::Bullish,
                        format!("RSI {current:.2} > {} (Upward momentum)", config.middle_limit),
                    )
                } else {
                    Signal::new(
                        SignalKind::Bearish,
                        format!(
                            "RSI {current:.2} < {} (Downward momentum)",
                            config.middle_limit
                        ),
                    )
                };
                (Some(condition), Some(momentum))
            }
            None => (None, None),
        };

        // Trend: compare the smoothed value 5 bars back against the latest.
        let trend = if self.smoothed.len() >= 5 {
            let first = self.smoothed[self.smoothed.len() - 5];
            let last = series::latest(&self.smoothed);
            match (first, last) {
                (Some(first), Some(last)) => Some(if last > first {
                    Signal::new(
                        SignalKind::Rising,
                        format!("RSI trending up from {first:.2} to {last:.2}"),
                    )
                } else {
                    Signal::new(
                        SignalKind::Falling,
                        format!("RSI trending down from {first:.2} to {last:.2}"),
                    )
                }),
                _ => None,
            }
        } else {
            None
        };

        (
            values,
            RsiAnalysis {
                condition,
                momentum,
                trend,
            },
        )
    }

    /// Scan the trailing `divergence_lookback` bars for price/RSI divergence.
    ///
    /// Returns `None` when fewer than `divergence_lookback` candles exist —
    /// "not enough data to check" is deliberately distinct from a
    /// [`Divergence`] with both flags false ("checked, none found").
    pub fn divergence(&self) -> Option<Divergence> {
        let lookback = self.config.divergence_lookback;
        if self.close.len() < lookback {
            return None;
        }

        let recent_prices = &self.close[self.close.len() - lookback..];
        let recent_rsi = &self.smoothed[self.smoothed.len() - lookback..];

        Some(detect_divergence(
            recent_prices,
            recent_rsi,
            self.config.peak_window,
        ))
    }
}

// -----------------------------------------------------------------------------
// Divergence detection
// -----------------------------------------------------------------------------

/// Peak/trough positions of a series: index paired with value.
type Extrema = Vec<(usize, f64)>;

/// Positions whose value equals the centered rolling max (peaks) of the
/// window.  Boundary positions with an incomplete window never qualify.
fn find_peaks(values: &[Option<f64>], window: usize) -> Extrema {
    let rolled = series::rolling_max_centered(values, window);
    match_extrema(values, &rolled)
}

/// Positions whose value equals the centered rolling min (troughs).
fn find_troughs(values: &[Option<f64>], window: usize) -> Extrema {
    let rolled = series::rolling_min_centered(values, window);
    match_extrema(values, &rolled)
}

fn match_extrema(values: &[Option<f64>], rolled: &[Option<f64>]) -> Extrema {
    values
        .iter()
        .zip(rolled.iter())
        .enumerate()
        .filter_map(|(i, (v, r))| match (v, r) {
            (Some(v), Some(r)) if v == r => Some((i, *v)),
            _ => None,
        })
        .collect()
}

/// The extremum whose index is closest to `target`.
///
/// Ties in absolute distance go to the earlier index: the list is scanned in
/// ascending order and a later candidate must be strictly closer to win.
fn nearest(extrema: &Extrema, target: usize) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut best_distance = usize::MAX;
    for &(idx, value) in extrema {
        let distance = idx.abs_diff(target);
        if distance < best_distance {
            best_distance = distance;
            best = Some((idx, value));
        }
    }
    best
}

/// Compare the two most recent price extrema against the RSI extrema nearest
/// to them.  Bearish (higher price highs, lower RSI highs) is checked first
/// and short-circuits, then bullish (lower price lows, higher RSI lows).
fn detect_divergence(prices: &[Option<f64>], rsi: &[Option<f64>], peak_window: usize) -> Divergence {
    let price_peaks = find_peaks(prices, peak_window);
    let rsi_peaks = find_peaks(rsi, peak_window);

    if price_peaks.len() >= 2 && rsi_peaks.len() >= 2 {
        let (last_idx, last_price) = price_peaks[price_peaks.len() - 1];
        let (prev_idx, prev_price) = price_peaks[price_peaks.len() - 2];

        if let (Some((_, last_rsi)), Some((_, prev_rsi))) =
            (nearest(&rsi_peaks, last_idx), nearest(&rsi_peaks, prev_idx))
        {
            if last_price > prev_price && last_rsi < prev_rsi {
                return Divergence {
                    bullish_divergence: false,
                    bearish_divergence: true,
                    description:
                        "Bearish divergence: Price making higher highs, RSI making lower highs"
                            .to_string(),
                };
            }
        }
    }

    let price_troughs = find_troughs(prices, peak_window);
    let rsi_troughs = find_troughs(rsi, peak_window);

    if price_troughs.len() >= 2 && rsi_troughs.len() >= 2 {
        let (last_idx, last_price) = price_troughs[price_troughs.len() - 1];
        let (prev_idx, prev_price) = price_troughs[price_troughs.len() - 2];

        if let (Some((_, last_rsi)), Some((_, prev_rsi))) = (
            nearest(&rsi_troughs, last_idx),
            nearest(&rsi_troughs, prev_idx),
        ) {
            if last_price < prev_price && last_rsi > prev_rsi {
                return Divergence {
                    bullish_divergence: true,
                    bearish_divergence: false,
                    description:
                        "Bullish divergence: Price making lower lows, RSI making higher lows"
                            .to_string(),
                };
            }
        }
    }

    Divergence::none_found()
}
