// =============================================================================
// Williams Fractals — local extrema, support/resistance, fractal sequence
// =============================================================================
//
// A bar is an up-fractal when its high equals the centered rolling max over
// the `2n + 1` window, a down-fractal when its low equals the centered rolling
// min.  Known edge case, kept on purpose: the equality test against the
// rolling extremum means a plateau of equal highs flags every bar of the
// plateau, where a strict neighbor comparison would flag none.
//
// The recent-sequence scan walks backward from the second-to-last bar (the
// most recent bar is skipped by convention — it cannot be a confirmed
// fractal yet) collecting up/down tokens until 10 fractals are found.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::series::{self, Series};
use crate::signal::{Signal, SignalKind};
use crate::types::{highs, lows, Candle};

/// Number of recent fractal values kept per side for the trend comparison.
const RECENT_FRACTALS: usize = 5;

/// Length of the backward-scanned fractal token sequence.
const SEQUENCE_LENGTH: usize = 10;

/// Fractal parameters: `period` is the half-window `n` (full window `2n+1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub period: usize,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self { period: 2 }
    }
}

impl FractalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            bail!("fractal period (half-window) must be positive");
        }
        Ok(())
    }
}

/// Latest fractal snapshot: last confirmed levels plus the short history used
/// for the trend check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalValues {
    pub last_up_fractal: Option<f64>,
    pub last_down_fractal: Option<f64>,
    /// Up to 5 most recent up-fractal values, oldest first.
    pub recent_up_fractals: Vec<f64>,
    /// Up to 5 most recent down-fractal values, oldest first.
    pub recent_down_fractals: Vec<f64>,
    pub up_fractal_count: usize,
    pub down_fractal_count: usize,
}

/// Percentage gaps from the current price to the fractal levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalDistances {
    pub to_resistance: f64,
    pub to_support: f64,
    pub description: String,
}

/// One entry of the backward-scanned fractal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractalToken {
    Up,
    Down,
    /// Padding when fewer than 10 fractals exist in the series.
    None,
}

impl std::fmt::Display for FractalToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Which fractal side dominates the recent sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractalDominance {
    Up,
    Down,
    Unclear,
}

/// The 10 most recent fractal occurrences (most recent first) and their
/// dominance count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalSequence {
    pub tokens: Vec<FractalToken>,
    pub up_count: usize,
    pub down_count: usize,
    pub dominance: FractalDominance,
    pub description: String,
}

/// Signal set derived from the latest fractal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalAnalysis {
    pub position: Option<Signal>,
    pub fractal_trend: Option<Signal>,
    pub distances: Option<FractalDistances>,
    pub recent_sequence: FractalSequence,
}

/// Williams Fractals engine: flag series computed once at construction.
#[derive(Debug, Clone)]
pub struct Fractals {
    fractal_up: Series,
    fractal_down: Series,
}

impl Fractals {
    /// Flag up/down fractals over `candles` for half-window `config.period`.
    pub fn compute(candles: &[Candle], config: FractalConfig) -> Result<Self> {
        config.validate()?;
        let window = 2 * config.period + 1;

        let high = series::from_values(&highs(candles));
        let low = series::from_values(&lows(candles));

        let rolled_max = series::rolling_max_centered(&high, window);
        let fractal_up = flag_extrema(&high, &rolled_max);

        let rolled_min = series::rolling_min_centered(&low, window);
        let fractal_down = flag_extrema(&low, &rolled_min);

        Ok(Self {
            fractal_up,
            fractal_down,
        })
    }

    /// Last confirmed fractal levels and the short per-side history.
    pub fn current_values(&self) -> FractalValues {
        let recent_up = recent_values(&self.fractal_up, RECENT_FRACTALS);
        let recent_down = recent_values(&self.fractal_down, RECENT_FRACTALS);

        FractalValues {
            last_up_fractal: recent_up.last().copied(),
            last_down_fractal: recent_down.last().copied(),
            up_fractal_count: recent_up.len(),
            down_fractal_count: recent_down.len(),
            recent_up_fractals: recent_up,
            recent_down_fractals: recent_down,
        }
    }

    /// Derive position, trend, distance, and sequence signals for
    /// `current_price`.
    pub fn analyze(&self, current_price: f64) -> (FractalValues, FractalAnalysis) {
        let values = self.current_values();

        // 1. Support/resistance position, only when both levels exist.
        let position = match (values.last_up_fractal, values.last_down_fractal) {
            (Some(up), Some(down)) => Some(if current_price > up {
                Signal::new(
                    SignalKind::Breakout,
                    format!("Price ${current_price:.2} broke above resistance ${up:.2}"),
                )
            } else if current_price < down {
                Signal::new(
                    SignalKind::Breakdown,
                    format!("Price ${current_price:.2} broke below support ${down:.2}"),
                )
            } else {
                Signal::new(
                    SignalKind::Range,
                    format!(
                        "Price ${current_price:.2} between support ${down:.2} and resistance ${up:.2}"
                    ),
                )
            }),
            _ => None,
        };

        // 2. Fractal trend: oldest vs newest of each 5-value history.
        let fractal_trend = if values.recent_up_fractals.len() >= 2
            && values.recent_down_fractals.len() >= 2
        {
            let up_rising = values.recent_up_fractals.last() > values.recent_up_fractals.first();
            let down_rising =
                values.recent_down_fractals.last() > values.recent_down_fractals.first();
            Some(if up_rising && down_rising {
                Signal::new(
                    SignalKind::Uptrend,
                    "Fractals showing higher highs and higher lows",
                )
            } else if !up_rising && !down_rising {
                Signal::new(
                    SignalKind::Downtrend,
                    "Fractals showing lower highs and lower lows",
                )
            } else {
                Signal::new(SignalKind::Mixed, "Fractals showing mixed signals")
            })
        } else {
            None
        };

        // 3. Percentage distance to each level.  Price zero has no meaningful
        // percentage: the field is simply absent.
        let distances = match (values.last_up_fractal, values.last_down_fractal) {
            (Some(up), Some(down)) if current_price != 0.0 => {
                let to_resistance = (up - current_price) / current_price * 100.0;
                let to_support = (current_price - down) / current_price * 100.0;
                Some(FractalDistances {
                    to_resistance,
                    to_support,
                    description: format!(
                        "Distance to resistance: {to_resistance:.2}%, to support: {to_support:.2}%"
                    ),
                })
            }
            _ => None,
        };

        let recent_sequence = self.recent_sequence();

        (
            values,
            FractalAnalysis {
                position,
                fractal_trend,
                distances,
                recent_sequence,
            },
        )
    }

    /// Walk backward from the second-to-last bar collecting the 10 most
    /// recent fractal occurrences, padding with `None` tokens when the series
    /// runs out.  A bar that is somehow both flags as `Up` (up wins).
    fn recent_sequence(&self) -> FractalSequence {
        let mut tokens = Vec::with_capacity(SEQUENCE_LENGTH);

        if self.fractal_up.len() >= 2 {
            for i in (0..self.fractal_up.len() - 1).rev() {
                if self.fractal_up[i].is_some() {
                    tokens.push(FractalToken::Up);
                } else if self.fractal_down[i].is_some() {
                    tokens.push(FractalToken::Down);
                }
                if tokens.len() == SEQUENCE_LENGTH {
                    break;
                }
            }
        }
        while tokens.len() < SEQUENCE_LENGTH {
            tokens.push(FractalToken::None);
        }

        let up_count = tokens.iter().filter(|t| **t == FractalToken::Up).count();
        let down_count = tokens.iter().filter(|t| **t == FractalToken::Down).count();

        let (dominance, dominance_text) = if up_count > down_count {
            (
                FractalDominance::Up,
                "UP fractals dominate recent price action",
            )
        } else if down_count > up_count {
            (
                FractalDominance::Down,
                "DOWN fractals dominate recent price action",
            )
        } else {
            (
                FractalDominance::Unclear,
                "No clear dominance in recent fractals",
            )
        };

        let sequence_text = tokens
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        FractalSequence {
            tokens,
            up_count,
            down_count,
            dominance,
            description: format!(
                "Recent fractal sequence (most recent first): {sequence_text}. {dominance_text}"
            ),
        }
    }
}

/// Keep the source value where it equals the centered rolling extremum.
fn flag_extrema(values: &Series, rolled: &Series) -> Series {
    values
        .iter()
        .zip(rolled.iter())
        .map(|(v, r)| match (v, r) {
            (Some(v), Some(r)) if v == r => Some(*v),
            _ => None,
        })
        .collect()
}

/// The up-to-`count` most recent flagged values, oldest first.
fn recent_values(series: &Series, count: usize) -> Vec<f64> {
    let mut recent: Vec<f64> = series.iter().rev().flatten().copied().take(count).collect();
    recent.reverse();
    recent
}
