// =============================================================================
// Ichimoku Kinko Hyo — cloud, conversion/base lines, and cloud signals
// =============================================================================
//
// Components (standard periods 9 / 26 / 52, displacement 26):
//   tenkan[i]        = (max(high, 9) + min(low, 9)) / 2
//   kijun[i]         = (max(high, 26) + min(low, 26)) / 2
//   senkou_span_a[i] = (tenkan[i] + kijun[i]) / 2
//   senkou_span_b[i] = (max(high, 52) + min(low, 52)) / 2
//
// The spans are stored as computed (not shifted).  The cloud that applies to
// the current price is read `displacement` bars back; the span values at the
// last bar are the cloud projected forward.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::series::{self, Series};
use crate::signal::{Signal, SignalKind};
use crate::types::{highs, lows, Candle};

/// Ichimoku periods.  All four must be positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IchimokuConfig {
    pub tenkan_period: usize,
    pub kijun_period: usize,
    pub senkou_b_period: usize,
    pub displacement: usize,
}

impl Default for IchimokuConfig {
    fn default() -> Self {
        Self {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
            displacement: 26,
        }
    }
}

impl IchimokuConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tenkan_period == 0
            || self.kijun_period == 0
            || self.senkou_b_period == 0
            || self.displacement == 0
        {
            bail!("ichimoku periods must all be positive");
        }
        Ok(())
    }
}

/// Latest scalar snapshot of the Ichimoku lines and cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IchimokuValues {
    pub tenkan: Option<f64>,
    pub kijun: Option<f64>,
    /// Span values `displacement` bars back — the cloud at the current price.
    pub current_span_a: Option<f64>,
    pub current_span_b: Option<f64>,
    /// Span values at the last bar — the cloud projected forward.
    pub future_span_a: Option<f64>,
    pub future_span_b: Option<f64>,
}

/// Signal set derived from the latest values.  A field is `None` when the
/// inputs it needs are not yet available — a partial result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IchimokuAnalysis {
    pub price_vs_cloud: Option<Signal>,
    pub future_cloud: Option<Signal>,
    pub tk_cross: Option<Signal>,
}

/// Ichimoku engine: series computed once at construction.
#[derive(Debug, Clone)]
pub struct Ichimoku {
    config: IchimokuConfig,
    tenkan: Series,
    kijun: Series,
    senkou_span_a: Series,
    senkou_span_b: Series,
}

impl Ichimoku {
    /// Compute all four component series over `candles`.
    ///
    /// Fails only on invalid configuration; a series too short for a window
    /// simply carries `None` at the positions that lack history.
    pub fn compute(candles: &[Candle], config: IchimokuConfig) -> Result<Self> {
        config.validate()?;

        let high = series::from_values(&highs(candles));
        let low = series::from_values(&lows(candles));

        let tenkan = midline(&high, &low, config.tenkan_period);
        let kijun = midline(&high, &low, config.kijun_period);

        let senkou_span_a: Series = tenkan
            .iter()
            .zip(kijun.iter())
            .map(|(t, k)| match (t, k) {
                (Some(t), Some(k)) => Some((t + k) / 2.0),
                _ => None,
            })
            .collect();
        let senkou_span_b = midline(&high, &low, config.senkou_b_period);

        Ok(Self {
            config,
            tenkan,
            kijun,
            senkou_span_a,
            senkou_span_b,
        })
    }

    /// Latest line values plus the current (displaced) and future cloud.
    pub fn current_values(&self) -> IchimokuValues {
        let len = self.senkou_span_a.len();
        let displaced = |s: &Series| {
            if len > self.config.displacement {
                s[len - self.config.displacement]
            } else {
                None
            }
        };

        IchimokuValues {
            tenkan: series::latest(&self.tenkan),
            kijun: series::latest(&self.kijun),
            current_span_a: displaced(&self.senkou_span_a),
            current_span_b: displaced(&self.senkou_span_b),
            future_span_a: series::latest(&self.senkou_span_a),
            future_span_b: series::latest(&self.senkou_span_b),
        }
    }

    /// Derive the three cloud signals for `current_price`.
    pub fn analyze(&self, current_price: f64) -> (IchimokuValues, IchimokuAnalysis) {
        let values = self.current_values();

        // 1. Price vs the cloud in effect at the current bar.
        let price_vs_cloud = match (values.current_span_a, values.current_span_b) {
            (Some(a), Some(b)) => {
                let cloud_top = a.max(b);
                let cloud_bottom = a.min(b);
                Some(if current_price > cloud_top {
                    Signal::new(
                        SignalKind::Bullish,
                        format!("Price above cloud: ${current_price:.2} > ${cloud_top:.2}"),
                    )
                } else if current_price < cloud_bottom {
                    Signal::new(
                        SignalKind::Bearish,
                        format!("Price below cloud: ${current_price:.2} < ${cloud_bottom:.2}"),
                    )
                } else {
                    Signal::new(
                        SignalKind::Neutral,
                        format!("Price in cloud: ${cloud_bottom:.2} - ${cloud_top:.2}"),
                    )
                })
            }
            _ => None,
        };

        // 2. Future cloud: strict comparison, equality counts as bearish.
        let future_cloud = match (values.future_span_a, values.future_span_b) {
            (Some(a), Some(b)) => Some(if a > b {
                Signal::new(
                    SignalKind::Bullish,
                    format!("Span A ${a:.2} > Span B ${b:.2}"),
                )
            } else {
                Signal::new(
                    SignalKind::Bearish,
                    format!("Span A ${a:.2} < Span B ${b:.2}"),
                )
            }),
            _ => None,
        };

        // 3. TK cross: strict comparison, equality counts as bearish.
        let tk_cross = match (values.tenkan, values.kijun) {
            (Some(t), Some(k)) => Some(if t > k {
                Signal::new(
                    SignalKind::Bullish,
                    format!("Tenkan ${t:.2} > Kijun ${k:.2}"),
                )
            } else {
                Signal::new(
                    SignalKind::Bearish,
                    format!("Tenkan ${t:.2} < Kijun ${k:.2}"),
                )
            }),
            _ => None,
        };

        (
            values,
            IchimokuAnalysis {
                price_vs_cloud,
                future_cloud,
                tk_cross,
            },
        )
    }
}

/// `(rolling_max(high, w) + rolling_min(low, w)) / 2` — the donchian midline
/// every Ichimoku component is built from.
fn midline(high: &Series, low: &Series, window: usize) -> Series {
    let hi = series::rolling_max(high, window);
    let lo = series::rolling_min(low, window);
    hi.iter()
        .zip(lo.iter())
        .map(|(h, l)| match (h, l) {
            (Some(h), Some(l)) => Some((h + l) / 2.0),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Candles with high = close + 1, low = close - 1.
    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 1.0, 0))
            .collect()
    }

    fn small_config() -> IchimokuConfig {
        IchimokuConfig {
            tenkan_period: 3,
            kijun_period: 5,
            senkou_b_period: 7,
            displacement: 4,
        }
    }

    #[test]
    fn rejects_zero_period() {
        let config = IchimokuConfig {
            tenkan_period: 0,
            ..IchimokuConfig::default()
        };
        assert!(Ichimoku::compute(&candles_from_closes(&[1.0, 2.0]), config).is_err());
    }

    #[test]
    fn current_cloud_missing_when_series_not_longer_than_displacement() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0]); // len == displacement
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let values = ichimoku.current_values();
        assert!(values.current_span_a.is_none());
        assert!(values.current_span_b.is_none());
    }

    #[test]
    fn flat_series_lines_collapse_to_midpoint() {
        // Constant closes: every midline is the close itself (high/low are
        // symmetric around it).
        let candles = candles_from_closes(&[10.0; 20]);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let values = ichimoku.current_values();
        assert_eq!(values.tenkan, Some(10.0));
        assert_eq!(values.kijun, Some(10.0));
        assert_eq!(values.future_span_a, Some(10.0));
        assert_eq!(values.future_span_b, Some(10.0));
        assert_eq!(values.current_span_a, Some(10.0));
    }

    #[test]
    fn price_above_cloud_is_bullish() {
        let candles = candles_from_closes(&[10.0; 20]);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let (_, analysis) = ichimoku.analyze(15.0);
        assert_eq!(
            analysis.price_vs_cloud.unwrap().kind,
            SignalKind::Bullish
        );
    }

    #[test]
    fn price_inside_cloud_is_neutral() {
        let candles = candles_from_closes(&[10.0; 20]);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let (_, analysis) = ichimoku.analyze(10.0);
        assert_eq!(
            analysis.price_vs_cloud.unwrap().kind,
            SignalKind::Neutral
        );
    }

    #[test]
    fn equal_spans_and_lines_default_to_bearish() {
        // Flat market: span A == span B and tenkan == kijun.  The strict
        // comparisons resolve equality to BEARISH.
        let candles = candles_from_closes(&[10.0; 20]);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let (_, analysis) = ichimoku.analyze(10.0);
        assert_eq!(analysis.future_cloud.unwrap().kind, SignalKind::Bearish);
        assert_eq!(analysis.tk_cross.unwrap().kind, SignalKind::Bearish);
    }

    #[test]
    fn rising_market_turns_tk_cross_bullish() {
        // Steady rise: the shorter tenkan window tracks price faster than
        // kijun, so tenkan > kijun.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let candles = candles_from_closes(&closes);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let (values, analysis) = ichimoku.analyze(30.0);
        assert!(values.tenkan.unwrap() > values.kijun.unwrap());
        assert_eq!(analysis.tk_cross.unwrap().kind, SignalKind::Bullish);
    }

    #[test]
    fn analyze_is_idempotent() {
        let closes: Vec<f64> = (1..=40).map(|x| (x as f64).sin() * 5.0 + 50.0).collect();
        let candles = candles_from_closes(&closes);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let first = ichimoku.analyze(50.0);
        let second = ichimoku.analyze(50.0);
        assert_eq!(first, second);
    }

    #[test]
    fn short_series_yields_partial_analysis_not_error() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        let ichimoku = Ichimoku::compute(&candles, small_config()).unwrap();
        let (values, analysis) = ichimoku.analyze(2.0);
        // Tenkan (period 3) exists; kijun (period 5) does not.
        assert!(values.tenkan.is_some());
        assert!(values.kijun.is_none());
        assert!(analysis.tk_cross.is_none());
        assert!(analysis.price_vs_cloud.is_none());
    }
}
