// =============================================================================
// Moving-Average Cross — three-MA structure, pair analysis, cross history
// =============================================================================
//
// Three trailing averages (fast/slow/long, default 10/50/200) of the close
// series, all SMA or all EMA per configuration.  Two pair analyses
// (fast/slow, slow/long) each derive a cross status, the price position
// relative to the pair, and percentage distances.  The market-structure score
// combines three diff signs with fixed weights 0.3/0.3/0.4; a score of
// exactly zero resolves to BEARISH_BIAS — an asymmetry kept from the source
// and pinned by a test.
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::series::{self, Series};
use crate::signal::{Signal, SignalKind};
use crate::types::{closes, Candle, MaType};

/// Fixed market-structure weights: fast/slow trend, slow/long trend,
/// price vs long MA.
const WEIGHT_FAST_SLOW: f64 = 0.3;
const WEIGHT_SLOW_LONG: f64 = 0.3;
const WEIGHT_PRICE_LONG: f64 = 0.4;

/// MA-cross parameters.  Periods must be positive and strictly ordered
/// fast < slow < long.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub long_period: usize,
    pub ma_type: MaType,
}

impl Default for MaCrossConfig {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 50,
            long_period: 200,
            ma_type: MaType::Sma,
        }
    }
}

impl MaCrossConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fast_period == 0 {
            bail!("ma periods must be positive");
        }
        if !(self.fast_period < self.slow_period && self.slow_period < self.long_period) {
            bail!(
                "ma periods must satisfy fast < slow < long (got {}/{}/{})",
                self.fast_period,
                self.slow_period,
                self.long_period
            );
        }
        Ok(())
    }
}

/// Latest values of the three averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaValues {
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
    pub ma_long: Option<f64>,
}

/// Analysis of one MA pair (faster line vs slower line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaPairAnalysis {
    pub cross_status: Signal,
    pub price_position: Signal,
    /// Percentage distance from price to the faster MA; `None` when price is
    /// zero (no meaningful percentage).
    pub distance_from_fast: Option<f64>,
    pub distance_from_slow: Option<f64>,
}

/// Full MA-cross signal set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaCrossAnalysis {
    /// Fast/slow pair (e.g. 10/50).
    pub short_term: Option<MaPairAnalysis>,
    /// Slow/long pair (e.g. 50/200).
    pub long_term: Option<MaPairAnalysis>,
    pub market_structure: Option<Signal>,
}

/// Most recent golden/death cross of one pair, as bar indices into the candle
/// slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PairCrosses {
    pub last_golden_cross: Option<usize>,
    pub last_death_cross: Option<usize>,
}

/// Cross events found in the trailing lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossHistory {
    pub fast_slow: PairCrosses,
    pub slow_long: PairCrosses,
}

/// MA-cross engine: the three average series computed once at construction.
#[derive(Debug, Clone)]
pub struct MaCross {
    config: MaCrossConfig,
    ma_fast: Series,
    ma_slow: Series,
    ma_long: Series,
}

impl MaCross {
    /// Compute the three averages over `candles`.
    pub fn compute(candles: &[Candle], config: MaCrossConfig) -> Result<Self> {
        config.validate()?;

        let close = series::from_values(&closes(candles));
        let average = |period: usize| match config.ma_type {
            MaType::Sma => series::rolling_mean(&close, period),
            MaType::Ema => series::ewm_mean(&close, series::span_alpha(period)),
        };

        Ok(Self {
            ma_fast: average(config.fast_period),
            ma_slow: average(config.slow_period),
            ma_long: average(config.long_period),
            config,
        })
    }

    /// Latest values of the three averages.
    pub fn current_values(&self) -> MaValues {
        MaValues {
            ma_fast: series::latest(&self.ma_fast),
            ma_slow: series::latest(&self.ma_slow),
            ma_long: series::latest(&self.ma_long),
        }
    }

    /// Derive the two pair analyses and the market-structure signal for
    /// `current_price`.
    pub fn analyze(&self, current_price: f64) -> (MaValues, MaCrossAnalysis) {
        let values = self.current_values();
        let config = &self.config;

        let short_term = match (values.ma_fast, values.ma_slow) {
            (Some(fast), Some(slow)) => Some(analyze_pair(
                current_price,
                fast,
                slow,
                config.ma_type,
                config.fast_period,
                config.slow_period,
            )),
            _ => None,
        };

        let long_term = match (values.ma_slow, values.ma_long) {
            (Some(slow), Some(long)) => Some(analyze_pair(
                current_price,
                slow,
                long,
                config.ma_type,
                config.slow_period,
                config.long_period,
            )),
            _ => None,
        };

        let market_structure = match (values.ma_fast, values.ma_slow, values.ma_long) {
            (Some(fast), Some(slow), Some(long)) => {
                Some(market_structure(current_price, fast, slow, long))
            }
            _ => None,
        };

        (
            values,
            MaCrossAnalysis {
                short_term,
                long_term,
                market_structure,
            },
        )
    }

    /// Scan the trailing `lookback` bars for golden/death crosses of both
    /// pairs.  A missing MA compares as not-above, so the first bar where
    /// both averages exist can itself register a transition.
    pub fn cross_history(&self, lookback: usize) -> CrossHistory {
        CrossHistory {
            fast_slow: pair_crosses(&self.ma_fast, &self.ma_slow, lookback),
            slow_long: pair_crosses(&self.ma_slow, &self.ma_long, lookback),
        }
    }
}

/// Cross status, price position, and distances for one faster/slower pair.
fn analyze_pair(
    price: f64,
    fast: f64,
    slow: f64,
    ma_type: MaType,
    fast_period: usize,
    slow_period: usize,
) -> MaPairAnalysis {
    // Strict comparison: equality counts as bearish.
    let cross_status = if fast > slow {
        Signal::new(
            SignalKind::Bullish,
            format!("{ma_type} {fast_period} (${fast:.2}) > {ma_type} {slow_period} (${slow:.2})"),
        )
    } else {
        Signal::new(
            SignalKind::Bearish,
            format!("{ma_type} {fast_period} (${fast:.2}) < {ma_type} {slow_period} (${slow:.2})"),
        )
    };

    let price_position = if price > fast && price > slow {
        Signal::new(
            SignalKind::AboveBoth,
            format!("Price ${price:.2} above both MAs"),
        )
    } else if price < fast && price < slow {
        Signal::new(
            SignalKind::BelowBoth,
            format!("Price ${price:.2} below both MAs"),
        )
    } else {
        Signal::new(
            SignalKind::Between,
            format!("Price ${price:.2} between MAs"),
        )
    };

    let (distance_from_fast, distance_from_slow) = if price != 0.0 {
        (
            Some((price - fast) / price * 100.0),
            Some((price - slow) / price * 100.0),
        )
    } else {
        (None, None)
    };

    MaPairAnalysis {
        cross_status,
        price_position,
        distance_from_fast,
        distance_from_slow,
    }
}

/// Weighted alignment score over the three diff signs, in [-1, 1].
///
/// Exactly zero falls through to BEARISH_BIAS.
fn market_structure(price: f64, fast: f64, slow: f64, long: f64) -> Signal {
    let sign = |diff: f64| if diff > 0.0 { 1.0 } else { -1.0 };

    let weighted_score = WEIGHT_FAST_SLOW * sign(fast - slow)
        + WEIGHT_SLOW_LONG * sign(slow - long)
        + WEIGHT_PRICE_LONG * sign(price - long);

    structure_signal(weighted_score)
}

/// Classify a weighted alignment score.  Kept separate from the score
/// computation so the zero boundary stays directly testable.
fn structure_signal(weighted_score: f64) -> Signal {
    if weighted_score > 0.5 {
        Signal::new(
            SignalKind::StrongBullish,
            "Strong bullish alignment with weighted score > 0.5",
        )
    } else if weighted_score < -0.5 {
        Signal::new(
            SignalKind::StrongBearish,
            "Strong bearish alignment with weighted score < -0.5",
        )
    } else if weighted_score > 0.0 {
        Signal::new(
            SignalKind::BullishBias,
            format!("Bullish bias with weighted score: {weighted_score:.2}"),
        )
    } else {
        Signal::new(
            SignalKind::BearishBias,
            format!("Bearish bias with weighted score: {weighted_score:.2}"),
        )
    }
}

/// Golden/death crosses of one pair in the trailing `lookback` window.
///
/// `above[i]` is true when both MAs exist at `i` and the faster is strictly
/// greater; a false->true flip at `i` is a golden cross, true->false a death
/// cross.  The most recent bar index of each is kept.
fn pair_crosses(faster: &Series, slower: &Series, lookback: usize) -> PairCrosses {
    let len = faster.len().min(slower.len());
    let above: Vec<bool> = (0..len)
        .map(|i| match (faster[i], slower[i]) {
            (Some(f), Some(s)) => f > s,
            _ => false,
        })
        .collect();

    let mut crosses = PairCrosses::default();
    let start = len.saturating_sub(lookback).max(1);
    for i in start..len {
        if above[i] && !above[i - 1] {
            crosses.last_golden_cross = Some(i);
        } else if !above[i] && above[i - 1] {
            crosses.last_death_cross = Some(i);
        }
    }
    crosses
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 1.0, 0))
            .collect()
    }

    fn short_config() -> MaCrossConfig {
        MaCrossConfig {
            fast_period: 2,
            slow_period: 4,
            long_period: 8,
            ma_type: MaType::Sma,
        }
    }

    // ---- configuration ---------------------------------------------------

    #[test]
    fn rejects_unordered_periods() {
        let config = MaCrossConfig {
            fast_period: 50,
            slow_period: 10,
            ..MaCrossConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_period() {
        let config = MaCrossConfig {
            fast_period: 0,
            ..MaCrossConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // ---- analysis --------------------------------------------------------

    #[test]
    fn ema_averages_follow_span_recurrence() {
        let closes = [2.0, 4.0, 8.0, 4.0];
        let config = MaCrossConfig {
            fast_period: 3,
            slow_period: 7,
            long_period: 15,
            ma_type: MaType::Ema,
        };
        let ma = MaCross::compute(&candles_from_closes(&closes), config).unwrap();
        let values = ma.current_values();

        // alpha = 2/(3+1) = 0.5: 2 -> 3 -> 5.5 -> 4.75
        assert_eq!(values.ma_fast, Some(4.75));
        // alpha = 2/(7+1) = 0.25: 2 -> 2.5 -> 3.875 -> 3.90625
        assert_eq!(values.ma_slow, Some(3.90625));

        // Wilder's 1/n constant lands elsewhere on the same closes.
        let close = series::from_values(&closes);
        let wilder = series::ewm_mean(&close, series::wilder_alpha(3));
        assert_ne!(values.ma_fast, series::latest(&wilder));
    }

    #[test]
    fn rising_market_is_bullish_everywhere() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (values, analysis) = ma.analyze(31.0);

        // Shorter trailing means catch up to price faster in a rise.
        assert!(values.ma_fast.unwrap() > values.ma_slow.unwrap());
        assert!(values.ma_slow.unwrap() > values.ma_long.unwrap());

        let short_term = analysis.short_term.unwrap();
        assert_eq!(short_term.cross_status.kind, SignalKind::Bullish);
        assert_eq!(short_term.price_position.kind, SignalKind::AboveBoth);
        let long_term = analysis.long_term.unwrap();
        assert_eq!(long_term.cross_status.kind, SignalKind::Bullish);
        assert_eq!(
            analysis.market_structure.unwrap().kind,
            SignalKind::StrongBullish
        );
    }

    #[test]
    fn falling_market_is_strong_bearish() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64 + 10.0).collect();
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (_, analysis) = ma.analyze(10.0);
        let short_term = analysis.short_term.unwrap();
        assert_eq!(short_term.cross_status.kind, SignalKind::Bearish);
        assert_eq!(short_term.price_position.kind, SignalKind::BelowBoth);
        assert_eq!(
            analysis.market_structure.unwrap().kind,
            SignalKind::StrongBearish
        );
    }

    #[test]
    fn price_between_mas_is_between() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (values, analysis) = ma.analyze(values_between(&ma));
        let short_term = analysis.short_term.unwrap();
        assert_eq!(short_term.price_position.kind, SignalKind::Between);
        // The midpoint price sits above the long MA, so structure is still
        // fully bullish.
        assert!(values.ma_long.unwrap() < values.ma_slow.unwrap());
    }

    /// Midpoint between the fast and slow MA.
    fn values_between(ma: &MaCross) -> f64 {
        let values = ma.current_values();
        (values.ma_fast.unwrap() + values.ma_slow.unwrap()) / 2.0
    }

    #[test]
    fn too_short_series_yields_partial_analysis() {
        let closes: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (values, analysis) = ma.analyze(5.0);
        assert!(values.ma_fast.is_some());
        assert!(values.ma_slow.is_some());
        assert!(values.ma_long.is_none()); // period 8 > 5 candles
        assert!(analysis.short_term.is_some());
        assert!(analysis.long_term.is_none());
        assert!(analysis.market_structure.is_none());
    }

    #[test]
    fn distances_are_signed_percentages() {
        let closes = vec![10.0; 30];
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (_, analysis) = ma.analyze(20.0);
        let short_term = analysis.short_term.unwrap();
        // (20 - 10) / 20 * 100 = 50% above both flat MAs.
        assert!((short_term.distance_from_fast.unwrap() - 50.0).abs() < 1e-10);
        assert!((short_term.distance_from_slow.unwrap() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn zero_price_has_no_distances() {
        let closes = vec![10.0; 30];
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let (_, analysis) = ma.analyze(0.0);
        let short_term = analysis.short_term.unwrap();
        assert!(short_term.distance_from_fast.is_none());
        assert!(short_term.distance_from_slow.is_none());
    }

    // ---- market structure boundary ---------------------------------------

    #[test]
    fn score_of_exactly_zero_is_bearish_bias() {
        // No combination of +/-1 signs under weights 0.3/0.3/0.4 sums to
        // exactly zero, so the boundary is pinned on the classifier itself:
        // the `> 0.0` guard sends a zero score to BEARISH_BIAS, not bullish.
        assert_eq!(structure_signal(0.0).kind, SignalKind::BearishBias);
        assert_eq!(structure_signal(f64::EPSILON).kind, SignalKind::BullishBias);
    }

    #[test]
    fn mixed_alignment_is_a_bias_not_strong() {
        // fast < slow (-0.3), slow > long (+0.3), price > long (+0.4) = +0.4.
        let signal = market_structure(20.0, 10.0, 15.0, 12.0);
        assert_eq!(signal.kind, SignalKind::BullishBias);
    }

    // ---- cross history ---------------------------------------------------

    #[test]
    fn single_golden_cross_is_reported_at_its_bar() {
        // 12 falling closes keep the fast SMA below the slow one, then a
        // sharp rally flips it exactly once inside the lookback window.
        let mut closes: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        closes.extend((0..8).map(|i| 95.0 + 3.0 * i as f64));
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let history = ma.cross_history(10);

        let golden = history.fast_slow.last_golden_cross.expect("golden cross");
        assert!(golden >= 12, "cross should happen during the rally");
        assert!(history.fast_slow.last_death_cross.is_none());

        // Verify the flip really is at the reported bar.
        let before = ma.ma_fast[golden - 1].unwrap() <= ma.ma_slow[golden - 1].unwrap();
        let after = ma.ma_fast[golden].unwrap() > ma.ma_slow[golden].unwrap();
        assert!(before && after);
    }

    #[test]
    fn death_cross_after_rally_rolls_over() {
        let mut closes: Vec<f64> = (0..12).map(|i| 80.0 + 2.0 * i as f64).collect();
        closes.extend((0..8).map(|i| 104.0 - 4.0 * i as f64));
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        let history = ma.cross_history(10);
        assert!(history.fast_slow.last_death_cross.is_some());
        assert!(history.fast_slow.last_golden_cross.is_none());
    }

    #[test]
    fn flat_series_has_no_crosses() {
        let ma =
            MaCross::compute(&candles_from_closes(&[50.0; 30]), short_config()).unwrap();
        let history = ma.cross_history(10);
        assert_eq!(history.fast_slow, PairCrosses::default());
        assert_eq!(history.slow_long, PairCrosses::default());
    }

    #[test]
    fn analyze_is_idempotent() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.5).sin() * 3.0).collect();
        let ma = MaCross::compute(&candles_from_closes(&closes), short_config()).unwrap();
        assert_eq!(ma.analyze(100.0), ma.analyze(100.0));
        assert_eq!(ma.cross_history(10), ma.cross_history(10));
    }
}
