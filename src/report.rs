// =============================================================================
// Console Report — per-symbol colorized analysis sections
// =============================================================================
//
// Pure rendering over the engines' (values, analysis) outputs.  Missing
// fields print as "n/a (insufficient data)" so a short series degrades to a
// partial report instead of an aborted one.
// =============================================================================

use chrono::DateTime;

use crate::indicators::fractals::{FractalAnalysis, FractalValues};
use crate::indicators::ichimoku::{IchimokuAnalysis, IchimokuValues};
use crate::indicators::ma_cross::{
    CrossHistory, MaCrossAnalysis, MaCrossConfig, MaPairAnalysis, MaValues, PairCrosses,
};
use crate::indicators::rsi::{Divergence, RsiAnalysis, RsiValues};
use crate::signal::{Signal, Tone};
use crate::types::Candle;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

fn tone_color(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => GREEN,
        Tone::Negative => RED,
        Tone::Caution => YELLOW,
    }
}

/// `COLORED_TAG (description)` for a present signal, or the n/a marker.
fn signal_line(signal: Option<&Signal>) -> String {
    match signal {
        Some(signal) => {
            let color = tone_color(signal.kind.tone());
            format!("{color}{}{RESET} ({})", signal.kind, signal.description)
        }
        None => "n/a (insufficient data)".to_string(),
    }
}

/// `$123.45` or the n/a marker.
fn dollars(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${v:.2}"),
        None => "n/a".to_string(),
    }
}

fn section_header(symbol: &str, title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("{symbol} {title}");
    println!("{}", "=".repeat(50));
}

pub fn print_ichimoku(
    symbol: &str,
    current_price: f64,
    values: &IchimokuValues,
    analysis: &IchimokuAnalysis,
) {
    section_header(symbol, "ICHIMOKU ANALYSIS");
    println!("Price: ${current_price:.2}");
    println!("Tenkan: {}", dollars(values.tenkan));
    println!("Kijun: {}", dollars(values.kijun));
    println!("\nCurrent Cloud (at price):");
    println!("Span A: {}", dollars(values.current_span_a));
    println!("Span B: {}", dollars(values.current_span_b));
    println!("\nFuture Cloud (projected forward):");
    println!("Span A: {}", dollars(values.future_span_a));
    println!("Span B: {}", dollars(values.future_span_b));

    println!("\n--- Ichimoku Signals ---");
    println!(
        "1. Price vs Cloud: {}",
        signal_line(analysis.price_vs_cloud.as_ref())
    );
    println!(
        "2. Future Cloud: {}",
        signal_line(analysis.future_cloud.as_ref())
    );
    println!("3. TK Cross: {}", signal_line(analysis.tk_cross.as_ref()));
}

pub fn print_rsi(
    symbol: &str,
    values: &RsiValues,
    analysis: &RsiAnalysis,
    divergence: Option<&Divergence>,
) {
    section_header(symbol, "RSI ANALYSIS");
    println!(
        "RSI: {}",
        values
            .rsi
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
    );
    println!(
        "Smoothed RSI: {}",
        values
            .smoothed_rsi
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
    );
    println!(
        "Levels: {}/{}/{}",
        values.lower_limit, values.middle_limit, values.upper_limit
    );

    println!("\n--- RSI Signals ---");
    println!("1. Condition: {}", signal_line(analysis.condition.as_ref()));
    println!("2. Momentum: {}", signal_line(analysis.momentum.as_ref()));
    println!("3. RSI Trend: {}", signal_line(analysis.trend.as_ref()));

    println!("\n--- RSI Divergence Check ---");
    match divergence {
        Some(divergence) if divergence.bullish_divergence => {
            println!("{GREEN}BULLISH DIVERGENCE{RESET}: {}", divergence.description);
        }
        Some(divergence) if divergence.bearish_divergence => {
            println!("{RED}BEARISH DIVERGENCE{RESET}: {}", divergence.description);
        }
        Some(divergence) => println!("No divergence: {}", divergence.description),
        None => println!("n/a (insufficient data for divergence scan)"),
    }
}

pub fn print_fractals(symbol: &str, values: &FractalValues, analysis: &FractalAnalysis) {
    section_header(symbol, "WILLIAMS FRACTALS ANALYSIS");
    if let Some(up) = values.last_up_fractal {
        println!("Last Resistance (Up Fractal): ${up:.2}");
    }
    if let Some(down) = values.last_down_fractal {
        println!("Last Support (Down Fractal): ${down:.2}");
    }
    println!(
        "Recent Fractals Count - Up: {}, Down: {}",
        values.up_fractal_count, values.down_fractal_count
    );

    println!("\n--- Fractal Signals ---");
    println!(
        "1. Price Position: {}",
        signal_line(analysis.position.as_ref())
    );
    println!(
        "2. Fractal Trend: {}",
        signal_line(analysis.fractal_trend.as_ref())
    );
    match &analysis.distances {
        Some(distances) => println!("3. Distances: {}", distances.description),
        None => println!("3. Distances: n/a (insufficient data)"),
    }
    println!("4. {}", analysis.recent_sequence.description);
}

pub fn print_ma_cross(
    symbol: &str,
    config: &MaCrossConfig,
    values: &MaValues,
    analysis: &MaCrossAnalysis,
    history: &CrossHistory,
    candles: &[Candle],
) {
    section_header(symbol, "MOVING AVERAGE CROSS ANALYSIS");
    println!("{} Values:", config.ma_type);
    println!(
        "MA{}: {}, MA{}: {}, MA{}: {}",
        config.fast_period,
        dollars(values.ma_fast),
        config.slow_period,
        dollars(values.ma_slow),
        config.long_period,
        dollars(values.ma_long)
    );

    print_ma_pair(
        &format!("Set 1 ({}/{})", config.fast_period, config.slow_period),
        analysis.short_term.as_ref(),
    );
    print_ma_pair(
        &format!("Set 2 ({}/{})", config.slow_period, config.long_period),
        analysis.long_term.as_ref(),
    );

    println!("\n--- Overall Market Structure ---");
    match &analysis.market_structure {
        Some(signal) => {
            let color = tone_color(signal.kind.tone());
            println!("{color}{}{RESET}: {}", signal.kind, signal.description);
        }
        None => println!("n/a (insufficient data)"),
    }

    println!("\n--- Recent Cross Events ---");
    print_pair_crosses(
        &format!("{}/{}", config.fast_period, config.slow_period),
        &history.fast_slow,
        candles,
    );
    print_pair_crosses(
        &format!("{}/{}", config.slow_period, config.long_period),
        &history.slow_long,
        candles,
    );
}

fn print_ma_pair(title: &str, pair: Option<&MaPairAnalysis>) {
    println!("\n--- MA {title} ---");
    match pair {
        Some(pair) => {
            println!("1. Cross Status: {}", signal_line(Some(&pair.cross_status)));
            println!(
                "2. Price Position: {}",
                signal_line(Some(&pair.price_position))
            );
            match (pair.distance_from_fast, pair.distance_from_slow) {
                (Some(fast), Some(slow)) => println!(
                    "3. Distance from faster MA: {fast:.2}%, from slower MA: {slow:.2}%"
                ),
                _ => println!("3. Distances: n/a"),
            }
        }
        None => println!("n/a (insufficient data)"),
    }
}

fn print_pair_crosses(pair_name: &str, crosses: &PairCrosses, candles: &[Candle]) {
    let describe = |bar: Option<usize>| match bar {
        Some(i) => {
            let when = candles
                .get(i)
                .and_then(|c| DateTime::from_timestamp_millis(c.open_time))
                .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "unknown time".to_string());
            format!("bar {i} ({when})")
        }
        None => "none".to_string(),
    };

    println!(
        "{pair_name}: last golden cross {}, last death cross {}",
        describe(crosses.last_golden_cross),
        describe(crosses.last_death_cross)
    );
}
