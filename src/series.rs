// =============================================================================
// Series Math — windowed rolling primitives
// =============================================================================
//
// Every indicator in this crate is built from the same four primitives:
// trailing rolling max/min/mean, centered rolling max/min, and an exponential
// mean.  All of them operate on `Series` (`Vec<Option<f64>>`) aligned 1:1 by
// index with the candle sequence.  A position where the window is incomplete
// or contains a missing value holds `None` — never zero, never an
// extrapolated value.
//
// Two distinct exponential smoothing constants are used downstream:
//   span_alpha(n)   = 2 / (n + 1)   — classic EMA
//   wilder_alpha(n) = 1 / n         — Wilder's smoothing (RSI averages)
// They are not interchangeable; callers pick one explicitly.
// =============================================================================

/// A value series aligned with the candle sequence by index.
pub type Series = Vec<Option<f64>>;

/// Wrap a plain `f64` slice into a fully-valid [`Series`].
pub fn from_values(values: &[f64]) -> Series {
    values.iter().map(|&v| Some(v)).collect()
}

/// Most recent value of a series, `None` when the series is empty or ends in
/// a missing value.
pub fn latest(series: &Series) -> Option<f64> {
    series.last().copied().flatten()
}

/// Classic EMA smoothing constant: `2 / (span + 1)`.
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Wilder's smoothing constant: `1 / length`.
pub fn wilder_alpha(length: usize) -> f64 {
    1.0 / length as f64
}

// -----------------------------------------------------------------------------
// Trailing windows
// -----------------------------------------------------------------------------

/// Aggregate a trailing window of `window` values ending at each position.
///
/// Output is `None` at position `i` when fewer than `window` values exist up
/// to and including `i`, or when any value inside the window is `None`.
fn rolling_trailing<F>(values: &[Option<f64>], window: usize, fold: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for i in (window - 1)..values.len() {
        let mut acc: Option<f64> = None;
        for v in &values[i + 1 - window..=i] {
            match (acc, *v) {
                (_, None) => {
                    acc = None;
                    break;
                }
                (None, Some(x)) => acc = Some(x),
                (Some(a), Some(x)) => acc = Some(fold(a, x)),
            }
        }
        out[i] = acc;
    }
    out
}

/// Trailing rolling maximum.
pub fn rolling_max(values: &[Option<f64>], window: usize) -> Series {
    rolling_trailing(values, window, f64::max)
}

/// Trailing rolling minimum.
pub fn rolling_min(values: &[Option<f64>], window: usize) -> Series {
    rolling_trailing(values, window, f64::min)
}

/// Trailing rolling arithmetic mean.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    let sums = rolling_trailing(values, window, |a, b| a + b);
    sums.into_iter()
        .map(|s| s.map(|sum| sum / window as f64))
        .collect()
}

// -----------------------------------------------------------------------------
// Centered windows
// -----------------------------------------------------------------------------

/// Aggregate a centered window of odd size `window` around each position.
///
/// Output is `None` when the window extends past either series boundary or
/// contains a missing value.  `window` must be odd; the half-width is
/// `window / 2` on each side.
fn rolling_centered<F>(values: &[Option<f64>], window: usize, fold: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    debug_assert!(window % 2 == 1, "centered window must be odd, got {window}");

    let half = window / 2;
    for i in 0..values.len() {
        if i < half || i + half >= values.len() {
            continue; // Window would extend past a boundary.
        }
        let mut acc: Option<f64> = None;
        for v in &values[i - half..=i + half] {
            match (acc, *v) {
                (_, None) => {
                    acc = None;
                    break;
                }
                (None, Some(x)) => acc = Some(x),
                (Some(a), Some(x)) => acc = Some(fold(a, x)),
            }
        }
        out[i] = acc;
    }
    out
}

/// Centered rolling maximum (odd `window`).
pub fn rolling_max_centered(values: &[Option<f64>], window: usize) -> Series {
    rolling_centered(values, window, f64::max)
}

/// Centered rolling minimum (odd `window`).
pub fn rolling_min_centered(values: &[Option<f64>], window: usize) -> Series {
    rolling_centered(values, window, f64::min)
}

// -----------------------------------------------------------------------------
// Exponential mean
// -----------------------------------------------------------------------------

/// Exponential mean with smoothing constant `alpha`.
///
/// Seeds at the first `Some` input (the output equals the input there); every
/// later `Some` input produces `alpha * x + (1 - alpha) * prev`.  A `None`
/// input after seeding yields `None` at that position and leaves the
/// smoothing state untouched, so the next valid value continues from the
/// prior state.
pub fn ewm_mean(values: &[Option<f64>], alpha: f64) -> Series {
    let mut out = vec![None; values.len()];
    let mut state: Option<f64> = None;

    for (i, v) in values.iter().enumerate() {
        if let Some(x) = *v {
            let next = match state {
                None => x,
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
            };
            state = Some(next);
            out[i] = Some(next);
        }
    }
    out
}
