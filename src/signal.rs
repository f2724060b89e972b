// =============================================================================
// Signals — qualitative analysis outputs
// =============================================================================
//
// Every analysis field an engine produces is a `Signal`: a closed enum tag
// plus a human-readable description.  The closed set gives exhaustiveness
// checking in both the engines and the report renderer — an unknown tag is a
// compile error, not a silently uncolored line.

use serde::{Deserialize, Serialize};

/// Closed set of signal tags produced by the four engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Bullish,
    Bearish,
    Neutral,
    Overbought,
    Oversold,
    Rising,
    Falling,
    Breakout,
    Breakdown,
    Range,
    Uptrend,
    Downtrend,
    Mixed,
    AboveBoth,
    BelowBoth,
    Between,
    StrongBullish,
    StrongBearish,
    BullishBias,
    BearishBias,
}

/// Rendering tone of a signal: drives the ANSI color in the console report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Caution,
}

impl SignalKind {
    /// Map each tag to its render tone.
    pub fn tone(self) -> Tone {
        match self {
            Self::Bullish
            | Self::Oversold
            | Self::Rising
            | Self::Breakout
            | Self::Uptrend
            | Self::AboveBoth
            | Self::StrongBullish
            | Self::BullishBias => Tone::Positive,

            Self::Bearish
            | Self::Overbought
            | Self::Falling
            | Self::Breakdown
            | Self::Downtrend
            | Self::BelowBoth
            | Self::StrongBearish
            | Self::BearishBias => Tone::Negative,

            Self::Neutral | Self::Range | Self::Mixed | Self::Between => Tone::Caution,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
            Self::Neutral => "NEUTRAL",
            Self::Overbought => "OVERBOUGHT",
            Self::Oversold => "OVERSOLD",
            Self::Rising => "RISING",
            Self::Falling => "FALLING",
            Self::Breakout => "BREAKOUT",
            Self::Breakdown => "BREAKDOWN",
            Self::Range => "RANGE",
            Self::Uptrend => "UPTREND",
            Self::Downtrend => "DOWNTREND",
            Self::Mixed => "MIXED",
            Self::AboveBoth => "ABOVE_BOTH",
            Self::BelowBoth => "BELOW_BOTH",
            Self::Between => "BETWEEN",
            Self::StrongBullish => "STRONG_BULLISH",
            Self::StrongBearish => "STRONG_BEARISH",
            Self::BullishBias => "BULLISH_BIAS",
            Self::BearishBias => "BEARISH_BIAS",
        };
        write!(f, "{token}")
    }
}

/// A derived signal: a tag plus the sentence explaining it.
///
/// Signals are pure values — recomputed from the current indicator state on
/// every `analyze` call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub description: String,
}

impl Signal {
    pub fn new(kind: SignalKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_report_tokens() {
        assert_eq!(SignalKind::AboveBoth.to_string(), "ABOVE_BOTH");
        assert_eq!(SignalKind::StrongBearish.to_string(), "STRONG_BEARISH");
        assert_eq!(SignalKind::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn oversold_renders_positive_overbought_negative() {
        // Matches the original color table: oversold is a potential reversal
        // up, so it renders green.
        assert_eq!(SignalKind::Oversold.tone(), Tone::Positive);
        assert_eq!(SignalKind::Overbought.tone(), Tone::Negative);
    }

    #[test]
    fn range_like_tags_render_caution() {
        for kind in [
            SignalKind::Neutral,
            SignalKind::Range,
            SignalKind::Mixed,
            SignalKind::Between,
        ] {
            assert_eq!(kind.tone(), Tone::Caution);
        }
    }
}
