// =============================================================================
// Analyzer Configuration — JSON file with serde defaults and env overrides
// =============================================================================
//
// Every field carries a serde default so an older config file missing new
// fields still deserialises.  `CHARTIST_SYMBOLS` and `CHARTIST_INTERVAL`
// override the file after `dotenv` runs, mirroring how symbols are injected
// in deployment.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::fractals::FractalConfig;
use crate::indicators::ichimoku::IchimokuConfig;
use crate::indicators::ma_cross::MaCrossConfig;
use crate::indicators::rsi::RsiConfig;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_candle_limit() -> u32 {
    300
}

fn default_cross_lookback() -> usize {
    10
}

/// Top-level configuration for the analyzer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Symbols to analyze, in report order.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Kline interval, e.g. "1h", "4h", "1d".
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Number of candles fetched per symbol.  Must cover the longest window
    /// in use (the 200-period long MA) to produce a full report.
    #[serde(default = "default_candle_limit")]
    pub candle_limit: u32,

    /// Bars scanned backward for MA cross events.
    #[serde(default = "default_cross_lookback")]
    pub cross_lookback: usize,

    #[serde(default)]
    pub ichimoku: IchimokuConfig,

    #[serde(default)]
    pub rsi: RsiConfig,

    #[serde(default)]
    pub fractal: FractalConfig,

    #[serde(default)]
    pub ma_cross: MaCrossConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            interval: default_interval(),
            candle_limit: default_candle_limit(),
            cross_lookback: default_cross_lookback(),
            ichimoku: IchimokuConfig::default(),
            rsi: RsiConfig::default(),
            fractal: FractalConfig::default(),
            ma_cross: MaCrossConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load the configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            interval = %config.interval,
            "analyzer config loaded"
        );

        Ok(config)
    }

    /// Apply environment overrides (after `dotenv`).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("CHARTIST_SYMBOLS") {
            let symbols = parse_symbol_list(&raw);
            if !symbols.is_empty() {
                self.symbols = symbols;
            }
        }
        if let Ok(interval) = std::env::var("CHARTIST_INTERVAL") {
            let interval = interval.trim().to_string();
            if !interval.is_empty() {
                self.interval = interval;
            }
        }
    }

    /// Reject invalid settings before any engine is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            bail!("no symbols configured");
        }
        if self.candle_limit == 0 {
            bail!("candle_limit must be positive");
        }
        if self.cross_lookback == 0 {
            bail!("cross_lookback must be positive");
        }
        self.ichimoku.validate()?;
        self.rsi.validate()?;
        self.fractal.validate()?;
        self.ma_cross.validate()?;
        Ok(())
    }
}

/// Parse a comma-separated symbol list: entries trimmed and uppercased,
/// empty entries dropped.
fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_json_deserialises_to_defaults() {
        let config: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.interval, "1h");
        assert_eq!(config.candle_limit, 300);
        assert_eq!(config.ma_cross.long_period, 200);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"interval": "4h", "rsi": {"length": 21}}"#).unwrap();
        assert_eq!(config.interval, "4h");
        assert_eq!(config.rsi.length, 21);
        // Untouched fields fall back to their defaults.
        assert_eq!(config.rsi.smoothing_length, 14);
        assert_eq!(config.ichimoku.tenkan_period, 9);
    }

    #[test]
    fn symbol_list_is_trimmed_uppercased_and_filtered() {
        assert_eq!(
            parse_symbol_list(" btcusdt, ethUSDT ,,solusdt,"),
            vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]
        );
    }

    #[test]
    fn blank_symbol_list_parses_to_empty() {
        // The override path keeps the configured symbols when this is empty.
        assert!(parse_symbol_list("  ,, ").is_empty());
        assert!(parse_symbol_list("").is_empty());
    }

    #[test]
    fn invalid_nested_config_is_rejected() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"ma_cross": {"fast_period": 500}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
