use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::levels::DEFAULT_LEVEL_WINDOW;
use crate::analysis::round_level::DEFAULT_ROUND_LEVELS;
use crate::indicator::atr::DEFAULT_ATR_PERIOD;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub okx: OkxConfig,
    pub analysis: AnalysisConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OkxConfig {
    pub base_url: String,
    pub inst_id: String,
    pub hourly_bar: String,
    pub daily_bar: String,
    pub limit: usize,
    pub timeout_secs: u64,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.okx.com".to_string(),
            inst_id: "BTC-USD-SWAP".to_string(),
            hourly_bar: "1H".to_string(),
            daily_bar: "1D".to_string(),
            limit: 100,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub atr_period: usize,
    pub level_window: usize,
    /// Round-number granularities, coarsest first.
    pub round_levels: Vec<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            atr_period: DEFAULT_ATR_PERIOD,
            level_window: DEFAULT_LEVEL_WINDOW,
            round_levels: DEFAULT_ROUND_LEVELS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    /// Offset of the clock used for partitioning (Asia/Almaty by default).
    pub utc_offset_hours: i32,
    pub datasets: DatasetNames,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("archive"),
            utc_offset_hours: 5,
            datasets: DatasetNames::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetNames {
    pub levels: String,
    pub patterns: String,
    pub ohlcv_hourly: String,
    pub ohlcv_daily: String,
}

impl Default for DatasetNames {
    fn default() -> Self {
        Self {
            levels: "btc_levels_data".to_string(),
            patterns: "btc_patterns_data".to_string(),
            ohlcv_hourly: "btc_ohlcv_1h".to_string(),
            ohlcv_daily: "btc_ohlcv_1d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Parse an OKX bar string (e.g. "1m", "1H", "4H", "1D", "1W", "1M") into milliseconds.
///
/// OKX is case sensitive here: `m` is minutes and `M` is months. Bars of an
/// hour or longer may carry a `utc` suffix ("6Hutc", "1Dutc") to align on UTC
/// instead of Hong Kong time; the length is the same.
pub fn parse_bar_ms(s: &str) -> Result<u64> {
    let (core, utc_aligned) = match s.strip_suffix("utc") {
        Some(core) => (core, true),
        None => (s, false),
    };
    if core.len() < 2 {
        bail!("invalid bar '{}': expected format like '1H'", s);
    }

    let (num_str, suffix) = core.split_at(core.len() - 1);
    if utc_aligned && !matches!(suffix, "H" | "D" | "W" | "M") {
        bail!("invalid bar '{}': 'utc' only applies to H/D/W/M bars", s);
    }
    let n: u64 = num_str
        .parse()
        .with_context(|| format!("invalid bar '{}': quantity must be a positive integer", s))?;
    if n == 0 {
        bail!("invalid bar '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "H" => 3_600_000,
        "D" => 86_400_000,
        "W" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid bar '{}': unsupported suffix '{}', expected one of s/m/H/D/W/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid bar '{}': value is too large", s))
}

impl Config {
    /// Load `.env`, then the TOML file named by `LEVEL_WATCH_CONFIG`
    /// (default `config/default.toml`), then env overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("LEVEL_WATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::from_file(&path)?;

        if let Ok(base_url) = std::env::var("OKX_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.okx.base_url = base_url.trim().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&config_str).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.okx.inst_id.trim().is_empty() {
            bail!("okx.inst_id must not be empty");
        }
        if self.okx.limit == 0 {
            bail!("okx.limit must be > 0");
        }
        if self.okx.timeout_secs == 0 {
            bail!("okx.timeout_secs must be > 0");
        }
        parse_bar_ms(&self.okx.hourly_bar).context("okx.hourly_bar is invalid")?;
        parse_bar_ms(&self.okx.daily_bar).context("okx.daily_bar is invalid")?;
        if self.analysis.atr_period == 0 {
            bail!("analysis.atr_period must be > 0");
        }
        if self.analysis.level_window == 0 {
            bail!("analysis.level_window must be > 0");
        }
        if let Some(bad) = self.analysis.round_levels.iter().find(|g| !(**g > 0.0)) {
            bail!("analysis.round_levels must be positive, got {}", bad);
        }
        if !(-14..=14).contains(&self.archive.utc_offset_hours) {
            bail!(
                "archive.utc_offset_hours must be within -14..=14, got {}",
                self.archive.utc_offset_hours
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let toml_str = r#"
[okx]
base_url = "https://www.okx.com"
inst_id = "ETH-USD-SWAP"
hourly_bar = "1H"
daily_bar = "1D"
limit = 50

[analysis]
atr_period = 10
round_levels = [500.0, 50.0]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.okx.inst_id, "ETH-USD-SWAP");
        assert_eq!(config.okx.limit, 50);
        assert_eq!(config.okx.timeout_secs, 15);
        assert_eq!(config.analysis.atr_period, 10);
        assert_eq!(config.analysis.level_window, 20);
        assert_eq!(config.analysis.round_levels, vec![500.0, 50.0]);
        assert_eq!(config.archive.utc_offset_hours, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn okx_bar_suffix_is_case_sensitive() {
        assert_eq!(parse_bar_ms("1m").unwrap(), 60_000);
        assert_eq!(parse_bar_ms("1M").unwrap(), 30 * 86_400_000);
        assert!(parse_bar_ms("1h").is_err());
        assert!(parse_bar_ms("15mutc").is_err());
    }
}
