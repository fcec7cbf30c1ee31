use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};

use crate::analysis::levels::find_key_levels;
use crate::analysis::patterns::check_patterns;
use crate::analysis::reserve::reserve_move;
use crate::analysis::round_level::find_round_level;
use crate::analysis::trend::determine_trend;
use crate::archive::{ArchiveSink, ArchiveWrite, Partition, Table};
use crate::config::{AnalysisConfig, Config};
use crate::error::AppError;
use crate::indicator::atr::{atr, true_range};
use crate::model::candle::CandleSeries;
use crate::model::level::KeyLevel;
use crate::model::signal::{PatternSignal, ReserveStatus};
use crate::model::trend::Trend;

/// Key levels echoed in the run log.
const LOGGED_LEVELS: usize = 5;

/// Source of candle series for one instrument and bar size.
pub trait CandleSource {
    fn fetch_candles(&self, inst_id: &str, bar: &str, limit: usize)
        -> Result<CandleSeries, AppError>;
}

/// Derived columns for one series, aligned with its bars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesIndicators {
    pub true_range: Vec<f64>,
    pub atr: Vec<f64>,
}

impl SeriesIndicators {
    pub fn compute(series: &CandleSeries, atr_period: usize) -> Self {
        Self {
            true_range: true_range(series),
            atr: atr(series, atr_period),
        }
    }

    pub fn last_atr(&self) -> Option<f64> {
        self.atr.last().copied()
    }
}

/// Everything one run derives from the hourly and daily series.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub hourly: SeriesIndicators,
    pub daily: SeriesIndicators,
    pub trend: Trend,
    pub key_levels: Vec<KeyLevel>,
    pub round_level: Option<f64>,
    pub patterns: Vec<PatternSignal>,
    pub daily_atr: Option<f64>,
    pub reserve: ReserveStatus,
}

/// Run every analysis stage over the two series. Pure.
pub fn analyze(
    hourly: &CandleSeries,
    daily: &CandleSeries,
    config: &AnalysisConfig,
) -> AnalysisReport {
    let hourly_ind = SeriesIndicators::compute(hourly, config.atr_period);
    let daily_ind = SeriesIndicators::compute(daily, config.atr_period);

    let trend = determine_trend(hourly, daily);
    let key_levels = find_key_levels(hourly, config.level_window);
    let round_level = find_round_level(hourly.last_close(), &config.round_levels);
    let patterns = check_patterns(hourly, &key_levels, hourly_ind.last_atr());
    let daily_atr = daily_ind.last_atr();
    let reserve = reserve_move(hourly, daily, daily_atr);

    AnalysisReport {
        hourly: hourly_ind,
        daily: daily_ind,
        trend,
        key_levels,
        round_level,
        patterns,
        daily_atr,
        reserve,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A fetch came back empty; nothing was analysed or written.
    Skipped,
    Completed {
        report: AnalysisReport,
        written: Vec<PathBuf>,
    },
}

/// Fetch, analyse, then archive. Analysis finishes before the first write and
/// a failed write rolls back the run's earlier appends.
pub fn run_once(
    source: &dyn CandleSource,
    sink: &dyn ArchiveSink,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<RunOutcome, AppError> {
    let offset = FixedOffset::east_opt(config.archive.utc_offset_hours * 3600).ok_or_else(|| {
        AppError::Config(format!(
            "archive.utc_offset_hours out of range: {}",
            config.archive.utc_offset_hours
        ))
    })?;
    let local_now = now.with_timezone(&offset);
    tracing::info!(run_at = %local_now.format("%Y-%m-%d %H:%M:%S"), "Starting run");

    let okx = &config.okx;
    let hourly = source.fetch_candles(&okx.inst_id, &okx.hourly_bar, okx.limit)?;
    let daily = source.fetch_candles(&okx.inst_id, &okx.daily_bar, okx.limit)?;

    if hourly.is_empty() || daily.is_empty() {
        tracing::warn!(
            hourly_bars = hourly.len(),
            daily_bars = daily.len(),
            "OHLCV data is empty, stopping"
        );
        return Ok(RunOutcome::Skipped);
    }

    let report = analyze(&hourly, &daily, &config.analysis);

    let partition = Partition::from_datetime(&local_now);
    let datasets = &config.archive.datasets;
    let tables = [
        (&datasets.levels, Table::key_levels(&report.key_levels)),
        (&datasets.patterns, Table::patterns(&report.patterns)),
        (
            &datasets.ohlcv_hourly,
            Table::candles(&hourly, &report.hourly.true_range, &report.hourly.atr),
        ),
        (
            &datasets.ohlcv_daily,
            Table::candles(&daily, &report.daily.true_range, &report.daily.atr),
        ),
    ];

    let mut writes = Vec::with_capacity(tables.len());
    for (dataset, table) in &tables {
        if table.is_empty() {
            continue;
        }
        match sink.append(dataset, &partition, table) {
            Ok(write) => writes.push(write),
            Err(e) => {
                rollback_writes(sink, &writes);
                return Err(e);
            }
        }
    }
    let written = writes.into_iter().map(|w| w.path).collect();

    log_report(&report);
    Ok(RunOutcome::Completed { report, written })
}

/// Undo this run's appends, newest first.
fn rollback_writes(sink: &dyn ArchiveSink, writes: &[ArchiveWrite]) {
    for write in writes.iter().rev() {
        if let Err(e) = sink.rollback(write) {
            tracing::error!(
                path = %write.path.display(),
                error = %e,
                "Failed to roll back archived dataset"
            );
        }
    }
    tracing::warn!(rolled_back = writes.len(), "Archiving failed, run discarded");
}

fn log_report(report: &AnalysisReport) {
    tracing::info!(
        local = %report.trend.local,
        global = %report.trend.global,
        "Trend"
    );

    let recent = &report.key_levels[report.key_levels.len().saturating_sub(LOGGED_LEVELS)..];
    if recent.is_empty() {
        tracing::info!("Key levels (last 5): none");
    }
    for level in recent {
        tracing::info!(
            kind = %level.kind,
            price = level.price,
            observed_at = %level.observed_at,
            "Key level"
        );
    }

    match report.round_level {
        Some(level) => tracing::info!(level, "Round level"),
        None => tracing::info!("Round level: none"),
    }

    tracing::info!(count = report.patterns.len(), "Patterns found");
    for signal in &report.patterns {
        tracing::info!(
            pattern = %signal.kind,
            level_price = signal.level_price,
            observed_at = %signal.observed_at,
            "Pattern"
        );
    }

    tracing::info!(
        status = ?report.reserve,
        daily_atr = ?report.daily_atr,
        "Reserve move: {}",
        report.reserve
    );
}
