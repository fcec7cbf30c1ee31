use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::error::AppError;
use crate::model::candle::CandleSeries;
use crate::model::level::KeyLevel;
use crate::model::signal::PatternSignal;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date partition of the archive: `YYYY/MM/week_WW/DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub year: i32,
    pub month: u32,
    pub iso_week: u32,
    pub day: u32,
}

impl Partition {
    /// Partition for the calendar date of `at` in its own time zone.
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let date = at.date_naive();
        Self {
            year: date.year(),
            month: date.month(),
            iso_week: date.iso_week().week(),
            day: date.day(),
        }
    }

    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.year))
            .join(format!("{:02}", self.month))
            .join(format!("week_{:02}", self.iso_week))
            .join(format!("{:02}", self.day))
    }

    pub fn file_name(&self, dataset: &str) -> String {
        format!("{:02}_{}.csv", self.day, dataset)
    }
}

/// Rows of string cells under a fixed header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key_levels(levels: &[KeyLevel]) -> Self {
        let mut table = Self::new(&["type", "price", "timestamp"]);
        for level in levels {
            table.push_row(vec![
                level.kind.to_string(),
                level.price.to_string(),
                format_timestamp(&level.observed_at),
            ]);
        }
        table
    }

    pub fn patterns(signals: &[PatternSignal]) -> Self {
        let mut table = Self::new(&["pattern", "level_price", "timestamp"]);
        for signal in signals {
            table.push_row(vec![
                signal.kind.to_string(),
                signal.level_price.to_string(),
                format_timestamp(&signal.observed_at),
            ]);
        }
        table
    }

    /// Raw candles plus the derived true range and ATR columns.
    pub fn candles(series: &CandleSeries, true_range: &[f64], atr: &[f64]) -> Self {
        let mut table = Self::new(&[
            "timestamp",
            "open",
            "high",
            "low",
            "close",
            "volume",
            "true_range",
            "atr",
        ]);
        for (i, c) in series.candles().iter().enumerate() {
            let derived = |col: &[f64]| col.get(i).map(f64::to_string).unwrap_or_default();
            table.push_row(vec![
                format_timestamp(&c.timestamp),
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
                derived(true_range),
                derived(atr),
            ]);
        }
        table
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Where an append landed and what the file looked like before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveWrite {
    pub path: PathBuf,
    /// Length before the append, `None` when the append created the file.
    pub prior_len: Option<u64>,
}

impl ArchiveWrite {
    pub fn created(&self) -> bool {
        self.prior_len.is_none()
    }
}

/// Destination for the per-run datasets.
pub trait ArchiveSink {
    /// Append `table` to the dataset file of `partition`, creating it (with a
    /// header) if needed. A failed append leaves the file as it was.
    fn append(
        &self,
        dataset: &str,
        partition: &Partition,
        table: &Table,
    ) -> Result<ArchiveWrite, AppError>;

    /// Undo a successful append.
    fn rollback(&self, write: &ArchiveWrite) -> Result<(), AppError>;
}

/// CSV files under `root/YYYY/MM/week_WW/DD/DD_<dataset>.csv`.
#[derive(Debug, Clone)]
pub struct CsvArchive {
    root: PathBuf,
}

impl CsvArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, dataset: &str, partition: &Partition) -> PathBuf {
        self.root
            .join(partition.relative_dir())
            .join(partition.file_name(dataset))
    }

    fn write_rows(path: &Path, table: &Table, with_header: bool) -> Result<(), AppError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        if with_header {
            writer.write_record(&table.header)?;
        }
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Remove partition directories left empty, stopping at the archive root.
    fn prune_empty_dirs(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.root || !d.starts_with(&self.root) || std::fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }
}

impl ArchiveSink for CsvArchive {
    fn append(
        &self,
        dataset: &str,
        partition: &Partition,
        table: &Table,
    ) -> Result<ArchiveWrite, AppError> {
        let path = self.path_for(dataset, partition);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let prior_len = match std::fs::metadata(&path) {
            Ok(meta) if !meta.is_file() => {
                return Err(std::io::Error::other(format!(
                    "{} is not a regular file",
                    path.display()
                ))
                .into());
            }
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let write = ArchiveWrite { path, prior_len };

        if let Err(e) = Self::write_rows(&write.path, table, write.created()) {
            if let Err(undo) = self.rollback(&write) {
                tracing::warn!(
                    path = %write.path.display(),
                    error = %undo,
                    "Failed to undo partial append"
                );
            }
            return Err(e);
        }

        tracing::debug!(
            dataset,
            path = %write.path.display(),
            rows = table.rows.len(),
            header_written = write.created(),
            "Archived dataset"
        );
        Ok(write)
    }

    fn rollback(&self, write: &ArchiveWrite) -> Result<(), AppError> {
        match write.prior_len {
            Some(len) => {
                let file = OpenOptions::new().write(true).open(&write.path)?;
                file.set_len(len)?;
            }
            None => {
                match std::fs::remove_file(&write.path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                self.prune_empty_dirs(&write.path);
            }
        }
        tracing::debug!(path = %write.path.display(), created = write.created(), "Rolled back append");
        Ok(())
    }
}
