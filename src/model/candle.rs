use chrono::{DateTime, Utc};

use crate::error::AppError;

/// One OHLCV bar as delivered by the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// High and low bracket the open and close, and volume is non-negative.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
            && self.volume >= 0.0
    }
}

/// Candles in strictly ascending timestamp order.
///
/// The series is read-only once built. Indicators produce parallel vectors
/// aligned with [`CandleSeries::candles`] instead of touching the bars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(candles: Vec<Candle>) -> Result<Self, AppError> {
        for pair in candles.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(AppError::InvalidSeries(format!(
                    "timestamps not strictly increasing: {} followed by {}",
                    pair[0].timestamp, pair[1].timestamp
                )));
            }
        }
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Last two bars as `(previous, last)`.
    pub fn last_pair(&self) -> Option<(&Candle, &Candle)> {
        match self.candles.as_slice() {
            [.., prev, last] => Some((prev, last)),
            _ => None,
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.last().map(|c| c.close)
    }

    /// Close `bars_back` bars before the last one.
    pub fn close_back(&self, bars_back: usize) -> Option<f64> {
        let idx = self.candles.len().checked_sub(bars_back + 1)?;
        Some(self.candles[idx].close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(secs: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let err = CandleSeries::new(vec![candle(7200, 1.0), candle(3600, 2.0)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidSeries(_)));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        assert!(CandleSeries::new(vec![candle(3600, 1.0), candle(3600, 2.0)]).is_err());
    }

    #[test]
    fn last_pair_and_close_back() {
        let series =
            CandleSeries::new(vec![candle(0, 1.0), candle(60, 2.0), candle(120, 3.0)]).unwrap();
        let (prev, last) = series.last_pair().unwrap();
        assert!((prev.close - 2.0).abs() < f64::EPSILON);
        assert!((last.close - 3.0).abs() < f64::EPSILON);
        assert_eq!(series.close_back(2), Some(1.0));
        assert_eq!(series.close_back(3), None);
    }

    #[test]
    fn single_bar_has_no_pair() {
        let series = CandleSeries::new(vec![candle(0, 1.0)]).unwrap();
        assert!(series.last_pair().is_none());
        assert!(CandleSeries::empty().last_close().is_none());
    }

    #[test]
    fn inverted_bar_is_inconsistent() {
        let mut c = candle(0, 100.0);
        assert!(c.is_consistent());
        c.high = 99.5;
        assert!(!c.is_consistent());
    }
}
