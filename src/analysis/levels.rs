use std::collections::VecDeque;

use crate::model::candle::CandleSeries;
use crate::model::level::{KeyLevel, LevelKind};

pub const DEFAULT_LEVEL_WINDOW: usize = 20;

/// Trailing extreme over at most `window` values, expanding over the first ones.
fn rolling_extreme(values: &[f64], window: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let window = window.max(1);
    let mut recent: VecDeque<f64> = VecDeque::with_capacity(window);
    values
        .iter()
        .map(|v| {
            recent.push_back(*v);
            while recent.len() > window {
                let _ = recent.pop_front();
            }
            recent.iter().copied().fold(*v, pick)
        })
        .collect()
}

/// Support and resistance levels from the interior bars of the series.
///
/// A bar whose high equals the trailing `window` high is a resistance, a bar
/// whose low equals the trailing low is a support. The first and last bars are
/// never candidates. Equal extremes each produce their own level.
pub fn find_key_levels(series: &CandleSeries, window: usize) -> Vec<KeyLevel> {
    let candles = series.candles();
    if candles.len() < 3 {
        return Vec::new();
    }

    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let rolling_high = rolling_extreme(&highs, window, f64::max);
    let rolling_low = rolling_extreme(&lows, window, f64::min);

    let mut levels = Vec::new();
    for i in 1..candles.len() - 1 {
        let c = &candles[i];
        if c.high == rolling_high[i] {
            levels.push(KeyLevel {
                kind: LevelKind::Resistance,
                price: c.high,
                observed_at: c.timestamp,
            });
        }
        if c.low == rolling_low[i] {
            levels.push(KeyLevel {
                kind: LevelKind::Support,
                price: c.low,
                observed_at: c.timestamp,
            });
        }
    }
    levels
}
