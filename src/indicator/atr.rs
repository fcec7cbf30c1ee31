use crate::indicator::sma::rolling_mean;
use crate::model::candle::CandleSeries;

pub const DEFAULT_ATR_PERIOD: usize = 14;

/// True range per bar. The first bar has no prior close and uses `high - low`.
pub fn true_range(series: &CandleSeries) -> Vec<f64> {
    let candles = series.candles();
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let high_low = c.high - c.low;
            match i.checked_sub(1).map(|p| candles[p].close) {
                Some(prev_close) => high_low
                    .max((c.high - prev_close).abs())
                    .max((c.low - prev_close).abs()),
                None => high_low,
            }
        })
        .collect()
}

/// Average true range aligned 1:1 with the series.
///
/// Simple mean of the trailing `period` true ranges, with an expanding window
/// over the first bars (no Wilder smoothing).
pub fn atr(series: &CandleSeries, period: usize) -> Vec<f64> {
    rolling_mean(&true_range(series), period)
}
