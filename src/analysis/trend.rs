use crate::model::candle::CandleSeries;
use crate::model::trend::{Direction, Trend};

/// Daily bars between the last close and the one it is compared against.
pub const GLOBAL_TREND_LOOKBACK: usize = 5;

/// Local trend compares the latest hourly close with the latest daily close;
/// global trend compares the latest daily close with the close
/// [`GLOBAL_TREND_LOOKBACK`] bars earlier.
pub fn determine_trend(hourly: &CandleSeries, daily: &CandleSeries) -> Trend {
    let (Some(price), Some(daily_close)) = (hourly.last_close(), daily.last_close()) else {
        return Trend::default();
    };

    let local = if price > daily_close {
        Direction::Long
    } else {
        Direction::Short
    };

    let global = match daily.close_back(GLOBAL_TREND_LOOKBACK) {
        Some(earlier) if daily_close > earlier => Direction::Long,
        Some(_) => Direction::Short,
        None => Direction::None,
    };

    Trend { local, global }
}
