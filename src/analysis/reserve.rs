use crate::model::candle::CandleSeries;
use crate::model::signal::ReserveStatus;

/// Share of the daily ATR after which the move counts as exhausted.
pub const RESERVE_ATR_FRACTION: f64 = 0.75;

/// Compare the distance between the last hourly and last daily close with the
/// daily ATR. Exhaustion needs a strictly larger move.
pub fn reserve_move(hourly: &CandleSeries, daily: &CandleSeries, atr: Option<f64>) -> ReserveStatus {
    let (Some(price), Some(daily_close), Some(atr)) = (
        hourly.last_close(),
        daily.last_close(),
        atr.filter(|a| !a.is_nan()),
    ) else {
        return ReserveStatus::NoData;
    };

    if (price - daily_close).abs() > atr * RESERVE_ATR_FRACTION {
        ReserveStatus::Exhausted
    } else {
        ReserveStatus::Normal
    }
}
