use crate::model::candle::CandleSeries;
use crate::model::level::{KeyLevel, LevelKind};
use crate::model::signal::{PatternKind, PatternSignal};

/// Fraction of ATR within which a low counts as touching a support.
pub const BOUNCE_ATR_FRACTION: f64 = 0.1;

/// Classify the last two bars against every key level.
///
/// `atr` is the ATR at the last bar; when it is missing or NaN only the bounce
/// check is skipped. Checks are independent, so one level can yield several
/// signals, in the order false breakout, breakout, bounce.
pub fn check_patterns(
    series: &CandleSeries,
    levels: &[KeyLevel],
    atr: Option<f64>,
) -> Vec<PatternSignal> {
    let Some((prev, last)) = series.last_pair() else {
        return Vec::new();
    };
    let atr = atr.filter(|a| !a.is_nan());

    let mut signals = Vec::new();
    let mut emit = |kind, level_price| {
        signals.push(PatternSignal {
            kind,
            level_price,
            observed_at: last.timestamp,
        })
    };

    for level in levels {
        let price = level.price;
        let false_breakout = match level.kind {
            LevelKind::Resistance => prev.high > price && last.close < price,
            LevelKind::Support => prev.low < price && last.close > price,
        };
        if false_breakout {
            emit(PatternKind::FalseBreakout, price);
        }

        if level.kind == LevelKind::Resistance && last.close > price && prev.close < price {
            emit(PatternKind::Breakout, price);
        }

        if let Some(atr) = atr {
            if level.kind == LevelKind::Support
                && (last.low - price).abs() < atr * BOUNCE_ATR_FRACTION
                && last.close > price
            {
                emit(PatternKind::Bounce, price);
            }
        }
    }
    signals
}
