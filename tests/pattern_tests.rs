use chrono::{TimeZone, Utc};
use level_watch::analysis::patterns::check_patterns;
use level_watch::model::candle::{Candle, CandleSeries};
use level_watch::model::level::{KeyLevel, LevelKind};
use level_watch::model::signal::PatternKind;

fn bar(hour: i64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: Utc.timestamp_opt(hour * 3600, 0).unwrap(),
        open: close,
        high,
        low,
        close,
        volume: 1.0,
    }
}

fn level(kind: LevelKind, price: f64) -> KeyLevel {
    KeyLevel {
        kind,
        price,
        observed_at: Utc.timestamp_opt(0, 0).unwrap(),
    }
}

fn two_bars(prev: Candle, last: Candle) -> CandleSeries {
    CandleSeries::new(vec![prev, last]).unwrap()
}

#[test]
fn needs_two_bars() {
    let single = CandleSeries::new(vec![bar(0, 110.0, 90.0, 100.0)]).unwrap();
    let levels = [level(LevelKind::Resistance, 105.0)];
    assert!(check_patterns(&single, &levels, Some(5.0)).is_empty());
    assert!(check_patterns(&CandleSeries::empty(), &levels, Some(5.0)).is_empty());
}

#[test]
fn failed_push_through_resistance_is_false_breakout() {
    let s = two_bars(bar(0, 110.0, 95.0, 104.0), bar(1, 103.0, 98.0, 100.0));
    let signals = check_patterns(&s, &[level(LevelKind::Resistance, 105.0)], Some(10.0));
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].kind, PatternKind::FalseBreakout);
    assert!((signals[0].level_price - 105.0).abs() < f64::EPSILON);
    assert_eq!(signals[0].observed_at, s.candles()[1].timestamp);
}

#[test]
fn support_false_breakout() {
    let s = two_bars(bar(0, 102.0, 94.0, 97.0), bar(1, 101.0, 97.0, 100.0));
    let signals = check_patterns(&s, &[level(LevelKind::Support, 95.0)], None);
    let kinds: Vec<PatternKind> = signals.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![PatternKind::FalseBreakout]);
}

#[test]
fn close_through_resistance_is_breakout() {
    let s = two_bars(bar(0, 104.0, 99.0, 103.0), bar(1, 108.0, 103.0, 107.0));
    let signals = check_patterns(&s, &[level(LevelKind::Resistance, 105.0)], Some(4.0));
    let kinds: Vec<PatternKind> = signals.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![PatternKind::Breakout]);
}

#[test]
fn bounce_needs_low_near_support_within_atr_fraction() {
    let s = two_bars(bar(0, 105.0, 101.0, 103.0), bar(1, 104.0, 100.3, 102.0));
    let support = [level(LevelKind::Support, 100.0)];

    let signals = check_patterns(&s, &support, Some(5.0));
    let kinds: Vec<PatternKind> = signals.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![PatternKind::Bounce]);

    // 0.3 away but only 0.2 allowed.
    assert!(check_patterns(&s, &support, Some(2.0)).is_empty());
}

#[test]
fn missing_atr_only_suppresses_bounce() {
    let s = two_bars(bar(0, 102.0, 100.5, 101.0), bar(1, 103.0, 100.2, 102.0));
    let levels = [
        level(LevelKind::Support, 100.0),
        level(LevelKind::Resistance, 101.5),
    ];
    for atr in [None, Some(f64::NAN)] {
        let kinds: Vec<PatternKind> = check_patterns(&s, &levels, atr)
            .iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(kinds, vec![PatternKind::Breakout]);
    }
    let kinds: Vec<PatternKind> = check_patterns(&s, &levels, Some(5.0))
        .iter()
        .map(|s| s.kind)
        .collect();
    assert_eq!(kinds, vec![PatternKind::Bounce, PatternKind::Breakout]);
}

#[test]
fn support_can_be_false_breakout_and_bounce_at_once() {
    let s = two_bars(bar(0, 101.0, 98.0, 99.5), bar(1, 102.0, 100.1, 101.0));
    let signals = check_patterns(&s, &[level(LevelKind::Support, 100.0)], Some(5.0));
    let kinds: Vec<PatternKind> = signals.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![PatternKind::FalseBreakout, PatternKind::Bounce]);
}

#[test]
fn only_last_two_bars_matter() {
    let s = CandleSeries::new(vec![
        bar(0, 200.0, 50.0, 60.0),
        bar(1, 104.0, 99.0, 103.0),
        bar(2, 108.0, 103.0, 107.0),
    ])
    .unwrap();
    let signals = check_patterns(&s, &[level(LevelKind::Resistance, 105.0)], Some(4.0));
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].kind, PatternKind::Breakout);
}
