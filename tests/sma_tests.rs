use level_watch::indicator::sma::{rolling_mean, Sma};

#[test]
fn reports_from_first_sample() {
    let mut sma = Sma::new(3);
    assert!((sma.push(3.0) - 3.0).abs() < f64::EPSILON);
    assert!((sma.push(5.0) - 4.0).abs() < f64::EPSILON);
}

#[test]
fn ring_buffer_wraps_correctly() {
    let mut sma = Sma::new(3);
    sma.push(10.0);
    sma.push(20.0);
    sma.push(30.0); // avg = 20
    let v = sma.push(40.0); // [40, 20, 30] -> avg = 30
    assert!((v - 30.0).abs() < f64::EPSILON);

    let v = sma.push(50.0); // [40, 50, 30] -> avg = 40
    assert!((v - 40.0).abs() < f64::EPSILON);

    let v = sma.push(60.0); // [40, 50, 60] -> avg = 50
    assert!((v - 50.0).abs() < f64::EPSILON);
}

#[test]
fn rolling_mean_matches_min_periods_one() {
    let out = rolling_mean(&[4.0, 8.0, 6.0, 2.0], 3);
    let expected = [4.0, 6.0, 6.0, 16.0 / 3.0];
    for (got, want) in out.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12);
    }
}
