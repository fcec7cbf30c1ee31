/// Trailing mean over at most `period` values, using a ring buffer for O(1) push.
///
/// Unlike a classic SMA it reports a value from the first sample on, averaging
/// over however many samples it has until the window fills.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    buffer: Vec<f64>,
    head: usize,
    count: usize,
    sum: f64,
}

impl Sma {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            buffer: vec![0.0; period],
            head: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Push a new value and return the mean of the current window.
    pub fn push(&mut self, value: f64) -> f64 {
        if self.count >= self.period {
            self.sum -= self.buffer[self.head];
        }
        self.buffer[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % self.period;
        if self.count < self.period {
            self.count += 1;
        }
        self.sum / self.count as f64
    }
}

/// Rolling mean of `values` with an expanding window until `period` samples exist.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut sma = Sma::new(period);
    values.iter().map(|v| sma.push(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanding_then_rolling() {
        let mut sma = Sma::new(3);
        assert!((sma.push(1.0) - 1.0).abs() < f64::EPSILON);
        assert!((sma.push(2.0) - 1.5).abs() < f64::EPSILON);
        assert!((sma.push(3.0) - 2.0).abs() < f64::EPSILON);
        assert!((sma.push(4.0) - 3.0).abs() < f64::EPSILON);
        assert!((sma.push(5.0) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_period_behaves_like_one() {
        let mut sma = Sma::new(0);
        assert!((sma.push(42.0) - 42.0).abs() < f64::EPSILON);
        assert!((sma.push(99.0) - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_drift_after_many_pushes() {
        let mut sma = Sma::new(10);
        let mut naive_buf: Vec<f64> = Vec::new();

        for i in 0..10_000u64 {
            let val = (i as f64) * 0.1 + 0.01;
            let ring_avg = sma.push(val);
            naive_buf.push(val);
            if naive_buf.len() > 10 {
                naive_buf.remove(0);
            }
            let naive_avg: f64 = naive_buf.iter().sum::<f64>() / naive_buf.len() as f64;
            assert!(
                (ring_avg - naive_avg).abs() < 1e-8,
                "Drift at i={}: ring={} naive={}",
                i,
                ring_avg,
                naive_avg
            );
        }
    }

    #[test]
    fn rolling_mean_keeps_length() {
        assert!(rolling_mean(&[], 14).is_empty());
        let out = rolling_mean(&[2.0, 4.0, 6.0, 8.0], 2);
        assert_eq!(out, vec![2.0, 3.0, 5.0, 7.0]);
    }
}
