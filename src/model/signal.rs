use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Breakout,
    FalseBreakout,
    Bounce,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakout => "breakout",
            Self::FalseBreakout => "false_breakout",
            Self::Bounce => "bounce",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternSignal {
    pub kind: PatternKind,
    pub level_price: f64,
    /// Timestamp of the bar that completed the pattern.
    pub observed_at: DateTime<Utc>,
}

/// How much of the daily range the current move has already used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveStatus {
    NoData,
    Exhausted,
    Normal,
}

impl ReserveStatus {
    pub fn description(self) -> &'static str {
        match self {
            Self::NoData => "not enough data to estimate the reserve move",
            Self::Exhausted => "reserve move exhausted (>75% ATR), favor counter-trend trades",
            Self::Normal => "reserve move normal",
        }
    }
}

impl std::fmt::Display for ReserveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}
