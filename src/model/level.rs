use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Support,
    Resistance,
}

impl LevelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Resistance => "resistance",
        }
    }
}

impl std::fmt::Display for LevelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price that acted as a local extreme inside the lookback window.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLevel {
    pub kind: LevelKind,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}
