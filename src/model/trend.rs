#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Long,
    Short,
    #[default]
    None,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trend {
    pub local: Direction,
    pub global: Direction,
}
