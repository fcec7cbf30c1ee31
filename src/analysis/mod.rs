pub mod levels;
pub mod patterns;
pub mod reserve;
pub mod round_level;
pub mod trend;
