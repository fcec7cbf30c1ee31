pub mod candle;
pub mod level;
pub mod signal;
pub mod trend;
