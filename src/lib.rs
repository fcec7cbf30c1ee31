pub mod analysis;
pub mod archive;
pub mod config;
pub mod error;
pub mod indicator;
pub mod model;
pub mod okx;
pub mod pipeline;
