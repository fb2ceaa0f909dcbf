pub mod config;
pub mod curve;
pub mod doppler;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod predict;
pub mod regression;

#[cfg(test)]
mod testing;

pub use error::TleMatchError;
