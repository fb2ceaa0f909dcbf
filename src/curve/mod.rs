mod generator;
pub mod measurement;
mod types;

pub use generator::{generate_curve, GenerateError};
pub use measurement::{MeasurementError, MeasurementMetadata};
pub use types::{Curve, CurveError, Sample};
