mod fit;
mod polynomial;

pub use fit::{
    fit_curve, PolyFit, RegressionError, RegressionSettings, DEFAULT_MAX_DEGREE, R2_NOISE_FLOOR,
};
pub use polynomial::Polynomial;
