use chrono::{DateTime, Duration, Utc};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::Curve;
use crate::regression::polynomial::Polynomial;

/// Smallest R² gain that counts as an improvement.
pub const R2_NOISE_FLOOR: f64 = 1e-12;

pub const DEFAULT_MAX_DEGREE: usize = 15;

#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("curve {name} has {samples} samples, at least 2 are needed")]
    TooFewSamples { name: String, samples: usize },
    #[error("curve {0} is constant, R² is undefined")]
    ConstantCurve(String),
    #[error("curve {name}: design matrix is rank deficient at degree {degree}")]
    RankDeficient { name: String, degree: usize },
    #[error("curve {name}: degree {degree} fit is not finite")]
    NonFinite { name: String, degree: usize },
    #[error("interpolation factor must be at least 1 and keep the grid addressable")]
    InvalidInterpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionSettings {
    /// Regression grid points per sample interval.
    pub interp_factor: u32,
    pub max_degree: usize,
}

impl Default for RegressionSettings {
    fn default() -> Self {
        Self {
            interp_factor: 1,
            max_degree: DEFAULT_MAX_DEGREE,
        }
    }
}

/// Best polynomial fit of a curve and the inflection point derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyFit {
    pub name: String,
    pub degree: usize,
    /// Highest power first, in units of sample index.
    pub coefficients: Vec<f64>,
    pub goodness_of_fit: f64,
    /// Number of points on the regression grid.
    pub index_domain_len: usize,
    /// Fractional sample index where the fitted slope is most negative.
    pub tca_index: f64,
    pub tca_offset_hz: f64,
    pub tca_timestamp: DateTime<Utc>,
}

impl PolyFit {
    pub fn polynomial(&self) -> Polynomial {
        Polynomial::new(self.coefficients.clone())
    }
}

/// Maps sample indices onto [-1, 1] so high degree fits stay well conditioned.
#[derive(Debug, Clone, Copy)]
struct IndexScale {
    center: f64,
    half_width: f64,
}

impl IndexScale {
    fn new(samples: usize) -> Self {
        let half_width = (samples - 1) as f64 / 2.0;
        Self {
            center: half_width,
            half_width,
        }
    }

    fn to_unit(self, index: f64) -> f64 {
        (index - self.center) / self.half_width
    }

    fn to_index_basis(self, unit: &Polynomial) -> Polynomial {
        unit.compose_linear(1.0 / self.half_width, -self.center / self.half_width)
    }
}

struct DegreeFit {
    unit_poly: Polynomial,
    r_squared: f64,
}

struct Regression<'a> {
    name: &'a str,
    unit_x: Vec<f64>,
    y: DVector<f64>,
    ss_tot: f64,
}

impl<'a> Regression<'a> {
    fn new(name: &'a str, scale: IndexScale, offsets: Vec<f64>) -> Result<Self, RegressionError> {
        let unit_x = (0..offsets.len()).map(|i| scale.to_unit(i as f64)).collect();
        let y = DVector::from_vec(offsets);
        let mean = y.mean();
        let ss_tot = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        if ss_tot == 0.0 {
            return Err(RegressionError::ConstantCurve(name.to_string()));
        }
        Ok(Self {
            name,
            unit_x,
            y,
            ss_tot,
        })
    }

    fn fit(&self, degree: usize) -> Result<DegreeFit, RegressionError> {
        let rank_deficient = || RegressionError::RankDeficient {
            name: self.name.to_string(),
            degree,
        };

        let design = DMatrix::from_fn(self.unit_x.len(), degree + 1, |i, j| {
            self.unit_x[i].powi((degree - j) as i32)
        });
        let svd = design.clone().svd(true, true);
        let tolerance = svd.singular_values.max() * 1e-12;
        if svd.rank(tolerance) < degree + 1 {
            return Err(rank_deficient());
        }
        let coefficients = svd.solve(&self.y, tolerance).map_err(|_| rank_deficient())?;

        let residuals = &self.y - &design * &coefficients;
        let ss_res = residuals.norm_squared();
        let r_squared = 1.0 - ss_res / self.ss_tot;
        if !r_squared.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(RegressionError::NonFinite {
                name: self.name.to_string(),
                degree,
            });
        }

        Ok(DegreeFit {
            unit_poly: Polynomial::new(coefficients.iter().copied().collect()),
            r_squared,
        })
    }
}

/// Fits `curve` with the lowest degree beyond which R² stops improving, then
/// locates the fitted inflection point.
pub fn fit_curve(curve: &Curve, settings: &RegressionSettings) -> Result<PolyFit, RegressionError> {
    if settings.interp_factor == 0 {
        return Err(RegressionError::InvalidInterpolation);
    }
    let samples = curve.len();
    if samples < 2 {
        return Err(RegressionError::TooFewSamples {
            name: curve.name().to_string(),
            samples,
        });
    }

    let scale = IndexScale::new(samples);
    let regression = Regression::new(curve.name(), scale, curve.offsets_hz())?;
    let max_degree = settings.max_degree.clamp(1, samples - 1);

    let mut best = regression.fit(1)?;
    let mut degree = 1;
    log::debug!("{}: degree 1 R² {}", curve.name(), best.r_squared);

    while degree < max_degree {
        let next = match regression.fit(degree + 1) {
            Ok(next) => next,
            Err(RegressionError::RankDeficient { .. }) => break,
            Err(e) => return Err(e),
        };
        log::debug!("{}: degree {} R² {}", curve.name(), degree + 1, next.r_squared);
        if next.r_squared <= best.r_squared + R2_NOISE_FLOOR {
            break;
        }
        best = next;
        degree += 1;
    }

    let interp = settings.interp_factor as usize;
    let grid_len = (samples - 1)
        .checked_mul(interp)
        .and_then(|n| n.checked_add(1))
        .ok_or(RegressionError::InvalidInterpolation)?;
    let slope = best.unit_poly.derivative();
    let step = (0..grid_len)
        .map(|k| slope.eval(scale.to_unit(k as f64 / interp as f64)))
        .enumerate()
        .fold((0, f64::INFINITY), |(best_k, best_v), (k, v)| {
            if v < best_v {
                (k, v)
            } else {
                (best_k, best_v)
            }
        })
        .0;

    let tca_index = step as f64 / interp as f64;
    let fit = PolyFit {
        name: curve.name().to_string(),
        degree,
        coefficients: scale.to_index_basis(&best.unit_poly).into_coefficients(),
        goodness_of_fit: best.r_squared,
        index_domain_len: grid_len,
        tca_index,
        tca_offset_hz: best.unit_poly.eval(scale.to_unit(tca_index)),
        tca_timestamp: grid_timestamp(&curve.timestamps(), step, interp),
    };

    log::info!(
        "{}: degree {} fit, R² {:.9}, TCA index {:.3}, offset {:.3} Hz at {}",
        fit.name,
        fit.degree,
        fit.goodness_of_fit,
        fit.tca_index,
        fit.tca_offset_hz,
        fit.tca_timestamp
    );
    Ok(fit)
}

/// Timestamp of regression grid point `step`, interpolated between the
/// neighbouring samples.
fn grid_timestamp(timestamps: &[DateTime<Utc>], step: usize, interp: usize) -> DateTime<Utc> {
    let data_index = step / interp;
    let remainder = step % interp;
    let base = timestamps[data_index];
    if remainder == 0 {
        return base;
    }
    let span = timestamps[data_index + 1] - base;
    base + scale_duration(span, remainder as i64, interp as i64)
}

fn scale_duration(span: Duration, numerator: i64, denominator: i64) -> Duration {
    // numerator < denominator, so the quotient fits back into i64.
    let scale = |v: i64| (v as i128 * numerator as i128 / denominator as i128) as i64;
    match span.num_nanoseconds() {
        Some(ns) => Duration::nanoseconds(scale(ns)),
        None => Duration::milliseconds(scale(span.num_milliseconds())),
    }
}
