use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::curve::types::{Curve, CurveError, Sample};
use crate::doppler::doppler_shift;
use crate::predict::{GroundStation, PredictError, Propagator, SatelliteCandidate};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Propagation(#[from] PredictError),
    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Doppler offsets `candidate` would produce at `station` on each timestamp.
///
/// Every timestamp yields exactly one sample; a single propagation failure
/// fails the whole curve.
pub fn generate_curve<P: Propagator + ?Sized>(
    propagator: &P,
    candidate: &SatelliteCandidate,
    station: &GroundStation,
    timestamps: &[DateTime<Utc>],
    center_freq_hz: f64,
) -> Result<Curve, GenerateError> {
    log::info!(
        "Generating Doppler data for {}_{} at {:.6} MHz",
        candidate.name,
        candidate.norad_id,
        center_freq_hz / 1e6
    );

    let range_rates = propagator.range_rates_m_s(candidate, station, timestamps)?;
    if range_rates.len() != timestamps.len() {
        if let Some(&timestamp) = timestamps.get(range_rates.len()).or(timestamps.last()) {
            return Err(PredictError::Propagation {
                satellite: candidate.name.clone(),
                timestamp,
                message: format!(
                    "{} range rates for {} timestamps",
                    range_rates.len(),
                    timestamps.len()
                ),
            }
            .into());
        }
    }
    let samples = timestamps
        .iter()
        .zip(range_rates)
        .map(|(t, rate)| Sample::new(*t, doppler_shift(center_freq_hz, rate).offset_hz))
        .collect();

    Ok(Curve::new(candidate.name.clone(), samples)?)
}
