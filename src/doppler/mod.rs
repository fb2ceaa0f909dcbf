mod link;

use serde::Serialize;
use thiserror::Error;

pub use link::{
    free_space_path_loss_db, inverting_transponder_downlink_hz, inverting_transponder_uplink_hz,
    wavelength_m, TransponderPassband,
};

/// Speed of light in vacuum [m/s].
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

#[derive(Debug, Error, PartialEq)]
pub enum DopplerError {
    #[error("range rate equals the speed of light, center frequency is undefined")]
    DivisionByZero,
}

/// Frequency seen by a receiver for a fixed-frequency emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DopplerShift {
    pub observed_freq_hz: f64,
    pub offset_hz: f64,
}

/// Doppler shift at the receiver for an emitter at `center_freq_hz`.
///
/// `range_rate_m_s` is negative while the emitter approaches, which yields a
/// positive offset.
pub fn doppler_shift(center_freq_hz: f64, range_rate_m_s: f64) -> DopplerShift {
    DopplerShift {
        observed_freq_hz: (1.0 - range_rate_m_s / SPEED_OF_LIGHT_M_S) * center_freq_hz,
        offset_hz: -range_rate_m_s / SPEED_OF_LIGHT_M_S * center_freq_hz,
    }
}

/// Emitted frequency that produces `observed_freq_hz` at the given range rate.
pub fn invert_doppler(observed_freq_hz: f64, range_rate_m_s: f64) -> Result<f64, DopplerError> {
    let factor = 1.0 - range_rate_m_s / SPEED_OF_LIGHT_M_S;
    if factor == 0.0 {
        return Err(DopplerError::DivisionByZero);
    }
    Ok(observed_freq_hz / factor)
}
