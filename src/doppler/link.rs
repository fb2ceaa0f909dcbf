use super::SPEED_OF_LIGHT_M_S;

pub fn wavelength_m(freq_hz: f64) -> f64 {
    SPEED_OF_LIGHT_M_S / freq_hz
}

/// Path loss over `range_m` with path loss exponent `exponent` (2 for free space).
pub fn free_space_path_loss_db(range_m: f64, wavelength_m: f64, exponent: f64) -> f64 {
    exponent * 10.0 * (4.0 * std::f64::consts::PI * range_m / wavelength_m).log10()
}

/// Edges of a linear inverting transponder's passbands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransponderPassband {
    pub uplink_min_hz: f64,
    pub uplink_max_hz: f64,
    pub downlink_min_hz: f64,
    pub downlink_max_hz: f64,
}

impl Default for TransponderPassband {
    // FO-29
    fn default() -> Self {
        Self {
            uplink_min_hz: 145.900e6,
            uplink_max_hz: 146.000e6,
            downlink_min_hz: 435.800e6,
            downlink_max_hz: 435.900e6,
        }
    }
}

impl TransponderPassband {
    fn ratio(&self) -> f64 {
        (self.downlink_max_hz - self.downlink_min_hz) / (self.uplink_max_hz - self.uplink_min_hz)
    }
}

/// Downlink frequency for an uplink through an inverting transponder.
pub fn inverting_transponder_downlink_hz(uplink_hz: f64, band: &TransponderPassband) -> f64 {
    band.downlink_max_hz - (uplink_hz - band.uplink_min_hz) * band.ratio()
}

pub fn inverting_transponder_uplink_hz(downlink_hz: f64, band: &TransponderPassband) -> f64 {
    (band.downlink_max_hz - downlink_hz) / band.ratio() + band.uplink_min_hz
}
