mod error;
mod ground_station;
mod propagation;
mod tle_loader;
mod types;

pub use error::PredictError;
pub use ground_station::{GroundStation, EARTH_ROTATION_RAD_S};
pub use propagation::{
    ecef_to_enu, teme_to_ecef_position, teme_to_ecef_velocity, Propagator, Sgp4Propagator,
};
pub use tle_loader::{parse_candidates, TleLoader};
pub use types::{LookSample, OrbitalElements, SatelliteCandidate};
