use serde::{Deserialize, Serialize};

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

impl Default for GroundStation {
    // Virginia Tech, Blacksburg
    fn default() -> Self {
        Self {
            latitude_deg: 37.229976,
            longitude_deg: -80.439627,
            altitude_m: 610.0,
        }
    }
}

impl GroundStation {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    /// Parses `"lat, lon"` in decimal degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: Option<f64>) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=360.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon, altitude_m.unwrap_or(0.0)))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pair() {
        let gs = GroundStation::from_coordinates("37.229976, -80.439627", Some(610.0)).unwrap();
        assert_eq!(gs, GroundStation::default());
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(GroundStation::from_coordinates("37.2", None).is_none());
        assert!(GroundStation::from_coordinates("north, west", None).is_none());
        assert!(GroundStation::from_coordinates("95.0, 10.0", None).is_none());
    }

    #[test]
    fn equatorial_station_sits_on_semi_major_axis() {
        let pos = GroundStation::new(0.0, 0.0, 0.0).position_ecef_km();
        assert!((pos[0] - 6378.137).abs() < 1e-9);
        assert!(pos[1].abs() < 1e-9 && pos[2].abs() < 1e-9);
    }

    #[test]
    fn polar_station_sits_on_semi_minor_axis() {
        let pos = GroundStation::new(90.0, 0.0, 0.0).position_ecef_km();
        assert!((pos[2] - 6356.752).abs() < 1e-3);
    }
}
