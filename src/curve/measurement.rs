use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::types::{Curve, CurveError, Sample};
use crate::predict::GroundStation;

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Curve(#[from] CurveError),
    #[error("invalid measurement file name {name}: {reason}")]
    InvalidFileName { name: String, reason: String },
    #[error("float32 payload of {0} bytes is not a whole number of samples")]
    TruncatedPayload(usize),
    #[error("trimming {start} + {stop} samples leaves nothing of {len}")]
    TrimTooLarge { start: usize, stop: usize, len: usize },
}

/// One row of a Doppler JSON records file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DopplerRecord {
    pub timestamp: DateTime<Utc>,
    pub doppler_offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured_freq: Option<f64>,
}

/// Sidecar describing how and where a measurement was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementMetadata {
    pub sat_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub rx_center_freq: f64,
    pub gs_lat: f64,
    pub gs_lon: f64,
    #[serde(default)]
    pub gs_alt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gs_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gs_callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gs_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samp_rate_str: Option<String>,
}

impl MeasurementMetadata {
    pub fn ground_station(&self) -> GroundStation {
        GroundStation::new(self.gs_lat, self.gs_lon, self.gs_alt)
    }

    pub fn from_file(path: &Path) -> Result<Self, MeasurementError> {
        log::info!("Importing measurement metadata from: {}", path.display());
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), MeasurementError> {
        log::info!("Exporting metadata to: {}", path.display());
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn read_curve_json(path: &Path, name: &str) -> Result<Curve, MeasurementError> {
    log::info!("Importing Doppler data from: {}", path.display());
    let content = fs::read_to_string(path)?;
    let records: Vec<DopplerRecord> = serde_json::from_str(&content)?;
    let samples = records
        .into_iter()
        .map(|r| Sample::new(r.timestamp, r.doppler_offset))
        .collect();
    Ok(Curve::new(name, samples)?)
}

/// Writes JSON records. With a center frequency each record also carries the measured frequency.
pub fn write_curve_json(
    path: &Path,
    curve: &Curve,
    center_freq_hz: Option<f64>,
) -> Result<(), MeasurementError> {
    log::info!("Exporting JSON Doppler file: {}", path.display());
    fs::write(
        path,
        serde_json::to_string(&records(curve, center_freq_hz))?,
    )?;
    Ok(())
}

pub fn write_curve_csv(
    path: &Path,
    curve: &Curve,
    center_freq_hz: Option<f64>,
) -> Result<(), MeasurementError> {
    log::info!("Exporting CSV Doppler file: {}", path.display());
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["index", "timestamp", "doppler_offset"];
    if center_freq_hz.is_some() {
        header.push("measured_freq");
    }
    writer.write_record(&header)?;

    for (index, record) in records(curve, center_freq_hz).iter().enumerate() {
        let mut row = vec![
            index.to_string(),
            record.timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            format!("{:.10}", record.doppler_offset),
        ];
        if let Some(freq) = record.measured_freq {
            row.push(format!("{:.10}", freq));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn records(curve: &Curve, center_freq_hz: Option<f64>) -> Vec<DopplerRecord> {
    curve
        .samples()
        .iter()
        .map(|s| DopplerRecord {
            timestamp: s.timestamp,
            doppler_offset: s.offset_hz,
            measured_freq: center_freq_hz.map(|c| c + s.offset_hz),
        })
        .collect()
}

/// `DOPPLER_<name>_<YYYYmmdd_HHMMSS.ffffff>_UTC_<rate>`, without extension.
pub fn doppler_file_stem(name: &str, first: DateTime<Utc>, samp_rate_str: &str) -> String {
    format!(
        "DOPPLER_{}_{}_{}",
        name,
        first.format("%Y%m%d_%H%M%S%.6f_UTC"),
        samp_rate_str
    )
}

/// Metadata encoded in a GNU Radio recording's file name:
/// `<SAT>_<RECEIVER>_YYYYMMDD_HHMMSS.ffffff_UTC_<RATE>.f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingName {
    pub sat_name: String,
    pub receiver: String,
    pub start: DateTime<Utc>,
    pub samp_rate: u32,
    pub samp_rate_str: String,
}

impl RecordingName {
    pub fn parse(file_name: &str) -> Result<Self, MeasurementError> {
        let invalid = |reason: &str| MeasurementError::InvalidFileName {
            name: file_name.to_string(),
            reason: reason.to_string(),
        };

        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| invalid("no file stem"))?;
        let parts: Vec<&str> = stem.split('_').collect();
        let [sat_name, receiver, date, time, zone, rate] = parts.as_slice() else {
            return Err(invalid("expected 6 underscore separated fields"));
        };
        if *zone != "UTC" {
            return Err(invalid("timestamp must be UTC"));
        }

        let start = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y%m%d %H%M%S%.f")
            .map_err(|e| invalid(&e.to_string()))?
            .and_utc();
        let samp_rate = parse_sample_rate(rate).ok_or_else(|| invalid("unknown sample rate"))?;

        Ok(Self {
            sat_name: sat_name.to_string(),
            receiver: receiver.to_string(),
            start,
            samp_rate,
            samp_rate_str: rate.to_string(),
        })
    }

    /// Timestamp of sample `index`.
    pub fn sample_time(&self, index: usize) -> DateTime<Utc> {
        self.start + Duration::nanoseconds(index as i64 * 1_000_000_000 / self.samp_rate as i64)
    }
}

/// `10sps`, `50k` and `2M` style rates in samples per second.
fn parse_sample_rate(rate: &str) -> Option<u32> {
    let (digits, multiplier) = if let Some(d) = rate.strip_suffix("sps") {
        (d, 1)
    } else if let Some(d) = rate.strip_suffix('k') {
        (d, 1_000)
    } else if let Some(d) = rate.strip_suffix('M') {
        (d, 1_000_000)
    } else {
        return None;
    };
    digits
        .parse::<u32>()
        .ok()
        .and_then(|v| v.checked_mul(multiplier))
        .filter(|v| *v > 0)
}

/// Little-endian float32 samples as written by a GNU Radio file sink.
pub fn read_gr_f32(path: &Path) -> Result<Vec<f32>, MeasurementError> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(MeasurementError::TruncatedPayload(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Imports a GNU Radio Doppler recording, dropping `start` leading and `stop` trailing samples.
pub fn import_gr_recording(
    path: &Path,
    start: usize,
    stop: usize,
) -> Result<(RecordingName, Curve), MeasurementError> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MeasurementError::InvalidFileName {
            name: path.display().to_string(),
            reason: "not valid UTF-8".into(),
        })?;
    let recording = RecordingName::parse(file_name)?;

    log::info!("Importing Doppler data from: {}", path.display());
    log::info!("      Recording start time [UTC]: {}", recording.start);
    log::info!("Recording sample rate [samp/sec]: {}", recording.samp_rate);

    let data = read_gr_f32(path)?;
    if start + stop >= data.len() {
        return Err(MeasurementError::TrimTooLarge {
            start,
            stop,
            len: data.len(),
        });
    }
    log::info!("Extracting data points: [{}:{}]", start, data.len() - stop);

    let samples = data[start..data.len() - stop]
        .iter()
        .enumerate()
        .map(|(i, v)| Sample::new(recording.sample_time(start + i), *v as f64))
        .collect();
    let curve = Curve::new(recording.sat_name.clone(), samples)?;
    Ok((recording, curve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    const FOX_RECORDING: &str = "FOX-1D_USRP_20180113_161106.862011_UTC_10sps.f32";

    #[test]
    fn parses_recording_file_name() {
        let rec = RecordingName::parse(FOX_RECORDING).unwrap();
        assert_eq!(rec.sat_name, "FOX-1D");
        assert_eq!(rec.receiver, "USRP");
        assert_eq!(rec.samp_rate, 10);
        assert_eq!(
            rec.start,
            Utc.with_ymd_and_hms(2018, 1, 13, 16, 11, 6).unwrap() + Duration::microseconds(862_011)
        );
        assert_eq!(rec.sample_time(15) - rec.start, Duration::milliseconds(1500));
    }

    #[test]
    fn sample_rate_suffixes() {
        assert_eq!(parse_sample_rate("50k"), Some(50_000));
        assert_eq!(parse_sample_rate("2M"), Some(2_000_000));
        assert_eq!(parse_sample_rate("10sps"), Some(10));
        assert_eq!(parse_sample_rate("0sps"), None);
        assert_eq!(parse_sample_rate("fast"), None);
    }

    #[test]
    fn rejects_malformed_file_names() {
        assert!(RecordingName::parse("FOX-1D_USRP.f32").is_err());
        assert!(RecordingName::parse("FOX-1D_USRP_20180113_161106.862011_EST_10sps.f32").is_err());
        assert!(RecordingName::parse("FOX-1D_USRP_2018XX13_161106.862011_UTC_10sps.f32").is_err());
    }

    #[test]
    fn imports_and_trims_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FOX_RECORDING);
        let mut file = fs::File::create(&path).unwrap();
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0] {
            file.write_all(&v.to_le_bytes()).unwrap();
        }
        drop(file);

        let (rec, curve) = import_gr_recording(&path, 1, 2).unwrap();
        assert_eq!(curve.offsets_hz(), vec![2.0, 3.0]);
        assert_eq!(curve.start(), rec.sample_time(1));
        assert_eq!(curve.name(), "FOX-1D");

        assert!(matches!(
            import_gr_recording(&path, 3, 2),
            Err(MeasurementError::TrimTooLarge { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FOX_RECORDING);
        fs::write(&path, [0u8; 6]).unwrap();
        assert!(matches!(read_gr_f32(&path), Err(MeasurementError::TruncatedPayload(6))));
    }

    #[test]
    fn json_records_round_trip_through_disk() {
        let start = Utc.with_ymd_and_hms(2018, 1, 13, 16, 12, 1).unwrap();
        let curve = Curve::new(
            "FOX-1D",
            (0..4)
                .map(|i| Sample::new(start + Duration::milliseconds(100 * i), 500.0 - i as f64))
                .collect(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        write_curve_json(&path, &curve, Some(145.88e6)).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("measured_freq"));
        assert_eq!(read_curve_json(&path, "FOX-1D").unwrap(), curve);
    }

    #[test]
    fn csv_export_has_index_column() {
        let start = Utc.with_ymd_and_hms(2018, 1, 13, 16, 12, 1).unwrap();
        let curve = Curve::new("FOX-1D", vec![Sample::new(start, 12.5)]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.csv");
        write_curve_csv(&path, &curve, None).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("index,timestamp,doppler_offset"));
        assert_eq!(
            lines.next(),
            Some("0,2018-01-13T16:12:01.000000Z,12.5000000000")
        );
    }

    #[test]
    fn metadata_sidecar_uses_source_field_names() {
        let json = r#"{"sat_name": "FOX-1D", "receiver": "USRP", "rx_center_freq": 145880000.0,
                       "gs_lat": 37.229976, "gs_lon": -80.439627, "gs_alt": 610}"#;
        let md: MeasurementMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(md.ground_station(), GroundStation::default());
        assert_eq!(md.gs_name, None);
    }

    #[test]
    fn file_stem_matches_converter_naming() {
        let ts = Utc.with_ymd_and_hms(2018, 1, 13, 16, 12, 1).unwrap() + Duration::microseconds(862_011);
        assert_eq!(
            doppler_file_stem("FOX-1D", ts, "10sps"),
            "DOPPLER_FOX-1D_20180113_161201.862011_UTC_10sps"
        );
    }
}
