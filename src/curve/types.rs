use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("curve {0} has no samples")]
    Empty(String),
    #[error("curve {name}: timestamp at sample {index} does not increase")]
    NonMonotonic { name: String, index: usize },
    #[error("curve {name}: offset at sample {index} is not finite")]
    NonFinite { name: String, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub offset_hz: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, offset_hz: f64) -> Self {
        Self {
            timestamp,
            offset_hz,
        }
    }
}

/// Doppler offsets of one pass, strictly ordered by time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    name: String,
    samples: Vec<Sample>,
}

impl Curve {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Result<Self, CurveError> {
        let name = name.into();
        if samples.is_empty() {
            return Err(CurveError::Empty(name));
        }
        for (index, sample) in samples.iter().enumerate() {
            if !sample.offset_hz.is_finite() {
                return Err(CurveError::NonFinite { name, index });
            }
            if index > 0 && sample.timestamp <= samples[index - 1].timestamp {
                return Err(CurveError::NonMonotonic { name, index });
            }
        }
        Ok(Self { name, samples })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    pub fn offsets_hz(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.offset_hz).collect()
    }

    /// Offsets as a fraction of the receiver center frequency.
    pub fn normalized_offsets(&self, center_freq_hz: f64) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.offset_hz / center_freq_hz)
            .collect()
    }

    /// Time between the first two samples.
    pub fn sample_spacing(&self) -> Option<Duration> {
        match self.samples.as_slice() {
            [first, second, ..] => Some(second.timestamp - first.timestamp),
            _ => None,
        }
    }

    // `Curve::new` rejects empty sample lists, so first and last always exist.
    pub fn start(&self) -> DateTime<Utc> {
        match self.samples.first() {
            Some(s) => s.timestamp,
            None => unreachable!("curve {} has no samples", self.name),
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self.samples.last() {
            Some(s) => s.timestamp,
            None => unreachable!("curve {} has no samples", self.name),
        }
    }

    /// Drops the samples taken within `offset` of the first one.
    pub fn skip_leading(&self, offset: Duration) -> Result<Curve, CurveError> {
        let cutoff = self.start() + offset;
        let samples = self
            .samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect();
        Curve::new(self.name.clone(), samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 1, 13, 16, 12, 1).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn accepts_ordered_samples() {
        let curve = Curve::new(
            "FOX-1D",
            vec![Sample::new(t(0), 10.0), Sample::new(t(100), 9.0), Sample::new(t(200), 8.0)],
        )
        .unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.sample_spacing(), Some(Duration::milliseconds(100)));
        assert_eq!(curve.end() - curve.start(), Duration::milliseconds(200));
        assert_eq!(curve.normalized_offsets(10.0), vec![1.0, 0.9, 0.8]);
    }

    #[test]
    fn rejects_empty_curve() {
        assert_eq!(
            Curve::new("FOX-1D", vec![]),
            Err(CurveError::Empty("FOX-1D".into()))
        );
    }

    #[test]
    fn rejects_repeated_or_backwards_timestamps() {
        let err = Curve::new(
            "FOX-1D",
            vec![Sample::new(t(0), 1.0), Sample::new(t(100), 1.0), Sample::new(t(100), 1.0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CurveError::NonMonotonic {
                name: "FOX-1D".into(),
                index: 2
            }
        );
        assert!(Curve::new("x", vec![Sample::new(t(5), 1.0), Sample::new(t(0), 1.0)]).is_err());
    }

    #[test]
    fn rejects_nan_offsets() {
        let err = Curve::new("x", vec![Sample::new(t(0), f64::NAN)]).unwrap_err();
        assert!(matches!(err, CurveError::NonFinite { index: 0, .. }));
    }

    #[test]
    fn skip_leading_trims_by_time() {
        let curve = Curve::new(
            "FOX-1D",
            (0..10).map(|i| Sample::new(t(i * 100), i as f64)).collect(),
        )
        .unwrap();
        let trimmed = curve.skip_leading(Duration::milliseconds(250)).unwrap();
        assert_eq!(trimmed.len(), 7);
        assert_eq!(trimmed.start(), t(300));
        assert_eq!(trimmed.name(), "FOX-1D");
        assert_eq!(
            curve.skip_leading(Duration::seconds(5)),
            Err(CurveError::Empty("FOX-1D".into()))
        );
    }

    #[test]
    fn single_sample_has_no_spacing() {
        let curve = Curve::new("x", vec![Sample::new(t(0), 1.0)]).unwrap();
        assert_eq!(curve.sample_spacing(), None);
        assert_eq!(curve.start(), t(0));
        assert_eq!(curve.end(), t(0));
    }
}
