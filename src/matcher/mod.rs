use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::regression::PolyFit;

#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    #[error("no candidate fits to match {0} against")]
    EmptyCandidateSet(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub measured_name: String,
    pub candidate_name: String,
    /// Measured TCA minus candidate TCA.
    pub tca_delta_seconds: f64,
    pub is_best: bool,
}

/// Candidates ranked by absolute TCA delta, closest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub measured_name: String,
    pub results: Vec<MatchResult>,
    /// How much further the runner-up is from the measured TCA than the best match.
    pub margin_seconds: Option<f64>,
}

impl MatchReport {
    pub fn best(&self) -> &MatchResult {
        &self.results[0]
    }
}

pub fn tca_delta_seconds(measured: DateTime<Utc>, candidate: DateTime<Utc>) -> f64 {
    let delta = measured - candidate;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Ranks `candidates` by how close their TCA lies to the measured one.
/// Equal deltas keep their input order.
pub fn match_candidates(measured: &PolyFit, candidates: &[PolyFit]) -> Result<MatchReport, MatchError> {
    if candidates.is_empty() {
        return Err(MatchError::EmptyCandidateSet(measured.name.clone()));
    }

    let mut results: Vec<MatchResult> = candidates
        .iter()
        .map(|c| MatchResult {
            measured_name: measured.name.clone(),
            candidate_name: c.name.clone(),
            tca_delta_seconds: tca_delta_seconds(measured.tca_timestamp, c.tca_timestamp),
            is_best: false,
        })
        .collect();
    results.sort_by(|a, b| a.tca_delta_seconds.abs().total_cmp(&b.tca_delta_seconds.abs()));
    results[0].is_best = true;

    let margin_seconds = results
        .get(1)
        .map(|runner_up| runner_up.tca_delta_seconds.abs() - results[0].tca_delta_seconds.abs());

    for r in &results {
        log::debug!("{} vs {}: TCA delta {:.3} s", r.measured_name, r.candidate_name, r.tca_delta_seconds);
    }
    log::info!(
        "Matching satellite for {} is {}, TCA delta {:.3} s",
        measured.name,
        results[0].candidate_name,
        results[0].tca_delta_seconds
    );

    Ok(MatchReport {
        measured_name: measured.name.clone(),
        results,
        margin_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 1, 13, 16, 14, 31).unwrap()
    }

    fn fit_at(name: &str, tca: DateTime<Utc>) -> PolyFit {
        PolyFit {
            name: name.to_string(),
            degree: 3,
            coefficients: vec![0.0, 0.0, -1.0, 0.0],
            goodness_of_fit: 0.99,
            index_domain_len: 3000,
            tca_index: 1500.0,
            tca_offset_hz: 0.0,
            tca_timestamp: tca,
        }
    }

    #[test]
    fn closest_tca_wins_and_all_candidates_are_ranked() {
        let measured = fit_at("FOX-1D", t0());
        // Deltas are measured minus candidate.
        let candidates = [
            fit_at("A", t0() - Duration::seconds(5)),
            fit_at("B", t0() + Duration::seconds(2)),
            fit_at("C", t0() - Duration::seconds(100)),
        ];
        let report = match_candidates(&measured, &candidates).unwrap();

        assert_eq!(report.best().candidate_name, "B");
        assert_eq!(report.best().tca_delta_seconds, -2.0);
        let ranked: Vec<_> = report
            .results
            .iter()
            .map(|r| (r.candidate_name.as_str(), r.tca_delta_seconds, r.is_best))
            .collect();
        assert_eq!(
            ranked,
            [("B", -2.0, true), ("A", 5.0, false), ("C", 100.0, false)]
        );
        assert_eq!(report.margin_seconds, Some(3.0));
        assert!(report.results.iter().all(|r| r.measured_name == "FOX-1D"));
    }

    #[test]
    fn ties_go_to_first_seen() {
        let measured = fit_at("FOX-1D", t0());
        let candidates = [
            fit_at("EARLY", t0() - Duration::seconds(3)),
            fit_at("LATE", t0() + Duration::seconds(3)),
        ];
        let report = match_candidates(&measured, &candidates).unwrap();
        assert_eq!(report.best().candidate_name, "EARLY");
        assert_eq!(report.results.iter().filter(|r| r.is_best).count(), 1);
        assert_eq!(report.margin_seconds, Some(0.0));
    }

    #[test]
    fn single_candidate_has_no_margin() {
        let measured = fit_at("FOX-1D", t0());
        let report = match_candidates(&measured, &[fit_at("ONLY", t0())]).unwrap();
        assert!(report.best().is_best);
        assert_eq!(report.margin_seconds, None);
    }

    #[test]
    fn empty_candidate_set_is_an_error() {
        let measured = fit_at("FOX-1D", t0());
        assert_eq!(
            match_candidates(&measured, &[]),
            Err(MatchError::EmptyCandidateSet("FOX-1D".into()))
        );
    }

    #[test]
    fn sub_second_deltas_keep_precision() {
        let delta = tca_delta_seconds(t0() + Duration::microseconds(862_011), t0());
        assert!((delta - 0.862011).abs() < 1e-12);
    }
}
