use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

use crate::curve::{generate_curve, Curve, GenerateError};
use crate::error::TleMatchError;
use crate::matcher::{match_candidates, MatchReport};
use crate::predict::{GroundStation, Propagator, SatelliteCandidate};
use crate::regression::{fit_curve, PolyFit, RegressionError, RegressionSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generate,
    Fit,
}

#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Fit(#[from] RegressionError),
}

impl CandidateError {
    pub fn stage(&self) -> Stage {
        match self {
            CandidateError::Generate(_) => Stage::Generate,
            CandidateError::Fit(_) => Stage::Fit,
        }
    }
}

/// A candidate that dropped out of the run, and why.
#[derive(Debug)]
pub struct CandidateFailure {
    pub candidate: String,
    pub error: CandidateError,
}

impl CandidateFailure {
    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}

#[derive(Debug)]
pub struct MatchRun {
    pub measured: PolyFit,
    pub candidates: Vec<PolyFit>,
    pub failures: Vec<CandidateFailure>,
    pub report: MatchReport,
}

/// Everything that stays fixed while candidates are compared against one measurement.
pub struct MatchSession<'a, P: Propagator + ?Sized> {
    propagator: &'a P,
    station: GroundStation,
    center_freq_hz: f64,
    settings: RegressionSettings,
}

impl<'a, P: Propagator + ?Sized> MatchSession<'a, P> {
    pub fn new(
        propagator: &'a P,
        station: GroundStation,
        center_freq_hz: f64,
        settings: RegressionSettings,
    ) -> Self {
        Self {
            propagator,
            station,
            center_freq_hz,
            settings,
        }
    }

    pub fn generate(
        &self,
        candidate: &SatelliteCandidate,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Curve, GenerateError> {
        generate_curve(
            self.propagator,
            candidate,
            &self.station,
            timestamps,
            self.center_freq_hz,
        )
    }

    /// Generates and fits one candidate's curve.
    pub fn fit_candidate(
        &self,
        candidate: &SatelliteCandidate,
        timestamps: &[DateTime<Utc>],
    ) -> Result<PolyFit, CandidateError> {
        let curve = self.generate(candidate, timestamps)?;
        Ok(fit_curve(&curve, &self.settings)?)
    }

    /// Curves for all candidates, computed in parallel and returned in input order.
    pub fn generate_all(
        &self,
        candidates: &[SatelliteCandidate],
        timestamps: &[DateTime<Utc>],
    ) -> Vec<Result<Curve, CandidateFailure>> {
        candidates
            .par_iter()
            .map(|c| {
                self.generate(c, timestamps).map_err(|e| CandidateFailure {
                    candidate: c.name.clone(),
                    error: e.into(),
                })
            })
            .collect()
    }

    /// Fits all candidates in parallel. Failed candidates are reported, not fatal.
    pub fn fit_candidates(
        &self,
        candidates: &[SatelliteCandidate],
        timestamps: &[DateTime<Utc>],
    ) -> (Vec<PolyFit>, Vec<CandidateFailure>) {
        let results: Vec<Result<PolyFit, CandidateFailure>> = candidates
            .par_iter()
            .map(|c| {
                self.fit_candidate(c, timestamps)
                    .map_err(|error| CandidateFailure {
                        candidate: c.name.clone(),
                        error,
                    })
            })
            .collect();

        let mut fits = Vec::new();
        let mut failures = Vec::new();
        for res in results {
            match res {
                Ok(fit) => fits.push(fit),
                Err(failure) => {
                    log::warn!(
                        "Skipping {} ({} failed): {}",
                        failure.candidate,
                        failure.stage(),
                        failure.error
                    );
                    failures.push(failure);
                }
            }
        }
        (fits, failures)
    }

    /// Fits the measured curve, fits every candidate on the measured timestamps and
    /// ranks the candidates by TCA delta.
    pub fn run(
        &self,
        measured: &Curve,
        candidates: &[SatelliteCandidate],
    ) -> Result<MatchRun, TleMatchError> {
        let measured_fit = fit_curve(measured, &self.settings)?;
        let (fits, failures) = self.fit_candidates(candidates, &measured.timestamps());
        log::info!(
            "{} of {} candidates fitted",
            fits.len(),
            candidates.len()
        );
        let report = match_candidates(&measured_fit, &fits)?;

        Ok(MatchRun {
            measured: measured_fit,
            candidates: fits,
            failures,
            report,
        })
    }
}
