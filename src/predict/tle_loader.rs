use std::fs;
use std::path::{Path, PathBuf};

use crate::predict::error::PredictError;
use crate::predict::types::SatelliteCandidate;

/// Reads candidate satellites from a TLE file, keeping file order.
pub struct TleLoader {
    path: PathBuf,
}

impl TleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<SatelliteCandidate>, PredictError> {
        if !self.path.is_file() {
            return Err(PredictError::FileNotFound(self.path.display().to_string()));
        }

        log::info!("Importing TLE data from: {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        let candidates = parse_candidates(&content);

        if candidates.is_empty() {
            return Err(PredictError::NoSatellites(self.path.display().to_string()));
        }
        log::info!("Found {} satellites", candidates.len());
        Ok(candidates)
    }

    /// Loads the file and picks one satellite by name.
    pub fn find(&self, name: &str) -> Result<SatelliteCandidate, PredictError> {
        self.load()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PredictError::SatelliteNotFound {
                satellite: name.to_string(),
                path: self.path.display().to_string(),
            })
    }
}

/// Parses 2- and 3-line element sets. Unnamed sets are named after their catalog number.
pub fn parse_candidates(content: &str) -> Vec<SatelliteCandidate> {
    parse_multi_tle(content)
        .into_iter()
        .map(|(name, line1, line2)| {
            let mut candidate = SatelliteCandidate::new(name.unwrap_or_default(), line1, line2);
            if candidate.name.is_empty() {
                candidate.name = format!("NORAD {}", candidate.norad_id);
            }
            candidate
        })
        .collect()
}

fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            let name = lines[i].strip_prefix("0 ").unwrap_or(lines[i]).trim();
            result.push((
                Some(name.to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            log::warn!("Skipping unrecognised TLE line: {}", lines[i]);
            i += 1;
        }
    }

    result
}
