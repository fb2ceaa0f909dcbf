use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tle_match::config::{parse_duration, Config};
use tle_match::curve::measurement::{
    doppler_file_stem, import_gr_recording, read_curve_json, write_curve_csv, write_curve_json,
};
use tle_match::curve::MeasurementMetadata;
use tle_match::doppler::{doppler_shift, free_space_path_loss_db, wavelength_m};
use tle_match::matcher::{match_candidates, MatchError, MatchReport};
use tle_match::pipeline::MatchSession;
use tle_match::predict::{GroundStation, Propagator, Sgp4Propagator, TleLoader};
use tle_match::regression::{fit_curve, PolyFit, RegressionSettings};
use tle_match::TleMatchError;

#[derive(Parser)]
#[command(name = "tle-match")]
#[command(about = "Identify a satellite by matching its Doppler curve against TLE predictions")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a GNU Radio float32 Doppler recording to JSON, CSV and a metadata sidecar
    Convert {
        recording: PathBuf,
        /// Leading samples to drop
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Trailing samples to drop
        #[arg(long, default_value_t = 0)]
        stop: usize,
        #[arg(long)]
        rx_center_freq: Option<f64>,
        #[arg(long)]
        gs_callsign: Option<String>,
        #[arg(long)]
        gs_location: Option<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Generate candidate Doppler curves on a measurement's timestamps
    Generate {
        tle_file: PathBuf,
        meas_file: PathBuf,
        meas_md: PathBuf,
        #[arg(long)]
        max_epoch_offset: Option<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Fit a Doppler curve file and print the fit
    Fit {
        curve: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        regression: RegressionArgs,
    },
    /// Match a measurement against every satellite in a TLE file
    Match {
        tle_file: PathBuf,
        meas_file: PathBuf,
        meas_md: PathBuf,
        /// Ignore measured samples within this time of the first one, e.g. "30s"
        #[arg(long)]
        skip: Option<String>,
        #[arg(long)]
        max_epoch_offset: Option<String>,
        #[command(flatten)]
        regression: RegressionArgs,
        /// Write the match report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Rank saved fits. The first entry is the measured curve.
    Rank { fits: PathBuf },
    /// Print look angles, range rate and Doppler for one satellite
    Look {
        tle_file: PathBuf,
        satellite: String,
        /// Start time, RFC 3339
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long, default_value = "10m")]
        duration: String,
        #[arg(long, default_value = "30s")]
        step: String,
    },
    /// Parse a TLE file and list its satellites
    ValidateTle { tle_file: PathBuf },
}

#[derive(Args)]
struct RegressionArgs {
    /// Regression grid points per sample interval
    #[arg(long)]
    interp: Option<u32>,
    /// Highest polynomial degree tried
    #[arg(long)]
    max_degree: Option<usize>,
}

impl RegressionArgs {
    fn apply(&self, mut settings: RegressionSettings) -> RegressionSettings {
        if let Some(interp) = self.interp {
            settings.interp_factor = interp;
        }
        if let Some(max_degree) = self.max_degree {
            settings.max_degree = max_degree;
        }
        settings
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let result = match cli.command {
        Commands::Convert {
            recording,
            start,
            stop,
            rx_center_freq,
            gs_callsign,
            gs_location,
            out_dir,
        } => convert(
            &config,
            &recording,
            start,
            stop,
            rx_center_freq,
            gs_callsign,
            gs_location,
            out_dir,
        ),
        Commands::Generate {
            tle_file,
            meas_file,
            meas_md,
            max_epoch_offset,
            out_dir,
        } => generate(
            &config,
            &tle_file,
            &meas_file,
            &meas_md,
            max_epoch_offset.as_deref(),
            out_dir,
        ),
        Commands::Fit {
            curve,
            name,
            regression,
        } => fit(&config, &curve, name, &regression),
        Commands::Match {
            tle_file,
            meas_file,
            meas_md,
            skip,
            max_epoch_offset,
            regression,
            report,
        } => run_match(
            &config,
            &tle_file,
            &meas_file,
            &meas_md,
            skip.as_deref(),
            max_epoch_offset.as_deref(),
            &regression,
            report.as_deref(),
        ),
        Commands::Rank { fits } => rank(&fits),
        Commands::Look {
            tle_file,
            satellite,
            start,
            duration,
            step,
        } => look(&config, &tle_file, &satellite, start, &duration, &step),
        Commands::ValidateTle { tle_file } => validate_tle(&tle_file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn convert(
    config: &Config,
    recording: &Path,
    start: usize,
    stop: usize,
    rx_center_freq: Option<f64>,
    gs_callsign: Option<String>,
    gs_location: Option<String>,
    out_dir: Option<PathBuf>,
) -> Result<(), TleMatchError> {
    let (name, curve) = import_gr_recording(recording, start, stop)?;
    let station = match config.ground_station()? {
        Some(s) => s,
        None => {
            log::warn!("No station configured, assuming the default ground station");
            GroundStation::default()
        }
    };
    let center = rx_center_freq.unwrap_or(config.receiver.center_freq_hz);

    let metadata = MeasurementMetadata {
        sat_name: name.sat_name.clone(),
        receiver: Some(name.receiver.clone()),
        rx_center_freq: center,
        gs_lat: station.latitude_deg,
        gs_lon: station.longitude_deg,
        gs_alt: station.altitude_m,
        gs_name: config.station.as_ref().and_then(|s| s.name.clone()),
        gs_callsign,
        gs_location,
        samp_rate_str: Some(name.samp_rate_str.clone()),
    };

    let dir = output_dir(out_dir, recording);
    let stem = doppler_file_stem(&name.sat_name, curve.start(), &name.samp_rate_str);
    write_curve_json(&dir.join(format!("{stem}.json")), &curve, Some(center))?;
    write_curve_csv(&dir.join(format!("{stem}.csv")), &curve, Some(center))?;
    metadata.save(&dir.join(format!("{stem}.md")))?;

    println!("Converted {} samples to {}", curve.len(), dir.join(&stem).display());
    Ok(())
}

fn generate(
    config: &Config,
    tle_file: &Path,
    meas_file: &Path,
    meas_md: &Path,
    max_epoch_offset: Option<&str>,
    out_dir: Option<PathBuf>,
) -> Result<(), TleMatchError> {
    let candidates = TleLoader::new(tle_file).load()?;
    let metadata = MeasurementMetadata::from_file(meas_md)?;
    let measured = read_curve_json(meas_file, &metadata.sat_name)?;
    let propagator = propagator(config, max_epoch_offset)?;

    let session = MatchSession::new(
        &propagator,
        metadata.ground_station(),
        metadata.rx_center_freq,
        config.regression,
    );
    let rate = metadata.samp_rate_str.as_deref().unwrap_or("gen");
    let dir = output_dir(out_dir, meas_file);

    let mut written = 0;
    let mut failed = 0;
    for curve in session.generate_all(&candidates, &measured.timestamps()) {
        match curve {
            Ok(curve) => {
                let stem = doppler_file_stem(&curve.name().replace(' ', "-"), curve.start(), rate);
                write_curve_json(&dir.join(format!("{stem}.json")), &curve, None)?;
                write_curve_csv(&dir.join(format!("{stem}.csv")), &curve, None)?;
                written += 1;
            }
            Err(failure) => {
                log::warn!("Skipping {}: {}", failure.candidate, failure.error);
                failed += 1;
            }
        }
    }

    println!("Generated {} curves ({} failed) in {}", written, failed, dir.display());
    Ok(())
}

fn fit(
    config: &Config,
    path: &Path,
    name: Option<String>,
    regression: &RegressionArgs,
) -> Result<(), TleMatchError> {
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let curve = read_curve_json(path, &name)?;
    let fit = fit_curve(&curve, &regression.apply(config.regression))?;
    println!("{}", serde_json::to_string_pretty(&fit)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_match(
    config: &Config,
    tle_file: &Path,
    meas_file: &Path,
    meas_md: &Path,
    skip: Option<&str>,
    max_epoch_offset: Option<&str>,
    regression: &RegressionArgs,
    report_path: Option<&Path>,
) -> Result<(), TleMatchError> {
    let candidates = TleLoader::new(tle_file).load()?;
    let metadata = MeasurementMetadata::from_file(meas_md)?;
    let mut measured = read_curve_json(meas_file, &metadata.sat_name)?;
    if let Some(skip) = skip {
        measured = measured.skip_leading(parse_duration(skip)?)?;
    }
    let propagator = propagator(config, max_epoch_offset)?;

    let session = MatchSession::new(
        &propagator,
        metadata.ground_station(),
        metadata.rx_center_freq,
        regression.apply(config.regression),
    );
    let run = session.run(&measured, &candidates)?;

    print_report(&run.report);
    for failure in &run.failures {
        println!("  {} failed at {}: {}", failure.candidate, failure.stage(), failure.error);
    }
    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&run.report)?)?;
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}

fn rank(path: &Path) -> Result<(), TleMatchError> {
    let content = fs::read_to_string(path)?;
    let fits: Vec<PolyFit> = serde_json::from_str(&content)?;
    let Some((measured, candidates)) = fits.split_first() else {
        return Err(MatchError::EmptyCandidateSet(path.display().to_string()).into());
    };
    print_report(&match_candidates(measured, candidates)?);
    Ok(())
}

fn look(
    config: &Config,
    tle_file: &Path,
    satellite: &str,
    start: DateTime<Utc>,
    duration: &str,
    step: &str,
) -> Result<(), TleMatchError> {
    let candidate = TleLoader::new(tle_file).find(satellite)?;
    let station = config.ground_station()?.unwrap_or_default();
    let propagator = config.propagator()?;
    let duration = parse_duration(duration)?;
    let step = parse_duration(step)?;
    let center = config.receiver.center_freq_hz;
    let wavelength = wavelength_m(center);

    println!(
        "{:<28} {:>8} {:>8} {:>10} {:>10} {:>11} {:>8}",
        "time", "az", "el", "range_km", "rr_m_s", "doppler_hz", "fspl_db"
    );
    let mut t = start;
    while t <= start + duration {
        let sample = propagator.look(&candidate, &station, t)?;
        println!(
            "{:<28} {:>8.2} {:>8.2} {:>10.1} {:>10.1} {:>11.1} {:>8.1}",
            t.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            sample.azimuth_deg,
            sample.elevation_deg,
            sample.range_m / 1000.0,
            sample.range_rate_m_s,
            doppler_shift(center, sample.range_rate_m_s).offset_hz,
            free_space_path_loss_db(sample.range_m, wavelength, 2.0),
        );
        if step <= chrono::Duration::zero() {
            break;
        }
        t += step;
    }
    Ok(())
}

fn validate_tle(path: &Path) -> Result<(), TleMatchError> {
    let candidates = TleLoader::new(path).load()?;
    let propagator = Sgp4Propagator::new();
    println!("TLE file is valid ({} satellites)", candidates.len());
    let mut invalid = 0;
    for (i, candidate) in candidates.iter().enumerate() {
        match propagator.epoch(candidate) {
            Ok(epoch) => println!(
                "  {}: {} (NORAD {}) epoch {}",
                i + 1,
                candidate.name,
                candidate.norad_id,
                epoch
            ),
            Err(e) => {
                println!("  {}: {}", i + 1, e);
                invalid += 1;
            }
        }
    }
    if invalid > 0 {
        println!("{} element sets do not parse", invalid);
    }
    Ok(())
}

fn print_report(report: &MatchReport) {
    println!("Measured: {}", report.measured_name);
    for (i, result) in report.results.iter().enumerate() {
        println!(
            "  {:>3}: {:<28} TCA delta {:>+10.3} s{}",
            i + 1,
            result.candidate_name,
            result.tca_delta_seconds,
            if result.is_best { "  <- best" } else { "" }
        );
    }
    if let Some(margin) = report.margin_seconds {
        println!("Margin to runner-up: {:.3} s", margin);
    }
}

fn propagator(
    config: &Config,
    max_epoch_offset: Option<&str>,
) -> Result<Sgp4Propagator, TleMatchError> {
    Ok(match max_epoch_offset {
        Some(limit) => config.propagator()?.with_max_epoch_offset(parse_duration(limit)?),
        None => config.propagator()?,
    })
}

fn output_dir(out_dir: Option<PathBuf>, input: &Path) -> PathBuf {
    out_dir.unwrap_or_else(|| {
        input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}
