use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use pulsetrack::config::AppConfig;
use pulsetrack::export::{
    breakdown_table, export_json, history_table, strain_report, zones_table,
};
use pulsetrack::history::HistoryAnalyzer;
use pulsetrack::import::{load_recovery_inputs, load_samples, load_sets, load_summaries};
use pulsetrack::ingest::IngestPayload;
use pulsetrack::logging::init_logging;
use pulsetrack::recovery::{
    get_recovery_label, get_recovery_recommendation, RecoveryCalculator, RecoveryLevel,
};
use pulsetrack::strain::StrainCalculator;
use pulsetrack::zones::ZoneCalculator;
use pulsetrack::{ErrorSeverity, PulseError};

/// PulseTrack - Strain and Recovery Scoring CLI
///
/// Scores daily physiological load on a 0-21 scale from heart rate and
/// resistance training, and readiness on a 1-99 scale from HRV, resting
/// heart rate, sleep and yesterday's strain.
#[derive(Parser)]
#[command(name = "pulsetrack")]
#[command(version)]
#[command(about = "Strain and recovery scoring CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show heart rate reserve zones
    Zones {
        /// Age in years (defaults to the configured profile)
        #[arg(short, long)]
        age: Option<u8>,

        /// Resting heart rate in bpm
        #[arg(short, long)]
        resting_hr: Option<u16>,

        /// Highest measured heart rate in bpm
        #[arg(short, long)]
        max_hr: Option<u16>,
    },

    /// Calculate the day's strain score
    Strain {
        /// Heart rate samples (CSV or JSON)
        #[arg(short, long)]
        samples: PathBuf,

        /// Resistance sets (CSV or JSON)
        #[arg(long)]
        sets: Option<PathBuf>,

        /// Age in years
        #[arg(short, long)]
        age: Option<u8>,

        /// Resting heart rate in bpm
        #[arg(short, long)]
        resting_hr: Option<u16>,

        /// Highest measured heart rate in bpm
        #[arg(short, long)]
        max_hr: Option<u16>,

        /// Average heart rate during the resistance workout
        #[arg(long)]
        avg_hr: Option<f64>,

        /// Personal intensity factor
        #[arg(long)]
        personal_factor: Option<f64>,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Calculate the recovery score from a JSON inputs file
    Recovery {
        /// Recovery inputs (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a daily biometric upload
    Ingest {
        /// Payload file (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Write the normalized record as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score recovery for each day of stored summaries
    History {
        /// Daily summaries (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Only score this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Write the results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (KEY=VALUE)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    // A missing --config file is fine; `config --init` or `--set` will create it
    let config = match &cli.config {
        Some(path) if path.exists() => AppConfig::load_from_file(path)?,
        Some(_) => AppConfig::default(),
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    let result = run(cli.command, config, &config_path);

    if let Err(err) = &result {
        if let Some(pulse_err) = err.downcast_ref::<PulseError>() {
            match pulse_err.severity() {
                ErrorSeverity::Warning => warn!(error = %pulse_err, "Input rejected"),
                ErrorSeverity::Error | ErrorSeverity::Critical => {
                    error!(error = %pulse_err, "Command failed")
                }
            }
            eprintln!("{}", pulse_err.user_message().red());
        }
    }

    result
}

fn run(command: Commands, config: AppConfig, config_path: &Path) -> Result<()> {
    match command {
        Commands::Zones {
            age,
            resting_hr,
            max_hr,
        } => {
            let age = age.unwrap_or(config.profile.age);
            let resting_hr = resting_hr.unwrap_or(config.profile.resting_hr);
            let max_hr = ZoneCalculator::effective_max_hr(age, max_hr.or(config.profile.max_hr));
            let zones = ZoneCalculator::calculate_hr_zones(max_hr, resting_hr);

            println!(
                "{}",
                format!("Heart rate zones (max {} bpm, resting {} bpm)", max_hr, resting_hr)
                    .blue()
                    .bold()
            );
            println!("{}", zones_table(&zones));
        }

        Commands::Strain {
            samples,
            sets,
            age,
            resting_hr,
            max_hr,
            avg_hr,
            personal_factor,
            output,
        } => {
            let mut settings = config.profile.clone();
            settings.age = age.unwrap_or(settings.age);
            settings.resting_hr = resting_hr.unwrap_or(settings.resting_hr);
            settings.max_hr = max_hr.or(settings.max_hr);
            settings.personal_factor = personal_factor.unwrap_or(settings.personal_factor);

            let samples = load_samples(&samples)?;
            let sets = match sets {
                Some(path) => load_sets(&path)?,
                None => Vec::new(),
            };

            let calculator = StrainCalculator::with_config(config.strain.clone());
            let result = calculator.calculate_strain_score(
                &samples,
                &sets,
                &settings.strain_profile(),
                avg_hr,
            );
            info!(score = result.score, "Strain calculated");

            println!("{}", "Daily strain".green().bold());
            println!("{}", strain_report(&result));

            if let Some(path) = output {
                export_json(&result, &path)?;
                println!("{}", format!("✓ Saved to {}", path.display()).green());
            }
        }

        Commands::Recovery { input, output } => {
            let inputs = load_recovery_inputs(&input)?;
            let calculator = RecoveryCalculator::with_config(config.recovery.clone());
            let result = calculator.calculate_recovery(&inputs);
            info!(score = result.score, "Recovery calculated");

            let headline = format!(
                "Recovery: {}% ({})",
                result.score,
                get_recovery_label(result.score)
            );
            let headline = match RecoveryLevel::from_score(result.score) {
                RecoveryLevel::Green => headline.green(),
                RecoveryLevel::Yellow => headline.yellow(),
                RecoveryLevel::Red => headline.red(),
            };
            println!("{}", headline.bold());
            println!("{}", get_recovery_recommendation(result.score));
            println!("Data completeness: {}%", result.data_completeness);
            println!("{}", breakdown_table(&result.breakdown));

            if let Some(path) = output {
                export_json(&result, &path)?;
                println!("{}", format!("✓ Saved to {}", path.display()).green());
            }
        }

        Commands::Ingest { file, output } => {
            let body = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read payload: {}", file.display()))?;
            let record = IngestPayload::from_json(&body)
                .and_then(|payload| payload.validate(Utc::now()))
                .map_err(PulseError::from)?;
            info!(date = %record.date, samples = record.samples.len(), "Payload accepted");

            println!("{}", format!("✓ Payload for {} is valid", record.date).green().bold());
            println!("{}", serde_json::to_string_pretty(&record)?);

            if let Some(path) = output {
                export_json(&record, &path)?;
            }
        }

        Commands::History { file, date, output } => {
            let summaries = load_summaries(&file)?;
            let analyzer: HistoryAnalyzer = config.history_analyzer();

            let scored = match date {
                Some(date) => {
                    let index = HistoryAnalyzer::index(&summaries);
                    if !index.contains_key(&date) {
                        bail!("No summary for {} in {}", date, file.display());
                    }
                    vec![analyzer.score_day(date, &index)]
                }
                None => analyzer.score_all(&summaries),
            };
            info!(days = scored.len(), "History scored");

            println!("{}", "Recovery history".cyan().bold());
            println!("{}", history_table(&scored));

            if let Some(path) = output {
                export_json(&scored, &path)?;
                println!("{}", format!("✓ Saved to {}", path.display()).green());
            }
        }

        Commands::Config {
            list,
            set,
            get,
            init,
        } => {
            let mut config = config;

            if init {
                if config_path.exists() {
                    bail!("Config file already exists: {}", config_path.display());
                }
                AppConfig::default().save_to_file(config_path)?;
                println!(
                    "{}",
                    format!("✓ Wrote default config to {}", config_path.display()).green()
                );
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected KEY=VALUE, got {}", key_value))?;
                config.set(key.trim(), value.trim())?;
                config.save_to_file(config_path)?;
                println!("{}", format!("✓ {} = {}", key.trim(), config.get(key.trim())?).green());
            } else if let Some(key) = get {
                println!("{}", config.get(&key)?);
            } else if list {
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("Use --list, --get KEY, --set KEY=VALUE or --init");
            }
        }
    }

    Ok(())
}
