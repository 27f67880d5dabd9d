//! Markov calibration CLI.
//!
//! Loads clinical inputs, derives hazards and builds per-arm parameter
//! sets for the stroke cohort model:
//! - `calibrate`: full pipeline, one report per invocation
//! - `rates`: derived annual hazards only
//! - `check`: validate the inputs without calibrating
//! - `schema`: JSON Schema of clinical.json

use clap::{Args, Parser, Subcommand};
use mc_common::{
    format_error_human, HealthState, OutputFormat, StructuredError, Therapy, SCHEMA_VERSION,
};
use mc_config::ClinicalInputs;
use mc_core::calibrate::{calibrate, CalibrationError, ClinicalHazards};
use mc_core::config::{load_inputs, ConfigOptions, LoadedInputs};
use mc_core::exit_codes::ExitCode;
use mc_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};

/// Markov cohort-model calibration
#[derive(Parser)]
#[command(name = "mc-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to clinical.json
    #[arg(long, short = 'i', global = true)]
    inputs: Option<PathBuf>,

    /// Override config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build parameter sets for one or more therapy arms
    Calibrate(CalibrateArgs),

    /// Print the annual hazard rates derived from the inputs
    Rates,

    /// Validate the inputs file and print its snapshot
    Check,

    /// Print the JSON Schema of clinical.json
    Schema,

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct CalibrateArgs {
    /// Arm to calibrate (repeatable; default: every arm)
    #[arg(long, short = 't', value_enum)]
    therapy: Vec<Therapy>,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let result = match &cli.command {
        Commands::Calibrate(args) => run_calibrate(&cli.global, args),
        Commands::Rates => run_rates(&cli.global),
        Commands::Check => run_check(&cli.global),
        Commands::Schema => run_schema(),
        Commands::Version => run_version(&cli.global),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => output_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn load(global: &GlobalOpts) -> Result<LoadedInputs, mc_common::Error> {
    let options = ConfigOptions {
        inputs_path: global.inputs.clone(),
        config_dir: global.config.clone(),
    };
    Ok(load_inputs(&options)?)
}

fn run_calibrate(global: &GlobalOpts, args: &CalibrateArgs) -> Result<(), mc_common::Error> {
    let loaded = load(global)?;
    let therapies: Vec<Therapy> = if args.therapy.is_empty() {
        Therapy::ALL.to_vec()
    } else {
        args.therapy.clone()
    };

    let run_id = generate_run_id();
    info!(%run_id, arms = therapies.len(), source = %loaded.resolved.source, "calibration started");

    let report = calibrate(&loaded.inputs, &therapies)?
        .with_run_id(&run_id)
        .with_config(loaded.snapshot);

    match global.format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Md => print!("{}", report.to_markdown()),
        OutputFormat::Summary => println!("{}", report.summary_line()),
    }
    info!(%run_id, regularized = report.regularized_arms(), "calibration finished");
    Ok(())
}

fn run_rates(global: &GlobalOpts) -> Result<(), mc_common::Error> {
    let loaded = load(global)?;
    let hazards = ClinicalHazards::from_inputs(&loaded.inputs.hazards)
        .map_err(CalibrationError::from)?;

    match global.format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "hazards": hazards,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Md => {
            let generator = hazards.generator().map_err(CalibrationError::from)?;
            println!("| From | To | Rate (per year) |\n|---|---|---|");
            for from in HealthState::ALL {
                for to in HealthState::ALL {
                    let rate = generator.rate(from, to);
                    if from != to && rate > 0.0 {
                        println!("| {} | {} | {:.6} |", from, to, rate);
                    }
                }
            }
        }
        OutputFormat::Summary => println!(
            "first stroke {:.6}/yr, recurrence {:.6}/yr, background mortality {:.6}/yr",
            hazards.first_stroke, hazards.recurrence, hazards.background_mortality
        ),
    }
    Ok(())
}

fn run_check(global: &GlobalOpts) -> Result<(), mc_common::Error> {
    let loaded = load(global)?;
    debug!(hash = %loaded.snapshot.effective_hash, "inputs valid");

    match global.format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "valid": true,
                "snapshot": loaded.snapshot,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Md | OutputFormat::Summary => println!(
            "inputs valid: {} ({}), snapshot {}",
            loaded
                .resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string()),
            loaded.resolved.source,
            loaded.snapshot.short_id()
        ),
    }
    Ok(())
}

fn run_schema() -> Result<(), mc_common::Error> {
    println!("{}", serde_json::to_string_pretty(&ClinicalInputs::json_schema())?);
    Ok(())
}

fn run_version(global: &GlobalOpts) -> Result<(), mc_common::Error> {
    match global.format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "inputs_schema_version": mc_config::CONFIG_SCHEMA_VERSION,
                "mc_core_version": env!("CARGO_PKG_VERSION"),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            println!("mc-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
    Ok(())
}

/// JSON errors go to stdout for agents; everything else to stderr.
fn output_error(global: &GlobalOpts, err: &mc_common::Error) -> ExitCode {
    let code = ExitCode::from(err);
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err).with_context("exit_code", code.code_name());
            println!("{}", structured.to_json_pretty());
        }
        _ => {
            let color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, color));
        }
    }
    code
}
