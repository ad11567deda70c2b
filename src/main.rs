//! assemble-vintf CLI
//!
//! Entry point for the `assemble-vintf` command-line tool.

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use assemble_vintf::config::ConfigError;
use assemble_vintf::input::{load_device, load_fragments, load_kernel_inputs, parse_kernel_arg};
use assemble_vintf::render::render;
use assemble_vintf::{
    run, AssembleError, AssembleRequest, EffectiveConfig, OutputFormat, RunOutcome,
    EXIT_INCOMPATIBLE_DEVICE,
};

#[derive(Parser)]
#[command(name = "assemble-vintf")]
#[command(about = "Assemble and check framework compatibility matrices", version)]
struct Cli {
    /// Log merge decisions (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a matrix and write it out
    Assemble {
        #[command(flatten)]
        common: CommonArgs,

        /// Device descriptor to check the assembled matrix against
        #[arg(long, short = 'c')]
        check: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output format: xml or json
        #[arg(long)]
        format: Option<String>,

        /// Write the device check report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check a device descriptor against the assembled matrix
    Check {
        #[command(flatten)]
        common: CommonArgs,

        /// Device descriptor
        #[arg(long, short = 'c')]
        check: PathBuf,

        /// Output the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Matrix fragment files or directories to scan
    #[arg(long = "input", short = 'i', required = true)]
    inputs: Vec<PathBuf>,

    /// Kernel config fragments: VERSION:CFG[:CFG...]
    #[arg(long = "kernel", short = 'k')]
    kernels: Vec<String>,

    /// Target level; defaults to the device's target level when checking
    #[arg(long)]
    level: Option<u32>,

    /// Environment override KEY=VALUE (repeatable)
    #[arg(long = "env")]
    env: Vec<String>,

    /// Config file with [env] and [output] tables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Assemble {
            common,
            check,
            output,
            format,
            report,
        } => run_assemble(&common, check, output, format, report),
        Commands::Check {
            common,
            check,
            json,
        } => run_check(&common, check, json),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_env_overrides(pairs: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "--env".to_string(),
                    value: pair.clone(),
                    reason: "expected KEY=VALUE".to_string(),
                })
        })
        .collect()
}

/// Load every input named on the command line and run the assembler.
fn execute(
    common: &CommonArgs,
    device_path: Option<&PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(EffectiveConfig, RunOutcome), AssembleError> {
    let cli_env = parse_env_overrides(&common.env)?;
    let config = EffectiveConfig::build(
        common.config.as_deref(),
        |key| std::env::var(key).ok(),
        &cli_env,
        format,
    )?;
    for source in &config.sources {
        info!(
            origin = ?source.origin,
            path = source.path.as_deref().unwrap_or("-"),
            sha256 = source.digest.as_deref().unwrap_or("-"),
            "config source"
        );
    }

    let fragments = load_fragments(&common.inputs)?;

    let mut kernel_inputs = Vec::new();
    for arg in &common.kernels {
        let (version, files) = parse_kernel_arg(arg)?;
        kernel_inputs.extend(load_kernel_inputs(version, &files)?);
    }

    let device = device_path.map(|p| load_device(p)).transpose()?;

    let request = AssembleRequest {
        fragments,
        kernel_inputs,
        env: config.env.clone(),
        target_level: common.level,
    };
    let outcome = run(&request, device.as_ref())?;
    Ok((config, outcome))
}

fn run_assemble(
    common: &CommonArgs,
    check: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    report_path: Option<PathBuf>,
) -> Result<i32, AssembleError> {
    let format = format.map(|f| f.parse::<OutputFormat>()).transpose()?;
    let (config, outcome) = execute(common, check.as_ref(), format)?;

    let rendered = render(&outcome.matrix, config.output_format)?;
    match output {
        Some(ref path) => {
            fs::write(path, &rendered)?;
            info!(path = %path.display(), "wrote matrix");
        }
        None => {
            std::io::stdout().write_all(rendered.as_bytes())?;
        }
    }

    let Some(report) = outcome.report else {
        return Ok(0);
    };
    if let Some(ref path) = report_path {
        let json = report.to_json().map_err(assemble_vintf::render::RenderError::from)?;
        fs::write(path, json)?;
    }

    if report.passed {
        return Ok(0);
    }
    if config.env.enforce_vintf_manifest {
        error!(
            failures = report.failure_count,
            "device is not compatible with the assembled matrix"
        );
        Ok(EXIT_INCOMPATIBLE_DEVICE)
    } else {
        warn!(
            failures = report.failure_count,
            "device is not compatible; PRODUCT_ENFORCE_VINTF_MANIFEST is not set, continuing"
        );
        Ok(0)
    }
}

fn run_check(common: &CommonArgs, check: PathBuf, json: bool) -> Result<i32, AssembleError> {
    let (_, outcome) = execute(common, Some(&check), None)?;
    let Some(report) = outcome.report else {
        return Ok(0);
    };

    if json {
        let text = report.to_json().map_err(assemble_vintf::render::RenderError::from)?;
        println!("{}", text);
    } else {
        print!("{}", report.to_human());
    }

    Ok(if report.passed {
        0
    } else {
        EXIT_INCOMPATIBLE_DEVICE
    })
}
