use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use site_scout::config::{load_config, validate_config, Config};
use site_scout::grid::{find_optimal_zones, SearchOptions, ZoneRequest};
use site_scout::live::{install_crypto_provider, segments_from_geojson, LiveSignalSampler};
use site_scout::metrics::RawZoneMetrics;
use site_scout::output::{
    format_zone_detail, format_zone_table, should_use_colors, to_report_json, write_output,
};
use site_scout::scoring::get_layer_weights;
use site_scout::traffic::{fuse_traffic, TrafficInputs};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank candidate zones around a target location
    Zones {
        /// Zone request JSON (center, target_radius_miles, demographics, competitors, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Active map layers used to derive weights, e.g. demographics,competition
        #[arg(long, value_delimiter = ',')]
        layers: Option<Vec<String>>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute derived, normalized metrics for one zone
    Metrics {
        /// Raw zone metrics JSON
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fuse DOT and activity traffic signals for a location
    Traffic {
        /// Traffic inputs JSON (location, dot, google)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Enrich road segments with sampled live congestion
    Sample {
        /// Road segments as GeoJSON
        #[arg(short, long)]
        input: PathBuf,

        /// Overall time limit for the sampling run, e.g. "30s"
        #[arg(long, value_parser = humantime::parse_duration)]
        deadline: Option<Duration>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "site-scout")]
#[command(about = "Business site selection scoring CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/site-scout/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file at {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON input in {}", path.display()))
}

fn run_zones(
    config: &Config,
    input: &Path,
    layers: Option<Vec<String>>,
    format: OutputFormat,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let scoring = config.scoring();
    let mut request: ZoneRequest = read_json(input)?;
    if request.business_type.is_none() {
        request.business_type = scoring.business_type.clone();
    }

    let mut options = SearchOptions::from_config(&scoring);
    if let Some(layers) = layers {
        options.weights = get_layer_weights(&layers);
    }

    let start_time = Instant::now();
    let zones = find_optimal_zones(&request, &options);
    log::debug!("Scored zones in {:?}", start_time.elapsed());

    let text = match format {
        OutputFormat::Json => to_report_json(&zones)?,
        OutputFormat::Table => {
            // Never write color codes to a file
            let use_colors = output.is_none() && should_use_colors();
            if verbose {
                zones
                    .iter()
                    .map(|zone| format_zone_detail(zone, use_colors))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            } else {
                format_zone_table(&zones, use_colors)
            }
        }
    };
    write_output(output, &text)
}

fn run_metrics(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw: RawZoneMetrics = read_json(input)?;
    let result = site_scout::metrics::calculate(&raw);
    write_output(output, &to_report_json(&result)?)
}

fn run_traffic(input: &Path, output: Option<&Path>) -> Result<()> {
    let inputs: TrafficInputs = read_json(input)?;
    let result = fuse_traffic(&inputs.location, inputs.dot.as_ref(), inputs.google.as_ref());
    if result.is_placeholder {
        log::warn!("No traffic data available; returning a synthetic placeholder estimate");
    }
    write_output(output, &to_report_json(&result)?)
}

/// Returns true when sampling ran but every query failed
async fn run_sample(
    config: &Config,
    input: &Path,
    deadline: Option<Duration>,
    output: Option<&Path>,
) -> Result<bool> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read segments file at {}", input.display()))?;
    let segments = segments_from_geojson(&text)?;
    log::info!("Loaded {} road segments from {}", segments.len(), input.display());

    let sampler = LiveSignalSampler::from_config(&config.live_sampling());
    let deadline = deadline.map(|d| tokio::time::Instant::now() + d);
    let report = sampler.enrich(&segments, deadline).await;

    write_output(output, &to_report_json(&report)?)?;
    Ok(report.enabled && report.succeeded == 0 && report.failed > 0)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Install rustls crypto provider (required for rustls 0.23+)
    install_crypto_provider();

    let config = match load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let result = match cli.command {
        Commands::Zones {
            input,
            layers,
            format,
            output,
        } => run_zones(&config, &input, layers, format, output.as_deref(), cli.verbose),
        Commands::Metrics { input, output } => run_metrics(&input, output.as_deref()),
        Commands::Traffic { input, output } => run_traffic(&input, output.as_deref()),
        Commands::Sample {
            input,
            deadline,
            output,
        } => match run_sample(&config, &input, deadline, output.as_deref()).await {
            Ok(true) => {
                eprintln!("All live congestion queries failed. Check your network connection and API key.");
                std::process::exit(EXIT_NETWORK);
            }
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(EXIT_CONFIG);
    }

    std::process::exit(EXIT_SUCCESS);
}
