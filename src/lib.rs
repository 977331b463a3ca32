//! gis-cli - geocode, publish, enrich, and export hosted GIS feature layers.
//!
//! Every remote operation runs against a hosted GIS portal through the
//! [`platform::GisPlatform`] trait. The breakdown report is purely local.

#![warn(missing_docs)]

pub mod breakdown;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod output;
pub mod platform;
pub mod table;
pub mod utils;
pub mod workflow;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, GlobalArgs, RemoteOperation};
use config::{Config, config_file_path, load_config, load_credentials, save_config};
use platform::{ArcGisClient, ClientSettings, GisPlatform};
use std::path::Path;
use tracing::{debug, info};
use workflow::{EnrichOptions, GeocodeOptions, UploadKind, UploadOptions};

pub use error::{Error, Result};

/// Main entry point for gis-cli.
pub fn run() -> Result<()> {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet);

    let config_path = cli.global.config.as_deref();

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(command, config_path);
    }

    // No operation flag: nothing to do
    let Some(operation) = cli.operation.selected() else {
        return Ok(());
    };

    let config = load_config(config_path)?;

    let operation = match operation.into_remote() {
        Ok(RemoteOperation::Upload(path)) if UploadKind::from_path(&path).is_none() => {
            workflow::warn_unsupported(&path);
            return Ok(());
        }
        Ok(remote) => remote,
        Err(path) => return run_breakdown(&path, &cli.global),
    };

    let keys_path = cli
        .global
        .keys
        .clone()
        .unwrap_or_else(|| config.portal.credentials_file.clone());
    debug!("Reading credentials from {}", keys_path.display());
    let credentials = load_credentials(&keys_path)?;

    let show_progress = !cli.global.quiet && !cli.global.no_progress;
    let settings = ClientSettings::from_config(&config, show_progress);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })?;

    runtime.block_on(async {
        let client = ArcGisClient::connect(settings, &credentials).await?;
        info!("Signed in as {}", client.username());
        run_operation(&client, operation, &config, show_progress).await
    })
}

/// Run one remote operation against `platform`.
pub async fn run_operation<P: GisPlatform>(
    platform: &P,
    operation: RemoteOperation,
    config: &Config,
    show_progress: bool,
) -> Result<()> {
    match operation {
        RemoteOperation::Geocode(path) => {
            let options = GeocodeOptions {
                source_country: &config.geocode.source_country,
                strategy: config.geocode.strategy,
                output_dir: &config.output.csv_dir,
                show_progress,
            };
            workflow::geocode_csv(platform, &path, &options).await?;
        }
        RemoteOperation::Upload(path) => {
            let options = UploadOptions {
                description: &config.publish.description,
                tags: &config.publish.tags,
                shapefile_dir: &config.output.shapefile_dir,
            };
            workflow::upload_feature_layer(platform, &path, &options).await?;
        }
        RemoteOperation::Enrich(title) => {
            let enrich = &config.enrich;
            let options = EnrichOptions {
                country: &enrich.country,
                data_collection: &enrich.data_collection,
                variables_file: &enrich.variables_file,
                buffer_type: &enrich.buffer_type,
                distance: enrich.distance,
                units: &enrich.units,
                output_prefix: &enrich.output_prefix,
            };
            workflow::enrich_layer_by_title(platform, &title, &options).await?;
        }
        RemoteOperation::Download(item_id) => {
            workflow::download_feature_layer(platform, &item_id, &config.output.csv_dir).await?;
        }
    }
    Ok(())
}

/// Compute and print the breakdown report.
fn run_breakdown(path: &Path, args: &GlobalArgs) -> Result<()> {
    let report = breakdown::compute_breakdown(path)?;
    let stdout = std::io::stdout();
    let stdin = std::io::stdin();
    breakdown::write_report(
        &report,
        args.format,
        args.pause,
        &mut stdout.lock(),
        &mut stdin.lock(),
    )
}

/// Initialize tracing subscriber with verbosity level.
fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // HTTP client internals stay quiet until -vv.
    let filter_str = if quiet {
        "warn".to_string()
    } else {
        match verbose {
            0 => "info,reqwest=warn,hyper=warn,hyper_util=warn".to_string(),
            1 => "debug,reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle subcommands.
fn handle_command(command: Command, config_path: Option<&Path>) -> Result<()> {
    match command {
        Command::Config { action } => handle_config_command(action, config_path),
    }
}

/// Handle config subcommand.
fn handle_config_command(action: ConfigAction, config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                save_config(&config, &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps:");
                println!(
                    "  Put arcgis_username and arcgis_password in {}",
                    config.portal.credentials_file.display()
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(&path))?;
            let text =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("# {}", path.display());
            print!("{text}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
