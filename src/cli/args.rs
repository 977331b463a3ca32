//! CLI argument definitions.

use crate::breakdown::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::warn;

/// Geocode, publish, enrich, and export hosted GIS feature layers.
#[derive(Debug, Parser)]
#[command(name = "gis-cli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Operation to run; the first one given wins.
    #[command(flatten)]
    pub operation: OperationArgs,

    /// Options shared by every operation.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// The five operation flags.
#[derive(Debug, Default, Args)]
pub struct OperationArgs {
    /// Geocode the Address column of a CSV file (-gc).
    #[arg(long = "geocode", value_name = "CSV")]
    pub geocode: Option<PathBuf>,

    /// Publish a .csv, .shp or .zip file as a hosted feature layer (-ufl).
    #[arg(
        long = "upload_feature_layer",
        visible_alias = "upload-feature-layer",
        value_name = "FILE"
    )]
    pub upload_feature_layer: Option<PathBuf>,

    /// Enrich the feature layer with this title with age/race/sex variables.
    #[arg(short = 'e', long = "enrich", value_name = "TITLE")]
    pub enrich: Option<String>,

    /// Download the first layer of this item ID to CSV (-dfl).
    #[arg(
        long = "download_feature_layer",
        visible_alias = "download-feature-layer",
        value_name = "ITEM_ID"
    )]
    pub download_feature_layer: Option<String>,

    /// Print the age/race/sex breakdown of an enrichment CSV (-rb).
    #[arg(
        long = "race_breakdown",
        visible_alias = "race-breakdown",
        value_name = "CSV"
    )]
    pub race_breakdown: Option<PathBuf>,
}

/// Options shared by every operation.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "GIS_CLI_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Credentials file with arcgis_username and arcgis_password.
    #[arg(long, env = "GIS_CLI_KEYS", value_name = "PATH")]
    pub keys: Option<PathBuf>,

    /// Wait for Enter between breakdown cohorts.
    #[arg(long)]
    pub pause: bool,

    /// Breakdown output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Disable progress bars and spinners.
    #[arg(long)]
    pub no_progress: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace including HTTP internals).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// One requested operation and its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Geocode a CSV file.
    Geocode(PathBuf),
    /// Publish a file as a feature layer.
    Upload(PathBuf),
    /// Enrich a layer by title.
    Enrich(String),
    /// Download a layer by item ID.
    Download(String),
    /// Print a breakdown report.
    Breakdown(PathBuf),
}

impl Operation {
    /// Flag that requests this operation.
    pub const fn flag(&self) -> &'static str {
        match self {
            Self::Geocode(_) => "--geocode",
            Self::Upload(_) => "--upload_feature_layer",
            Self::Enrich(_) => "--enrich",
            Self::Download(_) => "--download_feature_layer",
            Self::Breakdown(_) => "--race_breakdown",
        }
    }

    /// The portal operation this stands for, or the input file of a
    /// breakdown, which runs locally.
    pub fn into_remote(self) -> Result<RemoteOperation, PathBuf> {
        match self {
            Self::Geocode(path) => Ok(RemoteOperation::Geocode(path)),
            Self::Upload(path) => Ok(RemoteOperation::Upload(path)),
            Self::Enrich(title) => Ok(RemoteOperation::Enrich(title)),
            Self::Download(item_id) => Ok(RemoteOperation::Download(item_id)),
            Self::Breakdown(path) => Err(path),
        }
    }
}

/// An operation that needs a portal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOperation {
    /// Geocode a CSV file.
    Geocode(PathBuf),
    /// Publish a file as a feature layer.
    Upload(PathBuf),
    /// Enrich a layer by title.
    Enrich(String),
    /// Download a layer by item ID.
    Download(String),
}

impl OperationArgs {
    /// Every requested operation, in dispatch order.
    pub fn requested(&self) -> Vec<Operation> {
        [
            self.geocode.clone().map(Operation::Geocode),
            self.upload_feature_layer.clone().map(Operation::Upload),
            self.enrich.clone().map(Operation::Enrich),
            self.download_feature_layer.clone().map(Operation::Download),
            self.race_breakdown.clone().map(Operation::Breakdown),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// The operation to run: the first requested one. Any others are
    /// ignored with a warning.
    pub fn selected(&self) -> Option<Operation> {
        let mut requested = self.requested().into_iter();
        let first = requested.next()?;
        let ignored: Vec<&str> = requested.map(|op| op.flag()).collect();
        if !ignored.is_empty() {
            warn!(
                "Running {} only; ignoring {}",
                first.flag(),
                ignored.join(", ")
            );
        }
        Some(first)
    }
}

/// Legacy multi-letter short flags and the long flags they stand for.
const LEGACY_FLAGS: [(&str, &str); 4] = [
    ("-gc", "--geocode"),
    ("-ufl", "--upload_feature_layer"),
    ("-dfl", "--download_feature_layer"),
    ("-rb", "--race_breakdown"),
];

/// Rewrite legacy flags such as `-gc` to their long form so clap can
/// parse them. Arguments after `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut after_separator = false;
    args.into_iter()
        .map(|arg| {
            if after_separator {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                after_separator = true;
                return arg;
            }

            let (flag, value) = match text.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (text, None),
            };
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| *legacy == flag)
                .map_or(arg.clone(), |(_, long)| match value {
                    Some(value) => OsString::from(format!("{long}={value}")),
                    None => OsString::from(*long),
                })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let args = normalize_args(args.iter().map(OsString::from));
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_normalize_legacy_flags() {
        let args = normalize_args(
            ["gis-cli", "-gc", "a.csv", "-rb=b.csv", "-e", "Sites", "--", "-dfl"]
                .iter()
                .map(OsString::from),
        );
        assert_eq!(
            args,
            [
                "gis-cli",
                "--geocode",
                "a.csv",
                "--race_breakdown=b.csv",
                "-e",
                "Sites",
                "--",
                "-dfl"
            ]
        );
    }

    #[test]
    fn test_cli_parse_legacy_and_long_forms() {
        let cli = parse(&["gis-cli", "-ufl", "sites.shp"]);
        assert_eq!(
            cli.operation.selected(),
            Some(Operation::Upload(PathBuf::from("sites.shp")))
        );

        let cli = parse(&["gis-cli", "--download-feature-layer", "abc123"]);
        assert_eq!(
            cli.operation.selected(),
            Some(Operation::Download("abc123".to_string()))
        );

        let cli = parse(&["gis-cli", "-e", "Vaccine Sites"]);
        assert_eq!(
            cli.operation.selected(),
            Some(Operation::Enrich("Vaccine Sites".to_string()))
        );
    }

    #[test]
    fn test_first_match_wins() {
        let cli = parse(&["gis-cli", "-rb", "b.csv", "-e", "Sites", "-gc", "a.csv"]);
        assert_eq!(cli.operation.requested().len(), 3);
        assert_eq!(
            cli.operation.selected(),
            Some(Operation::Geocode(PathBuf::from("a.csv")))
        );
    }

    #[test]
    fn test_no_operation() {
        let cli = parse(&["gis-cli"]);
        assert_eq!(cli.operation.selected(), None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_options() {
        let cli = parse(&[
            "gis-cli", "-rb", "b.csv", "--format", "json", "--pause", "-vv", "--no-progress",
        ]);
        assert_eq!(cli.global.format, ReportFormat::Json);
        assert!(cli.global.pause);
        assert!(cli.global.no_progress);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_into_remote_splits_off_breakdown() {
        assert_eq!(
            Operation::Breakdown(PathBuf::from("b.csv")).into_remote(),
            Err(PathBuf::from("b.csv"))
        );
        assert_eq!(
            Operation::Enrich("Sites".to_string()).into_remote(),
            Ok(RemoteOperation::Enrich("Sites".to_string()))
        );
        assert_eq!(
            Operation::Upload(PathBuf::from("a.zip")).into_remote(),
            Ok(RemoteOperation::Upload(PathBuf::from("a.zip")))
        );
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = parse(&["gis-cli", "config", "show"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }
}
