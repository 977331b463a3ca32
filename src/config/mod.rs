//! Configuration loading and management.

mod credentials;
mod file;
mod paths;
mod types;
mod validate;

pub use credentials::{Credentials, load_credentials};
pub use file::{load_config, load_config_file, load_default_config, save_config};
pub use paths::{config_dir, config_file_path};
pub use types::{
    Config, DownloadConfig, EnrichConfig, GeocodeConfig, GeocodeStrategy, HttpConfig,
    OutputConfig, PortalConfig, PublishConfig,
};
pub use validate::validate_config;
