mod settings;

use config::{Config, Environment, File};

use crate::config::settings::PartialSettings;
use crate::utils::error::Result;

pub use settings::{RelaySettings, ServerSettings, Settings};

/// Prefix of the environment variables read by [`load_config`], e.g.
/// `CHATRELAY__SERVER__PORT=2019`.
pub const ENV_PREFIX: &str = "CHATRELAY";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server and relay configurations
pub fn load_config() -> Result<Settings> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
