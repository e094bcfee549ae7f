//! The `config` module loads the consumer's settings.
//!
//! Sources are layered: an optional TOML file (`config/default` unless another
//! path is given), then `MAGSTORE__`-prefixed environment variables with `__`
//! between sections, e.g. `MAGSTORE__AMQP__URL`. Missing keys fall back to
//! `Settings::default()`.

mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{AmqpSettings, LogSettings, Settings, ShutdownSettings, StorageSettings};

pub const DEFAULT_CONFIG_FILE: &str = "config/default";
pub const ENV_PREFIX: &str = "MAGSTORE";

/// Loads the configuration from the default file and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

/// Loads the configuration from `path` (extension optional) and environment
/// variables, merged over the defaults.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        amqp: AmqpSettings {
            url: partial
                .amqp
                .as_ref()
                .and_then(|a| a.url.clone())
                .unwrap_or(default.amqp.url),
        },
        storage: StorageSettings {
            path: partial
                .storage
                .as_ref()
                .and_then(|s| s.path.clone())
                .unwrap_or(default.storage.path),
        },
        shutdown: ShutdownSettings {
            grace_secs: partial
                .shutdown
                .as_ref()
                .and_then(|s| s.grace_secs)
                .unwrap_or(default.shutdown.grace_secs),
        },
        log: LogSettings {
            level: partial
                .log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
    })
}

#[cfg(test)]
mod tests;
