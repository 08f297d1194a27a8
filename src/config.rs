// Copyright (c) 2025 Jan Holthuis <jan.holthuis@rub.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Configuration utils.

use ::config::{builder::DefaultState, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use xdg::BaseDirectories;

/// Encountered when the configuration cannot be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration source could not be read or contains malformed configuration markup.
    #[error("{0}")]
    Load(#[from] ::config::ConfigError),
    /// The configuration could not be serialized.
    #[error("{0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Default configuration TOML string.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Prefix of environment variables that override configuration values, e.g.
/// `DISCOTAG_DISCOGS__MAX_PAGES`.
const ENV_PREFIX: &str = "DISCOTAG";

/// Environment variable that holds the Discogs personal access token.
const DISCOGS_TOKEN_VAR: &str = "DISCOGS_TOKEN";

/// Name of the XDG prefix used for configuration and cache files.
pub const XDG_PREFIX: &str = "discotag";

/// Configuration of the filename pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternConfig {
    /// Template that filename stems are matched against.
    pub template: String,
}

/// Configuration for Discogs lookups.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscogsConfig {
    /// Enrich tags with data from Discogs.
    pub enabled: bool,
    /// Base URL of the Discogs API.
    pub base_url: String,
    /// User agent sent with each request.
    pub user_agent: String,
    /// Personal access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Number of search results per page.
    pub per_page: u32,
    /// Do not fetch more than this number of search result pages.
    pub max_pages: u32,
    /// Number of retries when being rate-limited.
    pub max_retries: u32,
    /// Base delay for exponential backoff when the server does not send `Retry-After`.
    pub retry_base_delay_ms: u64,
    /// Upper limit for the delay before retrying, including delays requested via `Retry-After`.
    pub max_retry_delay_secs: u64,
    /// Timeout for a single request.
    pub request_timeout_secs: u64,
    /// Check the tracklist of candidate releases for the track title.
    pub verify_tracklist: bool,
    /// Do not fetch more than this number of tracklists per track.
    pub max_verifications: usize,
    /// Cache API responses on disk.
    pub cache: bool,
}

impl DiscogsConfig {
    /// Base delay for exponential backoff.
    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Upper limit for the delay before retrying.
    #[must_use]
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_secs(self.max_retry_delay_secs)
    }

    /// Timeout for a single request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for writing tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaggingConfig {
    /// Separator used to join multiple genres or styles.
    pub multi_value_separator: String,
}

/// The main configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Filename pattern configuration.
    pub pattern: PatternConfig,
    /// Discogs lookup configuration.
    pub discogs: DiscogsConfig,
    /// Tagging configuration.
    pub tagging: TaggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::load_default().expect("Failed to load default config")
    }
}

/// Path of the user configuration file, if it exists.
fn default_config_path() -> Option<PathBuf> {
    BaseDirectories::with_prefix(XDG_PREFIX).find_config_file("config.toml")
}

impl Config {
    /// Configuration builder with the embedded defaults as its first source.
    fn builder() -> ConfigBuilder<DefaultState> {
        ::config::Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Load the default configuration.
    fn load_default() -> Result<Self, ConfigError> {
        let config = Self::builder().build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load the configuration from a file located at the given path, merged with the default
    /// values.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if it contains malformed
    /// configuration markup.
    pub fn load_from_path<T: AsRef<Path>>(path: T) -> crate::Result<Self> {
        let config = Self::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()
            .and_then(::config::Config::try_deserialize)
            .map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load the effective configuration.
    ///
    /// Values are taken from (in ascending order of precedence) the embedded defaults, the
    /// configuration file at `path` (or the user's configuration file if no path is given),
    /// `DISCOTAG_<SECTION>__<KEY>` environment variables and the `DISCOGS_TOKEN` environment
    /// variable.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if any source contains malformed
    /// configuration values.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let config = Self::load_layered(path.as_deref(), None)?;
        Ok(config)
    }

    /// Load the layered configuration. If `environment` is `None`, the process environment is
    /// used.
    fn load_layered(
        path: Option<&Path>,
        environment: Option<::config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(path) = path {
            log::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let discogs_token = environment
            .as_ref()
            .map_or_else(
                || env::var(DISCOGS_TOKEN_VAR).ok(),
                |vars| vars.get(DISCOGS_TOKEN_VAR).cloned(),
            )
            .filter(|token| !token.trim().is_empty());

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(environment),
            )
            .set_override_option("discogs.token", discogs_token)?
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Serialize the configuration as TOML. The Discogs token is redacted.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> crate::Result<String> {
        let mut config = self.clone();
        if config.discogs.token.is_some() {
            config.discogs.token = Some("<redacted>".to_string());
        }
        let text = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
        Ok(text)
    }
}
