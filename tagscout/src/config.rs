use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::CredentialStore;
use crate::errors::{TagScoutError, TagScoutResult};
use crate::search::{SearchOptions, DEFAULT_FAN_OUT_THRESHOLD, DEFAULT_POOL_CAPACITY};

/// Configuration for the CLI and the REST server.
///
/// # Configuration Locations
///
/// Sources are merged in order, later ones winning:
/// 1. Global `$HOME/.config/tagscout/config.yaml`
/// 2. Local `.tagscout.yaml` in the current directory
/// 3. File given with `--config` (must exist)
///
/// Command-line flags are applied on top with [`TagScoutConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Tree used by `walk`, `paths` and `search`
/// graph_path: "input_graph.json"
///
/// # Tree served by `serve`
/// tags_path: "input_tags.json"
///
/// # REST server address
/// bind: "localhost"
/// port: 8080
///
/// # Accepted API tokens
/// tokens: ["XXX", "YYY"]
///
/// # Search tuning
/// pool_capacity: 10
/// fan_out_threshold: 10
///
/// # Seconds before an HTTP request is abandoned
/// request_timeout_secs: 60
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagScoutConfig {
    /// Tree read by `walk`, `paths` and `search`
    #[serde(default = "default_graph_path")]
    pub graph_path: PathBuf,

    /// Tree served over HTTP
    #[serde(default = "default_tags_path")]
    pub tags_path: PathBuf,

    /// Host the server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Tokens accepted by the `taggedContent` endpoint
    #[serde(default = "default_tokens")]
    pub tokens: Vec<String>,

    /// Worker threads per search
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: NonZeroUsize,

    /// Child count at which a node's children are searched in parallel
    #[serde(default = "default_fan_out_threshold")]
    pub fan_out_threshold: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_graph_path() -> PathBuf {
    PathBuf::from("input_graph.json")
}

fn default_tags_path() -> PathBuf {
    PathBuf::from("input_tags.json")
}

fn default_bind() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_tokens() -> Vec<String> {
    vec!["XXX".to_string(), "YYY".to_string()]
}

fn default_pool_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_POOL_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_fan_out_threshold() -> usize {
    DEFAULT_FAN_OUT_THRESHOLD
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TagScoutConfig {
    fn default() -> Self {
        Self {
            graph_path: default_graph_path(),
            tags_path: default_tags_path(),
            bind: default_bind(),
            port: default_port(),
            tokens: default_tokens(),
            pool_capacity: default_pool_capacity(),
            fan_out_threshold: default_fan_out_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub input: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub pool_capacity: Option<NonZeroUsize>,
    pub fan_out_threshold: Option<usize>,
    pub log_level: Option<String>,
}

impl TagScoutConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an explicit file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("tagscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".tagscout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    ///
    /// `input` replaces whichever tree path the command reads; the caller
    /// picks it with `serving`.
    pub fn merge_with_cli(mut self, cli: CliOverrides, serving: bool) -> Self {
        if let Some(input) = cli.input {
            if serving {
                self.tags_path = input;
            } else {
                self.graph_path = input;
            }
        }
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(capacity) = cli.pool_capacity {
            self.pool_capacity = capacity;
        }
        if let Some(threshold) = cli.fan_out_threshold {
            self.fan_out_threshold = threshold;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            pool_capacity: self.pool_capacity,
            fan_out_threshold: self.fan_out_threshold,
        }
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(self.tokens.iter().cloned())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves `bind:port`, accepting host names such as `localhost`
    pub fn socket_addr(&self) -> TagScoutResult<SocketAddr> {
        let display = format!("{}:{}", self.bind, self.port);
        (self.bind.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| TagScoutError::invalid_address(format!("{} ({})", display, e)))?
            .next()
            .ok_or_else(|| TagScoutError::invalid_address(display))
    }
}
