//! Configuration file loading and merging with command-line overrides.
//!
//! ```toml
//! [server]
//! url = "https://deviceserver.example.com/"
//! key = "..."
//! secret = "..."
//! timeout_secs = 30
//!
//! [logging]
//! format = "json"
//! otlp_endpoint = "http://localhost:4317"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use device_server::SessionConfig;
use serde::Deserialize;

use crate::cli::{GlobalArgs, LogFormat};

const CONFIG_DIR: &str = "devdir";
const CONFIG_FILE: &str = "config.toml";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub url: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub timeout_secs: Option<u64>,
    pub content_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub format: Option<LogFormat>,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub session: SessionConfig,
    pub logging: LoggingSettings,
}

impl FileConfig {
    /// Parses a configuration file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Loads the explicitly named file, or the default file when it exists.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => match default_path() {
                Some(path) if path.is_file() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

/// `<config dir>/devdir/config.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl Settings {
    /// Loads the configuration file named by `args` (or the default one) and
    /// applies the command-line overrides.
    pub fn load(args: &GlobalArgs) -> anyhow::Result<Self> {
        let file = FileConfig::discover(args.config.as_deref())?;
        Self::resolve(file, args)
    }

    /// Merges file values with overrides; overrides win.
    pub fn resolve(file: FileConfig, args: &GlobalArgs) -> anyhow::Result<Self> {
        let FileConfig { server, logging } = file;

        let Some(url) = args.url.clone().or(server.url) else {
            bail!("no device server url configured (use --url, DEVDIR_URL or [server].url)");
        };
        let Some(key) = args.key.clone().or(server.key) else {
            bail!("no access key configured (use --key, DEVDIR_KEY or [server].key)");
        };
        let Some(secret) = args.secret.clone().or(server.secret) else {
            bail!("no access secret configured (use --secret, DEVDIR_SECRET or [server].secret)");
        };

        let mut session = SessionConfig::new(url, key, secret);
        if let Some(timeout_secs) = args.timeout_secs.or(server.timeout_secs) {
            session.timeout_secs = timeout_secs;
        }
        if let Some(content_type) = server.content_type {
            session.content_type = content_type;
        }
        session.validate().context("invalid device server configuration")?;

        Ok(Self {
            session,
            logging: LoggingSettings {
                format: args.log_format.or(logging.format).unwrap_or_default(),
                otlp_endpoint: args.otlp_endpoint.clone().or(logging.otlp_endpoint),
            },
        })
    }
}
