//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use directory::{ClientName, InstanceId, ObjectTypeId, PowerState};
use serde::Deserialize;

/// Browse and update the clients, object types and instances of a device
/// server.
#[derive(Debug, Parser)]
#[command(name = "devdir", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every sub-command. Each overrides the configuration file.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: `<config dir>/devdir/config.toml`).
    #[arg(long, global = true, env = "DEVDIR_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the device server.
    #[arg(long, global = true, env = "DEVDIR_URL")]
    pub url: Option<String>,

    /// Access key.
    #[arg(long, global = true, env = "DEVDIR_KEY")]
    pub key: Option<String>,

    /// Access secret.
    #[arg(long, global = true, env = "DEVDIR_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "DEVDIR_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// OpenTelemetry collector endpoint; traces are exported when set.
    #[arg(long, global = true, env = "DEVDIR_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the clients connected to the device server.
    Clients,

    /// List the object types a client exposes.
    ObjectTypes {
        /// Client name.
        client: ClientName,
    },

    /// List the instances of an object type.
    Instances {
        /// Client name.
        client: ClientName,
        /// Object type id, e.g. 3312.
        object_type: ObjectTypeId,
    },

    /// Write payload data to an instance.
    Write {
        /// Client name.
        client: ClientName,
        /// Object type id.
        object_type: ObjectTypeId,
        /// Instance id.
        instance: InstanceId,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Switch a Power Control instance on or off.
    Power {
        /// Client name.
        client: ClientName,
        /// Instance id of the Power Control object.
        instance: InstanceId,
        /// Target switch position.
        state: SwitchPosition,
    },
}

impl Command {
    /// Sub-command name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::ObjectTypes { .. } => "object-types",
            Self::Instances { .. } => "instances",
            Self::Write { .. } => "write",
            Self::Power { .. } => "power",
        }
    }
}

/// Payload source for `write`. Without either flag an empty payload is sent.
#[derive(Debug, Default, Args)]
#[group(multiple = false)]
pub struct PayloadArgs {
    /// Payload given inline, e.g. '{"OnOff":true}'.
    #[arg(long)]
    pub data: Option<String>,

    /// Read the payload from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchPosition {
    On,
    Off,
}

impl From<SwitchPosition> for PowerState {
    fn from(position: SwitchPosition) -> Self {
        match position {
            SwitchPosition::On => PowerState::ON,
            SwitchPosition::Off => PowerState::OFF,
        }
    }
}
