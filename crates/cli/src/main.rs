//! `devdir` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags and environment variables
//!    layered over `<config dir>/devdir/config.toml` (see [`config`]).
//! 2. **Wire observability**: `tracing-subscriber` with a pretty or JSON
//!    layer on stderr, plus an OpenTelemetry OTLP exporter when an endpoint is
//!    configured (see [`telemetry`]).
//! 3. **Construct infrastructure**: open a `device_server::HttpSession` and
//!    hand it to a `directory::DeviceDirectoryClient`.
//! 4. **Dispatch** the selected sub-command (see [`commands`]).

mod cli;
mod commands;
mod config;
mod telemetry;

use clap::Parser;
use directory::InvocationId;
use tracing::{info_span, Instrument};

use crate::cli::Cli;
use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { global, command } = Cli::parse();

    let settings = Settings::load(&global)?;
    let _telemetry = telemetry::init(&settings.logging)?;

    let invocation = InvocationId::new_random();
    let span = info_span!("devdir", %invocation, command = command.name());
    commands::run(command, &settings.session)
        .instrument(span)
        .await
}
