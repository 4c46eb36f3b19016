use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Subcommand};
use linelink_session::{SessionConfig, DEFAULT_BIND_HOST};
use linelink_transport::DEFAULT_PORT;

use crate::exit::{CliError, CliResult, INTERNAL, INTERRUPTED, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one peer and print every message it sends.
    Serve(ServeArgs),
    /// Accept one peer and echo every message back.
    Echo(EchoArgs),
    /// Connect to a server and send one message or table.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Interface to bind.
    #[arg(long, default_value = DEFAULT_BIND_HOST)]
    pub bind: String,
    /// Port to listen on.
    #[arg(long, short = 'p', env = "LINELINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ListenArgs {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_bind_host(self.bind.clone())
            .with_port(self.port)
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub listen: ListenArgs,
    /// Decode every message as a table.
    #[arg(long)]
    pub table: bool,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    #[command(flatten)]
    pub listen: ListenArgs,
    /// Exit after echoing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["data", "file", "table"])))]
pub struct SendArgs {
    /// Server host name or address.
    #[arg(default_value = "127.0.0.1")]
    pub host: String,
    /// Server port.
    #[arg(long, short = 'p', env = "LINELINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Give up connecting after this long (e.g. 10s, 500ms).
    #[arg(
        long,
        env = "LINELINK_CONNECT_TIMEOUT",
        default_value = "10s",
        value_parser = parse_duration
    )]
    pub connect_timeout: Duration,
    /// Raw string payload.
    #[arg(long)]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Table payload: rows separated by ';', cells by ',' (e.g. "1,2;3,4").
    #[arg(long)]
    pub table: Option<String>,
    /// Wait for one reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub wait_timeout: Duration,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Exit with [`INTERRUPTED`] on Ctrl-C.
pub fn install_ctrlc_handler() -> CliResult<()> {
    ctrlc::set_handler(|| {
        tracing::warn!("interrupted");
        std::process::exit(INTERRUPTED);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
