#![forbid(unsafe_code)]

//! `splitlink`: command-line client for a LiveSplit Server style endpoint.
//!
//! Loads configuration, connects, and either sends one command, polls a
//! query on an interval, or pipes commands from stdin.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use splitlink::{AppError, Client, ClientConfig, Reply, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "splitlink", about = "Pipelined LiveSplit Server client", version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server address (`host:port`), overriding the configuration file.
    #[arg(long)]
    endpoint: Option<String>,

    /// Response timeout in milliseconds, overriding the configuration file.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one command and print its reply.
    Send {
        /// Command text, e.g. `getcurrenttime` or `setgametime 1:00`.
        command: String,
        /// Do not wait for a reply.
        #[arg(long)]
        no_response: bool,
    },

    /// Poll a query on an interval and print each reply.
    Watch {
        /// Query to send, e.g. `getcurrenttime`.
        command: String,
        /// Delay between polls in milliseconds.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many polls.
        #[arg(long)]
        count: Option<u64>,
    },

    /// Read commands from stdin, one per line.
    ///
    /// A leading `!` sends the rest of the line without waiting for a reply.
    Shell,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from_path(path)?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.response_timeout_ms = timeout_ms;
    }
    config.validate()?;

    let client = Client::from_config(&config)?;
    client.connect().await?;

    let outcome = match args.command {
        Command::Send {
            command,
            no_response,
        } => send_once(&client, &command, no_response).await,
        Command::Watch {
            command,
            interval_ms,
            count,
        } => watch(&client, &command, Duration::from_millis(interval_ms), count).await,
        Command::Shell => shell(&client).await,
    };

    client.shutdown().await;
    outcome
}

async fn send_once(client: &Client, command: &str, no_response: bool) -> Result<()> {
    if no_response {
        return client.send_no_response(command);
    }

    let reply = client.send(command)?.await?;
    print_reply(&reply);
    Ok(())
}

async fn watch(
    client: &Client,
    command: &str,
    interval: Duration,
    count: Option<u64>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut sent = 0_u64;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let pending = client.send(command)?;
        let reply = tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                return Ok(());
            }
            reply = pending => reply?,
        };

        print_reply(&reply);
        sent += 1;
        if count.is_some_and(|limit| sent >= limit) {
            return Ok(());
        }
    }
}

async fn shell(client: &Client) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('!') {
            debug!(command, "shell: fire-and-forget");
            if let Err(err) = client.send_no_response(command.trim()) {
                warn!(%err, "shell: command rejected");
            }
            continue;
        }

        match client.send(line) {
            Ok(pending) => print_reply(&pending.await?),
            Err(err @ AppError::InvalidCommand(_)) => warn!(%err, "shell: command rejected"),
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Line(line) => println!("{line}"),
        Reply::NoAnswer => println!("(no answer)"),
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
