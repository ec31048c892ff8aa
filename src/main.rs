//! Prints the archived snapshot of a URL closest to a given time.

#![warn(
    clippy::all,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use wayback::{
    config::{DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR, TIMEOUT_ENV_VAR},
    Client, Timestamp,
};

#[derive(Parser, Debug)]
#[clap(about = "Finds the archived snapshot of a URL in the Wayback Machine.")]
struct CliArgs {
    /// Page to look up.
    #[clap()]
    url: String,
    /// Snapshot time: a timestamp such as 20060102 or a date/time such as
    /// "Mon, 02 Jan 2006 15:04:05 GMT". Defaults to the most recent snapshot.
    #[clap(short, long)]
    time: Option<Timestamp>,
    #[clap(long, env = ENDPOINT_ENV_VAR, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// HTTP timeout in seconds.
    #[clap(long, env = TIMEOUT_ENV_VAR)]
    timeout: Option<u64>,
    /// Shows trace messages, including HTTP data.
    #[clap(long)]
    trace: bool,
}

fn build_http_client(args: &CliArgs) -> Result<reqwest::Client> {
    let mut builder = reqwest::ClientBuilder::new().connection_verbose(args.trace);
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    builder.build().context("failed to create HTTP client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let default_log_level = if args.trace { "trace" } else { "warn" };
    let mut log_builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_log_level));
    if args.trace {
        log_builder.filter_module("reqwest", log::LevelFilter::Trace);
    }
    log_builder.init();

    let client = Client::with_http_client(build_http_client(&args)?).with_endpoint(&args.endpoint);
    let snapshot = match &args.time {
        Some(timestamp) => client.available_at(&args.url, timestamp).await,
        None => client.available(&args.url).await,
    }
    .with_context(|| format!("failed to look up {}", args.url))?;

    println!("{}", snapshot);
    Ok(())
}
