mod cli;
mod config;
mod constants;
mod credentials;
mod error;
mod mail;
mod oauth2;
mod triage;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::config::{Config, RunSettings};
use crate::credentials::ClientCredentials;
use crate::mail::GmailClient;
use crate::triage::{AlwaysSend, ConsolePrompt};

fn setup_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::sync::Mutex::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        None => {
            // Prompts go to stdout, so logs stay on stderr
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.log_file.as_deref())?;

    let config = Config::load(args.config.as_deref())?;
    let settings = RunSettings::resolve(&args, &config)?;
    let credentials = ClientCredentials::resolve(&args, &config)?;

    let access_token = oauth2::access_token(credentials, args.cache_token).await?;
    let client = GmailClient::new(access_token)?;

    let report = if settings.prompt {
        let mut prompt = ConsolePrompt::new(io::stdin().lock(), io::stdout());
        triage::run(&client, &settings, &mut prompt).await?
    } else {
        triage::run(&client, &settings, &mut AlwaysSend).await?
    };

    if report.failed > 0 {
        tracing::warn!("{} replies could not be sent", report.failed);
    }
    Ok(())
}
