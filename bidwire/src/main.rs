mod config;
mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{CommonConfig, Config, ConfigError};
use shared::registry::{AdapterManager, SubmoduleRegistry};

#[derive(Parser)]
#[command(
    name = "bidwire",
    about = "Forward auction analytics and resolve identity envelopes"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, short)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a captured auction event log through the registered adapters.
    Replay {
        /// JSON-lines file of `{eventType, args}` events.
        events: PathBuf,
    },
    /// Resolve one identity envelope and print the decoded id.
    ResolveId,
}

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Replay(#[from] replay::ReplayError),
    #[error(transparent)]
    Forwarder(#[from] analytics::ForwarderError),
    #[error(transparent)]
    Identity(#[from] identity::IdentityError),
    #[error("no identity submodule is configured")]
    IdentityNotConfigured,
    #[error("identity submodule rejected the configured params")]
    InvalidIdentityParams,
    #[error("identity resolution produced no envelope")]
    NoEnvelope,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("bidwire: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let config = Config::from_file(&cli.config)?;
    let _sentry = init_telemetry(&config.common);

    match cli.command {
        Command::Replay { events } => {
            let mut adapters = AdapterManager::new();
            let forwarder =
                analytics::register(&mut adapters, config.analytics.unwrap_or_default())?;

            let replayed = replay::replay_file(&events, &adapters)?;
            forwarder.close().await;
            tracing::info!(replayed, "event log replayed");
            Ok(())
        }
        Command::ResolveId => {
            let identity_config = config.identity.ok_or(RunError::IdentityNotConfigured)?;

            let mut submodules = SubmoduleRegistry::new();
            submodules.submodule(
                "userId",
                Arc::new(identity::IdentitySubmodule::new(&identity_config.endpoint)?),
            );

            let submodule = submodules
                .family("userId")
                .first()
                .cloned()
                .ok_or(RunError::IdentityNotConfigured)?;

            let params = serde_json::json!({ "pid": identity_config.pid });
            let resolution = submodule
                .request_id(&params)
                .ok_or(RunError::InvalidIdentityParams)?;
            let envelope = resolution.await.ok_or(RunError::NoEnvelope)?;

            println!("{}", submodule.decode(&envelope));
            Ok(())
        }
    }
}

fn init_telemetry(common: &CommonConfig) -> Option<sentry::ClientInitGuard> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Some(metrics_config) = &common.metrics {
        match metrics_exporter_statsd::StatsdBuilder::from(
            &metrics_config.statsd_host,
            metrics_config.statsd_port,
        )
        .build(Some("bidwire"))
        {
            Ok(recorder) => {
                if metrics::set_global_recorder(recorder).is_err() {
                    tracing::warn!("metrics recorder already installed");
                } else {
                    shared::metrics_defs::describe_all(identity::metrics_defs::ALL_METRICS);
                    shared::metrics_defs::describe_all(analytics::metrics_defs::ALL_METRICS);
                }
            }
            Err(err) => tracing::warn!(%err, "could not initialize statsd exporter"),
        }
    }

    common
        .logging
        .as_ref()
        .and_then(|logging| logging.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        })
}
