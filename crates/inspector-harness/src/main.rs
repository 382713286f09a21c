//! Inspector harness CLI.
//!
//! Usage:
//!   inspector-harness --config harness.yaml [--debug] [--listen ADDR]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use inspector_harness::{collect_errors, join_errors, Harness, HarnessFile};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Run API test cases through an inspector via a transparent relay
#[derive(Parser, Debug)]
#[command(name = "inspector-harness")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Harness configuration file (YAML or JSON)
    #[arg(short, long, env = "HARNESS_CONFIG")]
    config: PathBuf,

    /// Dump relayed requests and responses
    #[arg(short, long)]
    debug: bool,

    /// Override the relay listen address (host, or host:port to bypass the inspector)
    #[arg(short, long)]
    listen: Option<String>,
}

fn init_tracing(debug: bool) {
    let default_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let file = HarnessFile::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let (mut config, tests) = file.into_parts()?;
    if args.debug {
        config.debug_print = true;
    }
    if let Some(listen) = args.listen {
        config.proxy_listen_addr = listen;
    }

    let harness = Harness::new(config)?;
    info!(
        "Relaying {} via {} (listen {})",
        harness.config().api_url,
        harness.config().inspector_url,
        harness.listen_addr()
    );

    let (mut errors, cancel) = harness.start_all(tests).await?;

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current test");
            interrupt.cancel();
        }
    });

    let failures = collect_errors(&mut errors).await;
    harness.shutdown();

    if failures.is_empty() {
        info!("All tests passed");
        Ok(())
    } else {
        anyhow::bail!("{} test(s) failed:\n{}", failures.len(), join_errors(&failures))
    }
}
