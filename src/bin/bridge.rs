use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use icinga_bridge::{
    client::{MonitoringApi, icinga::IcingaClient, memory::MemoryApi},
    config::{Config, SAMPLE_CONFIG, read_config_file},
    dispatcher::Dispatcher,
    feed::forward,
    util::load_env,
};
use tokio::io::BufReader;
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Forward metrics to Icinga2 as passive check results.
///
/// Reads newline-delimited JSON metrics (`{"name", "tags", "fields"}`) and
/// sends them in batches.
#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, required_unless_present = "print_config")]
    file: Option<String>,

    /// Read metrics from this file instead of stdin
    #[arg(long)]
    input: Option<String>,

    /// Number of metrics forwarded per batch
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Log check results instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Print a sample configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn log_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn init(debug: bool) {
    let level = log_level(debug);
    let filter = filter::Targets::new().with_targets(vec![
        ("icinga_bridge", level),
        ("bridge", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{SAMPLE_CONFIG}");
        return Ok(());
    }

    load_env();
    let path = args.file.as_deref().context("no config file given")?;
    let config = read_config_file(path)?.apply_env();
    init(config.debug);
    trace!("started with args: {args:?}");

    let api = connect(&config, args.dry_run)?;
    let dispatcher =
        Dispatcher::new(api.clone(), &config.check_command).with_prefix(config.prefix());

    let result = match &args.input {
        Some(input) => {
            let file = tokio::fs::File::open(input)
                .await
                .with_context(|| format!("failed to open {input}"))?;
            forward(BufReader::new(file), &dispatcher, args.batch_size).await
        }
        None => forward(BufReader::new(tokio::io::stdin()), &dispatcher, args.batch_size).await,
    };

    if let Err(e) = api.close().await {
        warn!("failed to close connection: {e}");
    }

    result
}

fn connect(config: &Config, dry_run: bool) -> anyhow::Result<Arc<dyn MonitoringApi>> {
    if dry_run {
        info!("dry run, check results are only logged");
        return Ok(Arc::new(MemoryApi::dry_run()));
    }

    config.validate()?;
    let client = IcingaClient::connect(config)?;
    info!("forwarding to {}", client.base_url());
    Ok(Arc::new(client))
}
