//! wawatch CLI
//!
//! `wawatch run` starts a Chrome session on the chat page, waits for the
//! manual QR-code login, then polls one contact's presence indicator and
//! appends every state transition to a per-run CSV log until interrupted.
//! `wawatch inspect` dumps the conversation header for troubleshooting
//! detection against the (unversioned) page markup.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wawatch::driver::ChromeDriver;
use wawatch::{
    ChangeLogger, MonitorConfig, MonitorSession, PagePresenceSource, PageSession, Selector,
    StatusLog, WebDriverPage,
};

#[derive(Parser, Debug)]
#[command(name = "wawatch")]
#[command(about = "Logs one chat contact's presence transitions to CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Monitor a contact until interrupted (Ctrl+C)
    Run(RunArgs),
    /// Open a conversation and dump its header, for troubleshooting detection
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Contact to monitor, exactly as displayed in the chat list
    #[arg(short, long)]
    contact: Option<String>,

    /// Seconds between polls
    #[arg(short, long)]
    interval: Option<u64>,

    /// Directory for per-run CSV logs
    #[arg(long)]
    logs_dir: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Contact whose conversation header to dump
    #[arg(short, long)]
    contact: String,

    /// Extra selectors to probe (e.g. 'region:header >> text:online')
    #[arg(long = "probe")]
    probes: Vec<String>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Inspect(args) => inspect(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(
    path: Option<&PathBuf>,
    contact: Option<String>,
    interval: Option<u64>,
    logs_dir: Option<PathBuf>,
) -> anyhow::Result<MonitorConfig> {
    let mut config = match path {
        Some(path) => MonitorConfig::load(path)?,
        None => {
            let contact = contact
                .clone()
                .context("--contact is required when no config file is given")?;
            MonitorConfig::new(contact)
        }
    };
    if let Some(contact) = contact {
        config.contact = contact;
    }
    if let Some(interval) = interval {
        config.interval_secs = interval;
    }
    if let Some(dir) = logs_dir {
        config.logs_dir = dir;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = resolve_config(
        args.config.as_ref(),
        args.contact,
        args.interval,
        args.logs_dir,
    )?;
    info!(
        contact = %config.contact,
        interval_secs = config.interval_secs,
        "starting monitor"
    );

    // Startup failures abort before the loop, with a non-zero exit.
    let driver = ChromeDriver::spawn().await?;
    let client = driver.connect().await?;
    let page = WebDriverPage::new(client);

    let outcome = monitor(&config, &page).await;

    // Teardown runs once, however the loop ended.
    if let Err(err) = page.close().await {
        warn!("closing browser session: {err}");
    }
    if let Err(err) = driver.shutdown().await {
        warn!("stopping chromedriver: {err}");
    }
    outcome
}

async fn monitor(config: &MonitorConfig, page: &WebDriverPage) -> anyhow::Result<()> {
    page.navigate(&config.chat_url).await?;
    wait_for_login().await?;

    let log = StatusLog::create(&config.logs_dir)?;
    println!("Logging transitions to {}", log.path().display());
    let logger = ChangeLogger::new(log);

    let mut source = PagePresenceSource::new(config.extractor(), page);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current tick");
            cancel_on_signal.cancel();
        }
    });

    MonitorSession::new(logger, config.interval())
        .run(&mut source, cancel)
        .await?;
    info!("monitoring stopped");
    Ok(())
}

async fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let config = resolve_config(args.config.as_ref(), Some(args.contact), None, None)?;

    let driver = ChromeDriver::spawn().await?;
    let client = driver.connect().await?;
    let page = WebDriverPage::new(client);

    let outcome = dump_header(&config, &page, &args.probes).await;

    if let Err(err) = page.close().await {
        warn!("closing browser session: {err}");
    }
    if let Err(err) = driver.shutdown().await {
        warn!("stopping chromedriver: {err}");
    }
    outcome
}

async fn dump_header(
    config: &MonitorConfig,
    page: &WebDriverPage,
    probes: &[String],
) -> anyhow::Result<()> {
    page.navigate(&config.chat_url).await?;
    wait_for_login().await?;

    let observation = config.extractor().observe(page).await;
    println!(
        "mapped state: {} (raw: {:?})",
        observation.state, observation.raw
    );

    match page.find_visible(&Selector::header()).await? {
        Some(header) => {
            println!("-- header text --");
            for line in header.text().await?.lines() {
                println!("  {line}");
            }
        }
        None => println!("no conversation header is visible"),
    }

    for probe in probes {
        let selector = Selector::from(probe.as_str());
        let hits = page.find_all(&selector).await?;
        println!("probe {probe:?}: {} match(es)", hits.len());
        for hit in hits {
            if let Ok(text) = hit.text().await {
                println!("  {text:?}");
            }
        }
    }
    Ok(())
}

async fn wait_for_login() -> anyhow::Result<()> {
    println!("Scan the QR code in the browser window to log in.");
    println!("Press Enter once the chat list is visible...");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(())
}
