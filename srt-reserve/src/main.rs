use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use srt_reserve::config::{ConfigError, RawConfig, RunConfig};
use srt_reserve::run::{ExitStatus, RunError, run};

#[derive(Parser, Debug)]
#[command(name = "srt-reserve")]
#[command(about = "Polls the SRT booking site and reserves the first open seat")]
#[command(version)]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SRT membership number, email or phone number
    #[arg(long, env = "SRT_ID", value_name = "1234567890")]
    user: Option<String>,

    /// SRT password
    #[arg(long, env = "SRT_PSW", hide_env_values = true)]
    psw: Option<String>,

    /// Departure station
    #[arg(long, value_name = "동탄")]
    dpt: Option<String>,

    /// Arrival station
    #[arg(long, value_name = "동대구")]
    arr: Option<String>,

    /// Departure date
    #[arg(long, value_name = "YYYYMMDD")]
    dt: Option<String>,

    /// Departure hour (even hours, 00-22)
    #[arg(long, value_name = "08")]
    tm: Option<String>,

    /// First result row to check
    #[arg(long)]
    stnum: Option<usize>,

    /// Number of result rows to check
    #[arg(long)]
    num: Option<usize>,

    /// Join the wait-list when no seat is open
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    reserve: Option<bool>,

    /// Notification sender address
    #[arg(long)]
    sender: Option<String>,

    /// Notification recipient address
    #[arg(long)]
    recipient: Option<String>,

    /// App password for the sender account
    #[arg(
        long = "app_password",
        alias = "app-password",
        env = "SRT_APP_PASSWORD",
        hide_env_values = true
    )]
    app_password: Option<String>,

    /// Chrome executable to launch
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Attach to a running Chrome's DevTools websocket instead of launching one
    #[arg(long, value_name = "ws://127.0.0.1:9222/devtools/browser/...")]
    devtools_url: Option<String>,

    /// Run Chrome without a window
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    headless: Option<bool>,

    /// Give up after this many polls
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    max_duration_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Settings given on the command line.
    fn overrides(&self) -> RawConfig {
        RawConfig {
            user: self.user.clone(),
            psw: self.psw.clone(),
            dpt: self.dpt.clone(),
            arr: self.arr.clone(),
            dt: self.dt.clone(),
            tm: self.tm.clone(),
            stnum: self.stnum,
            num: self.num,
            reserve: self.reserve,
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            app_password: self.app_password.clone(),
            chrome: self.chrome.clone(),
            devtools_url: self.devtools_url.clone(),
            headless: self.headless,
            max_attempts: self.max_attempts,
            max_duration_secs: self.max_duration_secs,
        }
    }

    fn load_config(&self) -> Result<RunConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => RawConfig::from_json_file(path)?,
            None => RawConfig::default(),
        };
        file.merge(self.overrides()).resolve()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("srt_reserve=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return RunError::from(e).exit_status().into();
        }
    };

    info!(
        departure = config.criteria.departure.as_str(),
        arrival = config.criteria.arrival.as_str(),
        date = %config.criteria.date,
        hour = %config.criteria.hour,
        rows = ?config.criteria.window.rows(),
        waitlist = config.criteria.waitlist,
        "starting reservation"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            on_interrupt.cancel();
        }
    });

    match run(&config, cancel).await {
        Ok(outcome) => {
            info!(
                reserved = outcome.is_reserved(),
                refreshes = outcome.refreshes(),
                "run finished"
            );
            if outcome.is_reserved() {
                println!("{outcome}. Complete the payment on the SRT site.");
            } else {
                println!("{outcome}");
            }
            ExitStatus::from_outcome(&outcome).into()
        }
        Err(e) => {
            error!(error = %e, "reservation run failed");
            eprintln!("Error: {e}");
            e.exit_status().into()
        }
    }
}
