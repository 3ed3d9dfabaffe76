pub mod config;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod runner;
pub mod selector;
pub mod session;
pub mod timer;

use anyhow::{Context, Result};
use reqwest::Client;
use std::io;
use tracing::{error, info};

use config::Config;
use session::run_session;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let cfg = Config::from_env().inspect_err(|err| {
        error!(error = %err, "failed to load configuration");
    })?;
    info!(
        openai_base_url = %cfg.openai_base_url,
        gateway_max_tokens = cfg.gateway_max_tokens,
        model_timeout_secs = ?cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    run_session(&mut input, &mut out, io::stdout(), |choice| {
        selector::connect(choice, &client, &cfg)
    })
    .await?;
    Ok(())
}
