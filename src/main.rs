//! bananaboatbot - an IRC bot whose behaviour lives entirely in Lua.
//!
//! Usage: `bananaboatbot [config.toml]`. SIGHUP reloads the script.

use bananaboatbot::network::IrcConnector;
use bananaboatbot::{Bot, Config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "bananaboat.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        script = %config.bot.script.display(),
        log_commands = config.bot.log_commands,
        "Starting bananaboatbot"
    );

    let connector = Arc::new(IrcConnector::new(config.bot.outbound_queue));
    let bot = Bot::new(config, connector)?;

    // A broken script at startup is logged; a later SIGHUP can fix it.
    if let Err(e) = bot.reload().await {
        error!(error = %e, code = e.error_code(), "Lua error");
    }

    spawn_reload_on_hangup(Arc::clone(&bot));

    tokio::signal::ctrl_c().await?;
    bot.close().await;

    Ok(())
}

#[cfg(unix)]
fn spawn_reload_on_hangup(bot: Arc<Bot>) {
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to register SIGHUP handler");
                return;
            }
        };

        while sighup.recv().await.is_some() {
            info!("Received SIGHUP, reloading script");
            if let Err(e) = bot.reload().await {
                error!(error = %e, code = e.error_code(), "Reload failed, keeping previous script");
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_bot: Arc<Bot>) {}
