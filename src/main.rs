use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{error, info, warn};

mod config;
mod discord;
mod errors;
mod links;
mod mentions;
mod models;
mod previewer;
mod render;
mod steam;
mod traits;

use config::Config;
use discord::{Handler, SessionEnd};
use links::LinkMatcher;
use previewer::WorkshopPreviewer;
use render::Renderer;
use steam::SteamClient;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// A session that stayed up this long resets the backoff.
const STABLE_SESSION: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting Steam workshop preview bot");

    let config = Config::from_env()?;

    let api = SteamClient::new(&config.steam)?;
    let previewer = Arc::new(WorkshopPreviewer::new(
        api,
        LinkMatcher::new(config.link_pattern.clone()),
        Renderer::new(config.image_proxy.clone()),
    ));
    let handler = Handler::new(previewer, config.rival_bot_id);

    let mut backoff = INITIAL_BACKOFF;
    loop {
        let started = Instant::now();

        match discord::run_session(&config.discord_token, handler.clone()).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::Disconnected) => warn!("Discord session ended"),
            Err(e) => error!("Discord session failed: {}", e),
        }

        if started.elapsed() >= STABLE_SESSION {
            backoff = INITIAL_BACKOFF;
        }

        info!("Reconnecting in {:?}", backoff);
        tokio::select! {
            () = tokio::time::sleep(backoff) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }

    info!("Steam workshop preview bot stopped");
    Ok(())
}
