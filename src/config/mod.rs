//! Startup configuration.
//!
//! Everything is read from the environment exactly once; the resulting
//! [`Config`] is immutable and handed to the link matcher, the Steam client
//! and the renderer.

use std::time::Duration;

use anyhow::{Context, Result, bail};

const DEFAULT_API_BASE: &str = "https://api.steampowered.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RIVAL_BOT_ID: u64 = 155_149_108_183_695_360;

/// Query string appended to every proxied thumbnail: a 128x128 black-padded JPEG.
pub const IMAGE_PROXY_QUERY: &str = "interpolation=lanczos-none&output-format=jpeg&output-quality=95&fit=inside%7C128%3A128&composite-to=*,*%7C128%3A128&background-color=black&extension=jpeg";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub steam: SteamConfig,
    pub image_proxy: ImageProxyConfig,
    pub link_pattern: LinkPattern,
    /// User pinged by the "意気込み" mention reply.
    pub rival_bot_id: u64,
}

#[derive(Debug, Clone)]
pub struct SteamConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageProxyConfig {
    pub host: String,
}

/// Shape of a workshop item link:
/// `{scheme}://{host}/{section}/{action}/?{id_param}=...&...`
#[derive(Debug, Clone)]
pub struct LinkPattern {
    pub schemes: Vec<String>,
    pub host: String,
    pub sections: Vec<String>,
    pub action: String,
    pub id_param: String,
}

impl Default for LinkPattern {
    fn default() -> Self {
        Self {
            schemes: vec!["http".to_string(), "https".to_string()],
            host: "steamcommunity.com".to_string(),
            sections: vec!["sharedfiles".to_string(), "workshop".to_string()],
            action: "filedetails".to_string(),
            id_param: "id".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Missing credentials are fatal: the caller is expected to bail out of
    /// `main` with the returned error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{key} not set"))
        };

        let discord_token = required("DISCORD_TOKEN")?;
        let api_key = required("STEAM_API_KEY")?;
        let proxy_host = required("STEAM_IMG_PROXY_HOST")?;

        let api_base = lookup("STEAM_API_BASE")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout_secs = match lookup("STEAM_API_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("STEAM_API_TIMEOUT_SECS is not an integer: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("STEAM_API_TIMEOUT_SECS must be greater than zero");
        }

        let rival_bot_id = match lookup("RIVAL_BOT_ID") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("RIVAL_BOT_ID is not a user id: {raw}"))?,
            None => DEFAULT_RIVAL_BOT_ID,
        };

        Ok(Self {
            discord_token,
            steam: SteamConfig {
                api_key,
                api_base: api_base.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(timeout_secs),
            },
            image_proxy: ImageProxyConfig {
                host: proxy_host.trim().to_string(),
            },
            link_pattern: LinkPattern::default(),
            rival_bot_id,
        })
    }
}
