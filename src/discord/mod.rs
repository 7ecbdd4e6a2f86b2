//! # Discord Gateway Integration
//!
//! This module connects the workshop previewer to Discord. It listens to the
//! gateway for new messages, hands each one to the [`WorkshopPreviewer`], and
//! posts the rendered previews back as rich embeds.
//!
//! ## Features
//!
//! - **Link Previews**: Every non-bot message is scanned for workshop links
//! - **Rich Embeds**: Previews become embeds with author, thumbnail, stats and tags
//! - **Mention Replies**: A short table of canned replies when the bot is mentioned
//! - **Isolation**: A failed lookup or send is logged and never reaches the channel
//!
//! ## Discord Embed Structure
//!
//! Each preview includes:
//! - **Author**: Persona name (and real name), linking to the Steam profile
//! - **Title / URL**: Item title, linking to the URL the user posted
//! - **Description**: Sanitised, truncated item description
//! - **Color**: Pink for mods, orange for everything else
//! - **Thumbnail**: Preview image through the resizing proxy
//! - **Fields**: Subscriber/favourite/view counts, file size and last update
//! - **Timestamp**: When the item was first published
//! - **Footer**: The item's tags
//!
//! ## Gateway Intents
//!
//! `GUILD_MESSAGES`, `DIRECT_MESSAGES` and the privileged `MESSAGE_CONTENT`
//! intent, which must be enabled for the bot in the developer portal.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::ChannelId;
use serenity::model::Timestamp;
use serenity::prelude::*;
use tracing::{error, info};

use crate::errors::{PreviewError, PreviewResult};
use crate::mentions;
use crate::models::{ChannelHandle, DisplayDocument, IncomingMessage};
use crate::previewer::WorkshopPreviewer;
use crate::steam::SteamClient;
use crate::traits::ChatSink;

/// How a gateway session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Ctrl-C was received and the shards were shut down.
    Shutdown,
    /// The client stopped on its own; the caller should reconnect.
    Disconnected,
}

/// Outbound side of Discord, backed by serenity's REST client.
///
/// Cloning is cheap: the underlying `Http` is shared through an `Arc`.
#[derive(Clone)]
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send_document(
        &self,
        channel: ChannelHandle,
        document: &DisplayDocument,
    ) -> PreviewResult<()> {
        let message = CreateMessage::new().embed(to_embed(document)?);

        ChannelId::new(channel.0)
            .send_message(self.http.as_ref(), message)
            .await
            .map_err(|e| PreviewError::Send(e.to_string()))?;

        Ok(())
    }

    async fn send_plain(&self, channel: ChannelHandle, text: &str) -> PreviewResult<()> {
        ChannelId::new(channel.0)
            .say(self.http.as_ref(), text)
            .await
            .map_err(|e| PreviewError::Send(e.to_string()))?;

        Ok(())
    }
}

/// Build the serenity embed for a rendered preview.
///
/// Only the timestamp conversion can fail, for instants Discord can't
/// represent.
pub fn to_embed(document: &DisplayDocument) -> PreviewResult<CreateEmbed> {
    let timestamp = Timestamp::from_unix_timestamp(document.timestamp.timestamp())
        .map_err(|e| PreviewError::malformed(format!("unrepresentable timestamp: {e}")))?;

    let author = CreateEmbedAuthor::new(document.author.name.clone())
        .url(document.author.url.clone())
        .icon_url(document.author.icon_url.clone());

    Ok(CreateEmbed::new()
        .author(author)
        .title(document.title.clone())
        .url(document.url.clone())
        .description(document.description.clone())
        .colour(document.color)
        .thumbnail(document.thumbnail.clone())
        .fields(
            document
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.value.clone(), f.inline)),
        )
        .timestamp(timestamp)
        .footer(CreateEmbedFooter::new(document.footer.clone())))
}

/// Gateway event handler.
///
/// One handler is built per session; the previewer it shares is stateless
/// between messages, so concurrent events never contend on anything.
#[derive(Clone)]
pub struct Handler {
    previewer: Arc<WorkshopPreviewer<SteamClient>>,
    rival_bot_id: u64,
}

impl Handler {
    pub fn new(previewer: Arc<WorkshopPreviewer<SteamClient>>, rival_bot_id: u64) -> Self {
        Self {
            previewer,
            rival_bot_id,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let incoming = IncomingMessage {
            sender_id: msg.author.id.get(),
            sender_name: msg.author.name.clone(),
            text: msg.content.clone(),
            channel: ChannelHandle(msg.channel_id.get()),
        };
        let sink = DiscordSink::new(ctx.http.clone());

        self.previewer.handle_message(&sink, &incoming).await;

        let bot_id = ctx.cache.current_user().id;
        if !msg.mentions.iter().any(|user| user.id == bot_id) {
            return;
        }

        if let Some(reply) = mentions::reply_for(&incoming.text, incoming.sender_id, self.rival_bot_id) {
            info!("[mention] {} ({}): {}", incoming.sender_name, incoming.sender_id, incoming.text);
            if let Err(e) = sink.send_plain(incoming.channel, &reply).await {
                error!("Failed to send mention reply: {}", e);
            }
        }
    }

    async fn ready(&self, _: Context, ready: Ready) {
        info!(
            "Discord bot connected as {} (id: {})",
            ready.user.name, ready.user.id
        );
    }
}

/// Connect to the gateway and run until the client stops or Ctrl-C arrives.
///
/// Errors are only returned when the client can't be built or the connection
/// fails outright; the caller decides whether to reconnect.
pub async fn run_session(token: &str, handler: Handler) -> anyhow::Result<SessionEnd> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            result.map_err(|e| anyhow::anyhow!("Discord client error: {}", e))?;
            Ok(SessionEnd::Disconnected)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping Discord client...");
            shard_manager.shutdown_all().await;
            Ok(SessionEnd::Shutdown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentAuthor, DocumentField};
    use chrono::DateTime;

    fn document() -> DisplayDocument {
        DisplayDocument {
            title: "Test Mod".to_string(),
            description: "Check out now".to_string(),
            url: "https://steamcommunity.com/sharedfiles/filedetails/?id=1".to_string(),
            color: 0x00FF_71EF,
            thumbnail: "https://img.example.net/ugc/1/A/image.jpg".to_string(),
            author: DocumentAuthor {
                name: "Foo (Bar)".to_string(),
                url: "https://steamcommunity.com/id/foo/".to_string(),
                icon_url: "https://avatars.example/foo.jpg".to_string(),
            },
            fields: vec![DocumentField {
                name: ":white_check_mark: **1**".to_string(),
                value: ":hearts: **2** :eye: **3**".to_string(),
                inline: true,
            }],
            timestamp: DateTime::from_timestamp(1_600_000_000, 0).unwrap(),
            footer: "Mod".to_string(),
        }
    }

    #[test]
    fn embed_carries_every_part_of_the_document() {
        let embed = serde_json::to_value(to_embed(&document()).unwrap()).unwrap();

        assert_eq!(embed["title"], "Test Mod");
        assert_eq!(embed["description"], "Check out now");
        assert_eq!(embed["url"], "https://steamcommunity.com/sharedfiles/filedetails/?id=1");
        assert_eq!(embed["color"], 0x00FF_71EF);
        assert_eq!(embed["thumbnail"]["url"], "https://img.example.net/ugc/1/A/image.jpg");
        assert_eq!(embed["author"]["name"], "Foo (Bar)");
        assert_eq!(embed["author"]["url"], "https://steamcommunity.com/id/foo/");
        assert_eq!(embed["author"]["icon_url"], "https://avatars.example/foo.jpg");
        assert_eq!(embed["fields"][0]["name"], ":white_check_mark: **1**");
        assert_eq!(embed["fields"][0]["inline"], true);
        assert_eq!(embed["footer"]["text"], "Mod");
        assert!(embed["timestamp"].as_str().unwrap().starts_with("2020-09-13T12:26:40"));
    }
}
