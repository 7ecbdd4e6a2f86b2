//! Dispatch from chat messages to posted workshop previews.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::{PreviewError, PreviewResult};
use crate::links::{LinkMatcher, WorkshopLink};
use crate::models::{AuthorRecord, ChannelHandle, IncomingMessage, ItemRecord};
use crate::render::Renderer;
use crate::steam;
use crate::traits::{ChatSink, WorkshopApi};

/// Message -> workshop links -> Steam lookups -> rendered embeds.
///
/// Links in one message are handled one after another, and each item's author
/// is fetched only after its details arrive. A failure only ever drops the
/// link or item it happened on.
pub struct WorkshopPreviewer<A> {
    api: A,
    matcher: LinkMatcher,
    renderer: Renderer,
}

impl<A: WorkshopApi> WorkshopPreviewer<A> {
    pub fn new(api: A, matcher: LinkMatcher, renderer: Renderer) -> Self {
        Self {
            api,
            matcher,
            renderer,
        }
    }

    /// Post a preview for every workshop item linked in `message`.
    ///
    /// Returns the number of previews sent.
    pub async fn handle_message<S: ChatSink>(&self, sink: &S, message: &IncomingMessage) -> usize {
        let mut sent = 0;

        for link in self.matcher.workshop_links(&message.text) {
            info!(
                "[message] {} ({}): {}",
                message.sender_name, message.sender_id, message.text
            );

            match self.preview_link(sink, message.channel, &link).await {
                Ok(count) => sent += count,
                Err(e) => warn!("Skipping workshop link {}: {}", link.url, e),
            }
        }

        sent
    }

    async fn preview_link<S: ChatSink>(
        &self,
        sink: &S,
        channel: ChannelHandle,
        link: &WorkshopLink,
    ) -> PreviewResult<usize> {
        let id = link.item_id()?;
        let body = self.api.fetch_item_details(id.into()).await?;

        let mut sent = 0;
        for entry in steam::published_file_details(&body)? {
            match self.preview_item(sink, channel, link, entry).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => error!("Failed to preview workshop item from {}: {}", link.url, e),
            }
        }

        Ok(sent)
    }

    async fn preview_item<S: ChatSink>(
        &self,
        sink: &S,
        channel: ChannelHandle,
        link: &WorkshopLink,
        entry: &Value,
    ) -> PreviewResult<bool> {
        if !steam::is_found(entry) {
            debug!("Steam has no details for {}: {}", link.url, entry);
            return Ok(false);
        }

        let item: ItemRecord = serde_json::from_value(entry.clone())?;
        if !item.is_eligible() {
            debug!(
                "Workshop item {} is hidden or banned (visibility {}, banned {})",
                item.id, item.visibility, item.banned
            );
            return Ok(false);
        }

        let body = self.api.fetch_author_profiles(item.creator.into()).await?;
        let player = steam::first_player(&body)?.ok_or_else(|| {
            PreviewError::malformed(format!("no player summary for creator {}", item.creator))
        })?;
        let author: AuthorRecord = serde_json::from_value(player.clone())?;
        debug!(
            country = ?author.loccountrycode,
            "Workshop item {} was made by {}", item.id, author.personaname
        );

        let document = self.renderer.render(&item, &author, &link.url)?;
        sink.send_document(channel, &document).await?;

        info!("Posted preview for workshop item {}: {}", item.id, item.title);
        Ok(true)
    }
}
