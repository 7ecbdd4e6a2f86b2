//! Seams between the preview pipeline and the outside world

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::PreviewResult;
use crate::models::{ChannelHandle, DisplayDocument};

/// One or more numeric Steam ids sent in a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ids(Vec<u64>);

impl Ids {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn count(&self) -> usize {
        self.0.len()
    }

    /// Comma-joined, as `steamids` expects.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<u64> for Ids {
    fn from(id: u64) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<u64>> for Ids {
    fn from(ids: Vec<u64>) -> Self {
        Self(ids)
    }
}

impl From<&[u64]> for Ids {
    fn from(ids: &[u64]) -> Self {
        Self(ids.to_vec())
    }
}

/// Read access to the Steam Web API.
///
/// Both calls return the raw response body; pulling records out of the
/// envelope is left to the caller.
#[async_trait]
pub trait WorkshopApi: Send + Sync {
    /// `ISteamRemoteStorage/GetPublishedFileDetails`
    ///
    /// Unknown ids are simply missing from (or flagged in) the result array.
    async fn fetch_item_details(&self, ids: Ids) -> PreviewResult<Value>;

    /// `ISteamUser/GetPlayerSummaries`
    async fn fetch_author_profiles(&self, ids: Ids) -> PreviewResult<Value>;
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_document(
        &self,
        channel: ChannelHandle,
        document: &DisplayDocument,
    ) -> PreviewResult<()>;

    async fn send_plain(&self, channel: ChannelHandle, text: &str) -> PreviewResult<()>;
}
