//! Data models for Steam workshop records, chat messages and rendered previews

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque handle of the chat channel a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelHandle(pub u64);

/// A chat message as seen by the previewer, independent of the platform.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender_id: u64,
    pub sender_name: String,
    pub text: String,
    pub channel: ChannelHandle,
}

/// One entry of `response.publishedfiledetails`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "publishedfileid", deserialize_with = "u64_from_any")]
    pub id: u64,
    pub title: String,
    pub description: String,
    pub visibility: i64,
    pub banned: i64,
    pub tags: Vec<ItemTag>,
    #[serde(deserialize_with = "u64_from_any")]
    pub creator: u64,
    pub subscriptions: u64,
    pub favorited: u64,
    pub views: u64,
    #[serde(deserialize_with = "u64_from_any")]
    pub file_size: u64,
    pub time_created: i64,
    pub time_updated: i64,
    pub preview_url: String,
}

impl ItemRecord {
    /// Only public, unbanned items are ever previewed.
    pub fn is_eligible(&self) -> bool {
        self.visibility == 0 && self.banned == 0
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.tag.as_str()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemTag {
    pub tag: String,
}

/// One entry of `response.players`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRecord {
    pub personaname: String,
    #[serde(default)]
    pub realname: Option<String>,
    pub profileurl: String,
    pub avatar: String,
    #[serde(default)]
    pub loccountrycode: Option<String>,
}

/// Rendered preview of one workshop item, ready to be posted as an embed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayDocument {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub thumbnail: String,
    pub author: DocumentAuthor,
    pub fields: Vec<DocumentField>,
    pub timestamp: DateTime<Utc>,
    pub footer: String,
}

/// Byline block shown above the title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Steam encodes 64-bit ids (and sometimes sizes) as strings.
fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn item_json() -> serde_json::Value {
        json!({
            "publishedfileid": "1234567890",
            "result": 1,
            "title": "Test Mod",
            "description": "Check https://example.com out [b]now[/b]",
            "visibility": 0,
            "banned": 0,
            "tags": [{"tag": "Mod"}],
            "creator": "76561198000000000",
            "subscriptions": 12345,
            "favorited": 678,
            "views": 1234567,
            "file_size": "1234567",
            "time_created": 1_600_000_000,
            "time_updated": 1_700_000_000,
            "preview_url": "https://steamuserimages-a.akamaihd.net/ugc/111/AAA/"
        })
    }

    #[test]
    fn parses_item_with_string_ids() {
        let item: ItemRecord = serde_json::from_value(item_json()).unwrap();
        assert_eq!(item.id, 1_234_567_890);
        assert_eq!(item.creator, 76_561_198_000_000_000);
        assert_eq!(item.file_size, 1_234_567);
        assert_eq!(item.tag_names(), vec!["Mod"]);
        assert!(item.is_eligible());
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut value = item_json();
        value.as_object_mut().unwrap().remove("preview_url");
        assert!(serde_json::from_value::<ItemRecord>(value).is_err());
    }

    #[test]
    fn non_numeric_string_id_is_an_error() {
        let mut value = item_json();
        value["creator"] = json!("nobody");
        assert!(serde_json::from_value::<ItemRecord>(value).is_err());
    }

    #[test]
    fn eligibility_requires_public_and_unbanned() {
        let mut value = item_json();
        value["visibility"] = json!(1);
        let hidden: ItemRecord = serde_json::from_value(value).unwrap();
        assert!(!hidden.is_eligible());

        let mut value = item_json();
        value["banned"] = json!(1);
        let banned: ItemRecord = serde_json::from_value(value).unwrap();
        assert!(!banned.is_eligible());
    }

    #[test]
    fn author_optional_fields() {
        let author: AuthorRecord = serde_json::from_value(json!({
            "personaname": "Foo",
            "profileurl": "https://steamcommunity.com/id/foo/",
            "avatar": "https://avatars.example/foo.jpg"
        }))
        .unwrap();
        assert!(author.realname.is_none());
        assert!(author.loccountrycode.is_none());
    }
}
