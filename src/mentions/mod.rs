//! Canned replies when someone mentions the bot.

use std::sync::LazyLock;

use regex::Regex;

static LEADING_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<@!?\d+>\s+").expect("hardcoded regex"));
static CREEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:ちゅっ?)+|:peropero:|:oppai:|:ashi:|:eroi:").expect("hardcoded regex")
});
static CUTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":kawaii:|かわいい|kawaii|可爱").expect("hardcoded regex"));

/// Reply for a message that mentions the bot, if any phrase matches.
///
/// `rival_id` is the other bot named in the "意気込み" reply.
pub fn reply_for(content: &str, sender_id: u64, rival_id: u64) -> Option<String> {
    let content = LEADING_MENTION_RE.replace(content, "");

    if content.contains("意気込み") {
        Some(format!("<@{rival_id}> あんたには負けないんだから"))
    } else if CREEP_RE.is_match(&content) {
        Some(format!("<@{sender_id}> 二度とわたしに話しかけないで"))
    } else if CUTE_RE.is_match(&content) {
        Some(format!("<@{sender_id}> 知ってる。"))
    } else {
        None
    }
}
