//! Turning a workshop item and its author into an embed-ready [`DisplayDocument`].
//!
//! Item descriptions are user-written BBCode full of links, and Discord
//! treats `` ` ``, `:` and `@` specially, so the description goes through a
//! fixed sanitising pipeline before it is shown:
//!
//! 1. every URL found in it is removed (plain substring replacement)
//! 2. line breaks become spaces
//! 3. `[tag]` / `[/tag]` markup becomes a space
//! 4. backticks are escaped with a backslash
//! 5. `:` and `@` are wrapped in backticks
//! 6. whitespace runs collapse to one space
//! 7. the result is cut to 200 characters on a space boundary, ending in ` ...`
//!
//! Any field the payload lacks fails the whole item: a half-filled embed is
//! never posted.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use crate::config::{IMAGE_PROXY_QUERY, ImageProxyConfig};
use crate::errors::{PreviewError, PreviewResult};
use crate::links;
use crate::models::{AuthorRecord, DisplayDocument, DocumentAuthor, DocumentField, ItemRecord};

pub const MOD_COLOR: u32 = 0x00FF_71EF;
pub const DEFAULT_COLOR: u32 = 0x00FF_9153;

pub const DESCRIPTION_LIMIT: usize = 200;
const OMISSION: &str = " ...";

/// Items updated this many days ago or more recently get the `:new:` marker.
const FRESH_DAYS: i64 = 7;

static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").expect("hardcoded regex"));
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[/?[^\]]+?\]").expect("hardcoded regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex"));

pub struct Renderer {
    image_proxy: ImageProxyConfig,
}

impl Renderer {
    pub fn new(image_proxy: ImageProxyConfig) -> Self {
        Self { image_proxy }
    }

    /// Render against today's date (UTC).
    pub fn render(
        &self,
        item: &ItemRecord,
        author: &AuthorRecord,
        link: &str,
    ) -> PreviewResult<DisplayDocument> {
        self.render_on(item, author, link, Utc::now().date_naive())
    }

    pub fn render_on(
        &self,
        item: &ItemRecord,
        author: &AuthorRecord,
        link: &str,
        today: NaiveDate,
    ) -> PreviewResult<DisplayDocument> {
        let tags = item.tag_names();
        let color = if tags.contains(&"Mod") {
            MOD_COLOR
        } else {
            DEFAULT_COLOR
        };

        let thumbnail = self.thumbnail(&item.preview_url)?;

        let stats = DocumentField {
            name: format!(":white_check_mark: **{}**", delimited(item.subscriptions)),
            value: format!(
                ":hearts: **{}** :eye: **{}**",
                delimited(item.favorited),
                delimited(item.views)
            ),
            inline: true,
        };

        let delta = day_delta(today, item.time_updated)?;
        let mut last_update = format!(":tools: Last update: {}", day_label(delta));
        if is_fresh(delta) {
            last_update.push_str(" :new:");
        }
        let freshness = DocumentField {
            name: format!(":file_folder: **`{}`**", human_size(item.file_size)),
            value: last_update,
            inline: true,
        };

        let timestamp = DateTime::from_timestamp(item.time_created, 0).ok_or_else(|| {
            PreviewError::malformed(format!("time_created out of range: {}", item.time_created))
        })?;

        Ok(DisplayDocument {
            title: item.title.clone(),
            description: sanitize_description(&item.description),
            url: link.to_string(),
            color,
            thumbnail,
            author: DocumentAuthor {
                name: byline(author),
                url: author.profileurl.clone(),
                icon_url: author.avatar.clone(),
            },
            fields: vec![stats, freshness],
            timestamp,
            footer: tags
                .iter()
                .map(|tag| escape_backticks(tag))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Proxied, resized thumbnail for a Steam preview image.
    pub fn thumbnail(&self, preview_url: &str) -> PreviewResult<String> {
        let image = links::parse_preview_url(preview_url)?;
        Ok(format!(
            "https://{}/{}/{}/{}/image.jpg?{IMAGE_PROXY_QUERY}",
            self.image_proxy.host, image.kind, image.arg0, image.arg1
        ))
    }
}

pub fn sanitize_description(raw: &str) -> String {
    let mut text = raw.to_string();
    for url in links::extract(raw) {
        text = text.replace(&url, "");
    }

    let text = LINE_BREAK_RE.replace_all(&text, " ");
    let text = MARKUP_RE.replace_all(&text, " ");
    let text = escape_backticks(&text);
    let text = wrap_sentinels(&text);
    let text = WHITESPACE_RE.replace_all(&text, " ");

    truncate(text.trim(), DESCRIPTION_LIMIT, OMISSION)
}

pub fn escape_backticks(text: &str) -> String {
    text.replace('`', "\\`")
}

/// `:` starts an emoji and `@` a mention on Discord.
fn wrap_sentinels(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ':' || c == '@' {
            out.push('`');
            out.push(c);
            out.push('`');
        } else {
            out.push(c);
        }
    }
    out
}

/// Cut `text` to at most `limit` characters, omission included.
///
/// The cut is made at the last Unicode space separator that still leaves room
/// for `omission`; without one the text is cut mid-word at that position.
pub fn truncate(text: &str, limit: usize, omission: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return text.to_string();
    }

    let stop = limit.saturating_sub(omission.chars().count());
    let cut = (0..=stop)
        .rev()
        .find(|&i| is_space_separator(chars[i]))
        .unwrap_or(stop);

    let mut out: String = chars[..cut].iter().collect();
    out.push_str(omission);
    out
}

/// Unicode category Zs.
fn is_space_separator(c: char) -> bool {
    matches!(
        c,
        ' ' | '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}'
    )
}

/// Persona name, plus the real name in parentheses when one is set.
pub fn byline(author: &AuthorRecord) -> String {
    let name = escape_backticks(&author.personaname);
    match author.realname.as_deref().map(str::trim) {
        Some(real) if !real.is_empty() => format!("{name} ({})", escape_backticks(real)),
        _ => name,
    }
}

/// Whole calendar days between `today` and the (UTC) date of `updated`.
pub fn day_delta(today: NaiveDate, updated: i64) -> PreviewResult<i64> {
    let updated = DateTime::from_timestamp(updated, 0)
        .ok_or_else(|| PreviewError::malformed(format!("time_updated out of range: {updated}")))?;
    Ok((today - updated.date_naive()).num_days())
}

pub fn day_label(delta: i64) -> String {
    match delta {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        n => format!("{n} days ago"),
    }
}

pub fn is_fresh(delta: i64) -> bool {
    delta <= FRESH_DAYS
}

/// `1234567` -> `"1,234,567"`
pub fn delimited(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

const SIZE_UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Binary-scaled size with three significant digits, e.g. `1.18 MB`.
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return if bytes == 1 {
            "1 Byte".to_string()
        } else {
            format!("{bytes} Bytes")
        };
    }

    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < SIZE_UNITS.len() {
        value /= 1024.0;
        exponent += 1;
    }

    let digits = value.log10().floor() as i32 + 1;
    let factor = 10f64.powi(digits - 3);
    let rounded = (value / factor).round() * factor;
    let decimals = (3 - digits).max(0) as usize;

    let mut number = format!("{rounded:.decimals$}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{number} {}", SIZE_UNITS[exponent - 1])
}
