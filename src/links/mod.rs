//! Finding workshop links in chat text.
//!
//! Messages are scanned for anything that looks like an absolute URL. URLs the
//! author wrapped in `<...>` (Discord's "don't embed" syntax) are flagged as
//! suppressed and never looked up. The rest are matched against the
//! configured [`LinkPattern`] to recover the workshop item id.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::LinkPattern;
use crate::errors::{PreviewError, PreviewResult};

/// Scheme, `://`, host, then path/query/fragment, all in ASCII URI characters.
/// The scheme must not follow an ASCII alphanumeric; the URL itself is group 1.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^A-Za-z0-9])([A-Za-z][A-Za-z0-9+.\-]*://[!$%&'()*+,\-.0-9:;=@A-Z_a-z~]+[!#$%&'()*+,\-./0-9:;=?@A-Z_a-z~]*)",
    )
    .expect("hardcoded regex")
});

/// A URL found in message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub suppressed: bool,
}

/// A URL that points at a workshop item page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopLink {
    /// The URL exactly as the user posted it.
    pub url: String,
    /// Raw value of the id query parameter.
    pub id: String,
}

impl WorkshopLink {
    pub fn item_id(&self) -> PreviewResult<u64> {
        self.id
            .parse()
            .map_err(|_| PreviewError::InvalidItemId(self.id.clone()))
    }
}

/// Path components of a Steam preview image, as consumed by the image proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub kind: String,
    pub arg0: String,
    pub arg1: String,
}

/// Every URL-looking token in `text`, first occurrence first, without duplicates.
pub fn extract(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

/// Flag URLs that appear as `<url>` somewhere in the original text.
pub fn mark_suppressed(urls: Vec<String>, text: &str) -> Vec<CandidateUrl> {
    urls.into_iter()
        .map(|url| {
            let suppressed = text.contains(&format!("<{url}>"));
            CandidateUrl { url, suppressed }
        })
        .collect()
}

pub fn candidates(text: &str) -> Vec<CandidateUrl> {
    mark_suppressed(extract(text), text)
}

pub struct LinkMatcher {
    pattern: LinkPattern,
}

impl LinkMatcher {
    pub fn new(pattern: LinkPattern) -> Self {
        Self { pattern }
    }

    /// Workshop links among the message's URLs, skipping suppressed ones.
    pub fn workshop_links(&self, text: &str) -> Vec<WorkshopLink> {
        candidates(text)
            .into_iter()
            .filter(|c| !c.suppressed)
            .filter_map(|c| self.matches(&c.url))
            .collect()
    }

    /// Match `raw` against the workshop link pattern.
    ///
    /// Query parameters other than the id are ignored. Anything that isn't a
    /// workshop item link yields `None`.
    pub fn matches(&self, raw: &str) -> Option<WorkshopLink> {
        let url = Url::parse(raw).ok()?;
        let p = &self.pattern;

        if !p.schemes.iter().any(|s| s == url.scheme()) {
            return None;
        }
        if url.host_str()? != p.host || url.port().is_some() {
            return None;
        }

        let segments: Vec<&str> = url.path_segments()?.collect();
        let shape_ok = match segments.as_slice() {
            [section, action] | [section, action, ""] => {
                p.sections.iter().any(|s| s.as_str() == *section) && *action == p.action
            }
            _ => false,
        };
        if !shape_ok {
            return None;
        }

        let id = url
            .query_pairs()
            .find(|(key, _)| *key == p.id_param)
            .map(|(_, value)| value.into_owned())?;

        Some(WorkshopLink {
            url: raw.to_string(),
            id,
        })
    }
}

/// Split a Steam preview image URL into the proxy's `{type}/{arg0}/{arg1}`.
///
/// Only `ugc` images are understood; anything else means Steam changed how it
/// serves previews and the item is not rendered.
pub fn parse_preview_url(raw: &str) -> PreviewResult<PreviewImage> {
    let url = Url::parse(raw).map_err(|e| PreviewError::malformed(format!("preview_url {raw}: {e}")))?;
    let mut parts = url.path().split('/').skip(1);

    let kind = parts.next().unwrap_or_default();
    if kind != "ugc" {
        return Err(PreviewError::UnsupportedPreviewFormat(kind.to_string()));
    }

    match (parts.next(), parts.next()) {
        (Some(arg0), Some(arg1)) if !arg0.is_empty() && !arg1.is_empty() => Ok(PreviewImage {
            kind: kind.to_string(),
            arg0: arg0.to_string(),
            arg1: arg1.to_string(),
        }),
        _ => Err(PreviewError::malformed(format!(
            "preview_url {raw} is missing path arguments"
        ))),
    }
}
