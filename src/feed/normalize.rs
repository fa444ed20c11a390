//! Conversion of parsed documents into feed and article records.

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed as ParsedFeed, Link};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::fetcher::FeedFetcher;
use super::types::{
    ArticleRecord, FeedRecord, NormalizedFeed, ParseOutcome, DEFAULT_ARTICLE_TITLE,
    SYNTHETIC_ID_PREFIX,
};
use crate::{FoloError, Result};

/// Fetch `url` and normalize the document.
///
/// An unreadable document becomes [`FoloError::FeedUnreadable`]; fetch
/// warnings are carried into the returned [`NormalizedFeed`].
pub async fn fetch_and_normalize(fetcher: &FeedFetcher, url: &str) -> Result<NormalizedFeed> {
    match fetcher.fetch(url).await? {
        ParseOutcome::Usable { feed, warnings } => {
            let mut normalized = normalize(url, &feed, Utc::now(), fetcher.max_content_length());
            if !warnings.is_empty() || !normalized.warnings.is_empty() {
                let mut all = warnings;
                all.append(&mut normalized.warnings);
                for warning in &all {
                    warn!(feed = %url, "{}", warning);
                }
                normalized.warnings = all;
            }
            Ok(normalized)
        }
        ParseOutcome::Unreadable { reason } => Err(FoloError::FeedUnreadable {
            url: url.to_string(),
            reason,
        }),
    }
}

/// Normalize a parsed document.
///
/// Pure: `now` stands in for both the fetch time and the publish time of
/// undated entries.
pub fn normalize(
    url: &str,
    feed: &ParsedFeed,
    now: DateTime<Utc>,
    max_content_length: usize,
) -> NormalizedFeed {
    let title = feed
        .title
        .as_ref()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())
        .map_or_else(|| url.to_string(), str::to_string);

    let record = FeedRecord {
        url: url.to_string(),
        title,
        site_link: site_link(&feed.links),
        last_fetched_at: now,
    };

    let mut warnings = Vec::new();
    let articles = feed
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(index, entry, now, max_content_length, &mut warnings))
        .collect();

    NormalizedFeed {
        feed: record,
        articles,
        warnings,
    }
}

fn site_link(links: &[Link]) -> String {
    links
        .iter()
        .find(|l| l.rel.as_deref() != Some("self"))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

fn normalize_entry(
    index: usize,
    entry: &Entry,
    now: DateTime<Utc>,
    max_content_length: usize,
    warnings: &mut Vec<String>,
) -> ArticleRecord {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ARTICLE_TITLE.to_string());

    let content = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .filter(|s| !s.is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()))
        .map(|s| truncate_chars(s, max_content_length))
        .unwrap_or_default();

    let url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let external_id = if !entry.id.is_empty() {
        entry.id.clone()
    } else if !url.is_empty() {
        url.clone()
    } else {
        let id = synthetic_id(&title, &content);
        warnings.push(format!(
            "entry {} (\"{}\") has no id or link, using {}",
            index + 1,
            title,
            id
        ));
        id
    };

    ArticleRecord {
        external_id,
        title,
        content,
        url,
        published_at: entry.published.unwrap_or(now),
    }
}

/// Deterministic id for an entry with neither id nor link.
pub fn synthetic_id(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{}{:x}", SYNTHETIC_ID_PREFIX, hasher.finalize())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
