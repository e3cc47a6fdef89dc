use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::table::default_table;
use super::{EmojiTarget, normalize};
use crate::utils::error::RelayError;
use crate::utils::metrics::Metrics;

const ALIAS_PREFIX: &str = "alias:";
const MAX_ALIAS_HOPS: usize = 8;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Where the custom emoji listing comes from. `SlackClient` implements this
/// with `emoji.list`.
#[async_trait]
pub trait EmojiDirectorySource: Send + Sync {
    async fn fetch_emoji_directory(&self) -> Result<EmojiDirectory, RelayError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    Image(String),
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEmoji {
    Image(String),
    Glyph(String),
}

impl ResolvedEmoji {
    pub fn into_text(self) -> String {
        match self {
            Self::Image(url) | Self::Glyph(url) => url,
        }
    }
}

/// Custom emoji name to image URL or alias marker, as `emoji.list` returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl EmojiDirectory {
    pub fn from_listing<I, K, V>(listing: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let entries = listing
            .into_iter()
            .map(|(name, value)| {
                let value = value.as_ref();
                let entry = match value.strip_prefix(ALIAS_PREFIX) {
                    Some(target) => DirectoryEntry::Alias(target.to_string()),
                    None => DirectoryEntry::Image(value.to_string()),
                };
                (name.into(), entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follows alias markers until an image is found. An alias that leaves the
    /// directory (`alias:thumbsup`) resolves through the builtin table.
    pub fn resolve(&self, name: &str) -> Option<ResolvedEmoji> {
        let mut current = name;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.entries.get(current) {
                Some(DirectoryEntry::Image(url)) => return Some(ResolvedEmoji::Image(url.clone())),
                Some(DirectoryEntry::Alias(target)) => current = target.as_str(),
                None if current == name => return None,
                None => {
                    let glyph = normalize(current, EmojiTarget::Display);
                    return default_table()
                        .name_for(&glyph)
                        .map(|_| ResolvedEmoji::Glyph(glyph));
                }
            }
        }
        warn!("emoji alias chain too long name={}", name);
        None
    }
}

struct CacheEntry {
    directory: Arc<EmojiDirectory>,
    fetched_at: DateTime<Utc>,
}

/// Time-cached snapshot of the workspace's custom emoji. Snapshots are swapped
/// whole; readers never see a partially updated directory.
pub struct EmojiDirectoryCache {
    source: Arc<dyn EmojiDirectorySource>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    entry: RwLock<Option<Arc<CacheEntry>>>,
}

impl EmojiDirectoryCache {
    pub fn new(
        source: Arc<dyn EmojiDirectorySource>,
        clock: Arc<dyn Clock>,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            source,
            clock,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Arc<EmojiDirectory> {
        let cached = self.entry.read().clone();
        if let Some(entry) = cached
            && self.clock.now() - entry.fetched_at < self.ttl
        {
            Metrics::emoji_cache_hit();
            return entry.directory.clone();
        }

        Metrics::emoji_cache_miss();
        self.refresh().await
    }

    /// Fetches unconditionally. On failure the previous snapshot (or an empty
    /// directory) is returned and kept.
    pub async fn refresh(&self) -> Arc<EmojiDirectory> {
        match self.source.fetch_emoji_directory().await {
            Ok(directory) => {
                let directory = Arc::new(directory);
                info!("emoji directory refreshed entries={}", directory.len());
                *self.entry.write() = Some(Arc::new(CacheEntry {
                    directory: directory.clone(),
                    fetched_at: self.clock.now(),
                }));
                directory
            }
            Err(err) => {
                Metrics::emoji_cache_refresh_failed();
                warn!("failed to refresh emoji directory: {}", err);
                match self.entry.read().as_ref() {
                    Some(entry) => {
                        debug!("serving stale emoji directory fetched_at={}", entry.fetched_at);
                        entry.directory.clone()
                    }
                    None => Arc::new(EmojiDirectory::default()),
                }
            }
        }
    }

    pub fn snapshot_age(&self) -> Option<TimeDelta> {
        self.entry
            .read()
            .as_ref()
            .map(|entry| self.clock.now() - entry.fetched_at)
    }

    pub fn snapshot_len(&self) -> usize {
        self.entry
            .read()
            .as_ref()
            .map(|entry| entry.directory.len())
            .unwrap_or(0)
    }
}
