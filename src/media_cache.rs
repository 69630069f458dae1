use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use spdlog::{debug, trace};

use crate::content::is_storage_path;

/// Resolution state of a storage path. Failures and lookups that never
/// happened look the same to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaState {
    Pending,
    Resolved(String),
}

pub enum Expire {
    Never,
    After(Duration),
}

/// The signed-URL service that turns `media/...` paths into fetchable URLs.
pub trait MediaResolver {
    fn resolve(&self, path: &str) -> Result<String, String>;
}

/// Serves storage paths from a fixed public base URL.
pub struct PrefixResolver {
    pub base_url: String,
}

impl MediaResolver for PrefixResolver {
    fn resolve(&self, path: &str) -> Result<String, String> {
        if self.base_url.is_empty() {
            return Err("no media base URL configured".to_string());
        }
        let base = self.base_url.trim_end_matches('/');
        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }
}

struct CacheValue {
    expire_date: DateTime<Utc>,
    url: String,
}

/// Path → signed URL lookups shared by every render of a page.
pub struct MediaUrlCache {
    entries: RwLock<HashMap<String, CacheValue>>,
}

impl Default for MediaUrlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaUrlCache {
    pub fn new() -> Self {
        MediaUrlCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, path: &str, url: String, expire_after: Expire) {
        let expire_date = match expire_after {
            Expire::Never => DateTime::<Utc>::MAX_UTC,
            Expire::After(duration) => Utc::now() + duration,
        };

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(path.to_string(), CacheValue { expire_date, url });
        }
    }

    pub fn get(&self, path: &str) -> MediaState {
        let Ok(entries) = self.entries.read() else {
            return MediaState::Pending;
        };
        match entries.get(path) {
            Some(value) if Utc::now() <= value.expire_date => MediaState::Resolved(value.url.clone()),
            Some(_) => {
                trace!("media url expired for {}", path);
                MediaState::Pending
            }
            None => MediaState::Pending,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves every storage path that is not currently cached. Failed
    /// lookups are logged and stay pending. Returns how many were resolved.
    pub fn resolve_missing<'a, I, R>(&self, paths: I, resolver: &R, expire_after: Option<Duration>) -> usize
    where
        I: IntoIterator<Item = &'a str>,
        R: MediaResolver + ?Sized,
    {
        let mut resolved = 0;
        for path in paths {
            if !is_storage_path(path) || self.get(path) != MediaState::Pending {
                continue;
            }
            match resolver.resolve(path) {
                Ok(url) => {
                    let expire = expire_after.map(Expire::After).unwrap_or(Expire::Never);
                    self.insert(path, url, expire);
                    resolved += 1;
                }
                Err(e) => debug!("media path {} left pending: {}", path, e),
            }
        }
        resolved
    }
}
