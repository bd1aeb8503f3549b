//! Versioned shopper preferences persisted as a single JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::catalog::{Currency, RecentSearches};
use crate::client::ClientError;

pub const PREFERENCES_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub version: u32,
    #[serde(default)]
    pub selected_currency: Currency,
    #[serde(default)]
    pub recent_searches: RecentSearches,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            selected_currency: Currency::default(),
            recent_searches: RecentSearches::new(),
        }
    }
}

pub struct PreferenceStore {
    path: PathBuf,
    current: Mutex<Preferences>,
}

impl PreferenceStore {
    /// Reads `path`. A missing file starts from defaults; an unreadable or
    /// unknown-version file is replaced by defaults on the next write.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_preferences(&path).await {
            Ok(Some(prefs)) if prefs.version == PREFERENCES_VERSION => prefs,
            Ok(Some(prefs)) => {
                tracing::warn!(path = %path.display(), version = prefs.version, "unsupported preferences version; using defaults");
                Preferences::default()
            }
            Ok(None) => Preferences::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable preferences file; using defaults");
                Preferences::default()
            }
        };
        Self { path, current: Mutex::new(current) }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub async fn get(&self) -> Preferences {
        self.current.lock().await.clone()
    }

    pub async fn set_currency(&self, currency: Currency) -> Result<(), ClientError> {
        self.update(|prefs| prefs.selected_currency = currency).await
    }

    pub async fn set_recent_searches(&self, recent: RecentSearches) -> Result<(), ClientError> {
        self.update(|prefs| prefs.recent_searches = recent).await
    }

    pub async fn clear_recent_searches(&self) -> Result<(), ClientError> {
        self.update(|prefs| prefs.recent_searches.clear()).await
    }

    // The lock is held across the write so concurrent updates land in order.
    async fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<(), ClientError> {
        let mut current = self.current.lock().await;
        let mut next = current.clone();
        apply(&mut next);
        next.version = PREFERENCES_VERSION;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&next)?).await?;
        *current = next;
        Ok(())
    }
}

async fn read_preferences(path: &Path) -> Result<Option<Preferences>, ClientError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
