//! JSON file cache for market data responses
//!
//! Cache keys are the hex SHA-256 digest of `symbol|start|end|interval`,
//! so identical requests always hit the same file. Files are stored as
//! `<key>.json` inside the cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::types::Candle;

pub struct JsonFileCache {
    cache_dir: PathBuf,
}

impl JsonFileCache {
    /// Create the cache, making the directory if needed.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("failed to create cache dir {}", cache_dir.display()))?;
        Ok(JsonFileCache { cache_dir })
    }

    /// Deterministic cache key for a request.
    pub fn make_key(symbol: &str, start: &str, end: &str, interval: &str) -> String {
        let raw = format!("{symbol}|{start}|{end}|{interval}");
        hex::encode(Sha256::digest(raw.as_bytes()))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }

    pub fn has(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    /// Retrieve cached candles; fails when the key is absent.
    pub fn get(&self, key: &str) -> Result<Vec<Candle>> {
        let path = self.path(key);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("cache miss for key {key:?}"))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("corrupt cache entry {}", path.display()))
    }

    pub fn set(&self, key: &str, candles: &[Candle]) -> Result<()> {
        let path = self.path(key);
        let json = serde_json::to_string(candles).context("failed to serialize candles")?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write cache entry {}", path.display()))?;
        Ok(())
    }

    /// Remove one entry; missing entries are ignored.
    pub fn clear(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove cache entry {}", path.display()))?;
        }
        Ok(())
    }

    /// Remove every cached entry.
    pub fn clear_all(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir).context("failed to read cache dir")? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}
