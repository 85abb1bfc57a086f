//! Resolve a track source to its bytes.
//!
//! Sources are `http(s)://` URLs (catalog previews), `file://` URLs or bare paths
//! (local catalogs). Bytes are held only while the source stays assigned.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Local filesystem path for `source`, or `None` for remote URLs.
pub fn local_path(source: &str) -> Option<PathBuf> {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(url) if url.scheme().len() > 1 => None,
        // Bare paths; single-letter "schemes" are Windows drive letters.
        _ => Some(PathBuf::from(source)),
    }
}

/// Cheap to clone; clones share one lazily built HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<Mutex<Option<reqwest::blocking::Client>>>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Arc::new(Mutex::new(None)),
            timeout,
        }
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        let mut slot = match self.client.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(c) = slot.as_ref() {
            return Ok(c.clone());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Blocks for up to the configured timeout on remote sources.
    pub fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        if let Some(path) = local_path(source) {
            return Ok(fs::read(path)?);
        }

        let bytes = self
            .client()?
            .get(source)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(Error::Fetch)?;
        Ok(bytes.to_vec())
    }
}
