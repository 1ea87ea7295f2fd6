//! Per-host HTTP client pool.
//!
//! A crawl talks to the same few hosts over and over, so each destination
//! authority (host plus explicit port) keeps one long-lived [`Client`] whose
//! connections are reused across requests. Clients are created lazily on
//! first use, lent out through a [`PooledClient`] guard and returned to the
//! pool when the guard drops.

use crate::config::HttpConfig;
use crate::{Error, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use url::Url;

/// Lazily populated set of per-host clients.
#[derive(Debug)]
pub struct ClientPool {
    settings: HttpConfig,
    idle: Mutex<HashMap<String, Client>>,
    created: AtomicUsize,
}

impl ClientPool {
    /// Create an empty pool whose clients use `settings`.
    #[must_use]
    pub fn new(settings: HttpConfig) -> Self {
        Self {
            settings,
            idle: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Borrow the client for `url`'s host, creating it if needed.
    pub fn acquire(&self, url: &Url) -> Result<PooledClient<'_>> {
        let key = pool_key(url);
        let existing = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);

        let client = match existing {
            Some(client) => client,
            None => {
                debug!(host = %key, "Creating pooled HTTP client");
                let client = self.build_client()?;
                self.created.fetch_add(1, Ordering::Relaxed);
                client
            },
        };

        Ok(PooledClient {
            pool: self,
            key,
            client,
        })
    }

    /// Dispose every idle client.
    pub fn clear(&self) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(
            idle = idle.len(),
            created = self.created_count(),
            "Disposing pooled HTTP clients"
        );
        idle.clear();
    }

    /// Number of clients currently parked in the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of clients built over the pool's lifetime.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.settings.timeout())
            .user_agent(self.settings.user_agent.as_str())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)
    }

    fn release(&self, key: String, client: Client) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(client);
    }
}

/// A client on loan from a [`ClientPool`]; returned when dropped.
#[derive(Debug)]
pub struct PooledClient<'a> {
    pool: &'a ClientPool,
    key: String,
    client: Client,
}

impl PooledClient<'_> {
    /// Pool key (`host` or `host:port`) this client belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Deref for PooledClient<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.client
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        // Client handles share one connection pool, so parking a clone is enough
        self.pool
            .release(std::mem::take(&mut self.key), self.client.clone());
    }
}

fn pool_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_client_reused_per_host() {
        let pool = ClientPool::new(HttpConfig::default());

        {
            let first = pool.acquire(&url("https://ex.org/a.html")).unwrap();
            assert_eq!(first.key(), "ex.org");
            assert_eq!(pool.idle_count(), 0);
        }
        assert_eq!(pool.idle_count(), 1);

        let _again = pool.acquire(&url("https://EX.org/b.html")).unwrap();
        assert_eq!(pool.created_count(), 1);
    }

    #[test]
    fn test_port_is_part_of_key() {
        let pool = ClientPool::new(HttpConfig::default());
        drop(pool.acquire(&url("http://127.0.0.1:8080/")).unwrap());
        drop(pool.acquire(&url("http://127.0.0.1:9090/")).unwrap());
        drop(pool.acquire(&url("http://127.0.0.1:8080/x")).unwrap());

        assert_eq!(pool.created_count(), 2);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_clear_disposes_idle_clients() {
        let pool = ClientPool::new(HttpConfig::default());
        drop(pool.acquire(&url("https://a.example/")).unwrap());
        drop(pool.acquire(&url("https://b.example/")).unwrap());
        assert_eq!(pool.idle_count(), 2);

        pool.clear();
        assert_eq!(pool.idle_count(), 0);

        drop(pool.acquire(&url("https://a.example/")).unwrap());
        assert_eq!(pool.created_count(), 3);
    }
}
