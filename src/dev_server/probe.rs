//! Debounced dev server health check.
//!
//! # Responsibilities
//! - Probe the dev server at most once per validity window
//! - Convert every failure into a cached "down"

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tokio::time;
use url::Url;

use crate::config::Config;
use crate::dev_server::state::{ProbeCache, ProbeState};
use crate::observability::metrics;

/// How long a probe result is trusted.
pub const PROBE_WINDOW: Duration = Duration::from_secs(1);

/// Time allowed for the response once connected, on top of the connect timeout.
const RESPONSE_GRACE: Duration = Duration::from_secs(1);

/// Cached liveness check bound to one config.
pub struct LivenessProbe {
    url: Option<Url>,
    connect_timeout: Duration,
    window: Duration,
    client: Option<Client>,
    cache: Mutex<ProbeCache>,
    probes_sent: AtomicU64,
}

impl LivenessProbe {
    pub fn new(config: &Config) -> Self {
        let url = match config.dev_server_url() {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, "Dev server URL is invalid, probe will report down");
                None
            }
        };

        let client = match build_client(config.dev_server_connect_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build dev server probe client");
                None
            }
        };

        Self {
            url,
            connect_timeout: config.dev_server_connect_timeout,
            window: PROBE_WINDOW,
            client,
            cache: Mutex::new(ProbeCache::new()),
            probes_sent: AtomicU64::new(0),
        }
    }

    /// Override the validity window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Whether the dev server answered, reusing a result younger than the window.
    ///
    /// Concurrent callers queue on the cache lock, so a stale cache triggers
    /// exactly one request and everyone waiting sees its outcome.
    pub async fn is_up(&self) -> bool {
        let mut cache = self.cache.lock().await;
        if let Some(up) = cache.fresh(self.window, Instant::now()) {
            return up;
        }

        let up = self.check().await;
        cache.record(up, Instant::now());
        metrics::record_probe(up);
        up
    }

    pub async fn state(&self) -> ProbeState {
        self.cache.lock().await.state()
    }

    /// Number of HTTP requests issued so far.
    pub fn probes_sent(&self) -> u64 {
        self.probes_sent.load(Ordering::Relaxed)
    }

    async fn check(&self) -> bool {
        let (Some(client), Some(url)) = (&self.client, &self.url) else {
            return false;
        };

        self.probes_sent.fetch_add(1, Ordering::Relaxed);
        let response_future = client.get(url.clone()).send();

        match time::timeout(self.connect_timeout + RESPONSE_GRACE, response_future).await {
            Ok(Ok(response)) => {
                let status = response.status();
                let up = status == StatusCode::OK || status == StatusCode::NOT_FOUND;
                if !up {
                    tracing::debug!(url = %url, status = %status, "Dev server probe failed: unexpected status");
                }
                up
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %url, error = %e, "Dev server probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(url = %url, "Dev server probe failed: timeout");
                false
            }
        }
    }
}

fn build_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Client::builder()
        .default_headers(headers)
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true)
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
}
