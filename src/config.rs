//! Configuration module for SquidView.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Base URL of the log/ACL backend (default: "http://127.0.0.1:5000")
    pub backend_url: String,
    /// Seconds without a request before a browser session is dropped (default: 86400)
    pub session_idle_secs: u64,
    /// Seconds between sweeps for idle sessions (default: 300)
    pub session_sweep_secs: u64,
    /// Backend request timeout in seconds, 0 for none (default: 0)
    pub fetch_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            backend_url: "http://127.0.0.1:5000".to_string(),
            session_idle_secs: 86_400,
            session_sweep_secs: 300,
            fetch_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQUIDVIEW_HTTP_PORT`: HTTP port (default: 8080)
    /// - `SQUIDVIEW_BACKEND_URL`: backend base URL (default: "http://127.0.0.1:5000")
    /// - `SQUIDVIEW_SESSION_IDLE_SECS`: idle session lifetime (default: 86400)
    /// - `SQUIDVIEW_SESSION_SWEEP_SECS`: idle session sweep period (default: 300)
    /// - `SQUIDVIEW_FETCH_TIMEOUT_SECS`: request timeout, 0 disables it (default: 0)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(port_str) = lookup("SQUIDVIEW_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Some(url) = lookup("SQUIDVIEW_BACKEND_URL") {
            cfg.backend_url = url;
        }

        if let Some(secs) = lookup("SQUIDVIEW_SESSION_IDLE_SECS") {
            if let Ok(secs) = secs.parse() {
                cfg.session_idle_secs = secs;
            }
        }

        if let Some(secs) = lookup("SQUIDVIEW_SESSION_SWEEP_SECS") {
            match secs.parse() {
                Ok(secs) if secs > 0 => cfg.session_sweep_secs = secs,
                _ => {}
            }
        }

        if let Some(secs) = lookup("SQUIDVIEW_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                cfg.fetch_timeout_secs = secs;
            }
        }

        cfg
    }

    /// `None` when fetches may wait forever.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs)
    }
}
