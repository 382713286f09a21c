//! Configuration types for the harness.

mod file;
mod listen;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::client::RequestHook;
use crate::error::HarnessError;

pub use file::HarnessFile;
pub use listen::{
    listen_addr_from_env, resolve_listen_addr, DEFAULT_LISTEN_HOST, INSPECTOR_PORT_ENV,
};

/// Well-known host probed by the reachability gate.
pub const DEFAULT_PROBE_URL: &str = "https://google.com/";

/// Settings for one harness instance. Immutable once handed to
/// [`Harness::new`](crate::Harness::new).
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// URL of the API under test. Test case paths are relative to it.
    pub api_url: Url,
    /// Public URL of the inspector (its "baseUrl"). Test traffic goes here.
    pub inspector_url: Url,
    /// Relay listen address: `host` (port from `OPTIC_API_PORT`) or
    /// `host:port` (bypasses the inspector, debugging only).
    pub proxy_listen_addr: String,
    /// Optional hook applied to every outgoing request.
    pub request_hook: Option<Arc<dyn RequestHook>>,
    /// Dump relayed requests and responses to the log.
    pub debug_print: bool,
    /// If set, wait up to this long for internet access before starting.
    pub internet_check_timeout: Option<Duration>,
    /// URL probed by the reachability gate.
    pub probe_url: String,
}

impl HarnessConfig {
    pub fn new(api_url: &str, inspector_url: &str) -> Result<Self, HarnessError> {
        Ok(Self {
            api_url: parse_url(api_url)?,
            inspector_url: parse_url(inspector_url)?,
            proxy_listen_addr: DEFAULT_LISTEN_HOST.to_string(),
            request_hook: None,
            debug_print: false,
            internet_check_timeout: None,
            probe_url: DEFAULT_PROBE_URL.to_string(),
        })
    }

    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.proxy_listen_addr = addr.into();
        self
    }

    pub fn with_request_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.request_hook = Some(hook);
        self
    }

    pub fn with_debug_print(mut self, enabled: bool) -> Self {
        self.debug_print = enabled;
        self
    }

    pub fn with_internet_check(mut self, timeout: Duration) -> Self {
        self.internet_check_timeout = Some(timeout);
        self
    }

    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = url.into();
        self
    }

    /// Resolve the relay listen address (reads `OPTIC_API_PORT` when no port is given).
    pub fn listen_addr(&self) -> Result<String, HarnessError> {
        listen_addr_from_env(&self.proxy_listen_addr)
    }
}

/// Parse an absolute URL, mapping failures to [`HarnessError::InvalidUrl`].
pub fn parse_url(raw: &str) -> Result<Url, HarnessError> {
    Url::parse(raw).map_err(|e| HarnessError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}
