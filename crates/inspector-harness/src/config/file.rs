//! File-backed harness configuration (YAML or JSON).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{parse_url, HarnessConfig, DEFAULT_LISTEN_HOST, DEFAULT_PROBE_URL};
use crate::client::{DefaultHeaders, RequestHook};
use crate::error::HarnessError;
use crate::harness::TestCase;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarnessFile {
    pub api_url: String,
    pub inspector_url: String,
    #[serde(default = "default_listen_addr")]
    pub proxy_listen_addr: String,
    #[serde(default)]
    pub debug_print: bool,
    /// Seconds to wait for internet access; omitted or 0 skips the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_check_timeout_secs: Option<u64>,
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// Headers set on every outgoing request (e.g. a browser User-Agent).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_HOST.to_string()
}

fn default_probe_url() -> String {
    DEFAULT_PROBE_URL.to_string()
}

impl HarnessFile {
    /// Load from disk. YAML is a superset of JSON, so both formats parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
                path: path.display().to_string(),
                source,
            })?;
        serde_yaml::from_str(&contents).map_err(|source| HarnessError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Split into the runtime configuration and the ordered test cases.
    pub fn into_parts(self) -> Result<(HarnessConfig, Vec<TestCase>), HarnessError> {
        let request_hook = if self.default_headers.is_empty() {
            None
        } else {
            let headers = DefaultHeaders::from_pairs(&self.default_headers)?;
            Some(Arc::new(headers) as Arc<dyn RequestHook>)
        };

        let config = HarnessConfig {
            api_url: parse_url(&self.api_url)?,
            inspector_url: parse_url(&self.inspector_url)?,
            proxy_listen_addr: self.proxy_listen_addr,
            request_hook,
            debug_print: self.debug_print,
            internet_check_timeout: self
                .internet_check_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            probe_url: self.probe_url,
        };

        Ok((config, self.tests))
    }
}
