//! Declarative test cases and URL construction.

use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::HarnessError;

/// One HTTP call expected to come back `200 OK`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestCase {
    /// Name used in logs and error messages.
    pub name: String,
    /// JSON body; `None` sends no body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Path relative to the API base URL, optionally with a query string.
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            payload: None,
            path: path.into(),
            method: method.into(),
        }
    }

    /// Attach any serializable value as the JSON payload.
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Result<Self, HarnessError> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn http_method(&self) -> Result<Method, HarnessError> {
        let upper = self.method.trim().to_ascii_uppercase();
        Method::from_bytes(upper.as_bytes())
            .map_err(|_| HarnessError::InvalidMethod(self.method.clone()))
    }
}

/// Join URL paths and clean the result: empty and `.` segments vanish, `..`
/// pops, the result is absolute and has no trailing slash.
pub fn join_paths(base: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// URL a test case is sent to: the inspector's origin, the API's base path,
/// then the case path. Requests always go through the inspector.
pub fn test_url(inspector_url: &Url, api_url: &Url, case_path: &str) -> Url {
    let (path, query) = match case_path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (case_path, None),
    };

    let mut url = inspector_url.clone();
    url.set_path(&join_paths(api_url.path(), path));
    url.set_query(query);
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/json"), "/json");
        assert_eq!(join_paths("/", "json"), "/json");
        assert_eq!(join_paths("/v1/", "users/1/"), "/v1/users/1");
        assert_eq!(join_paths("/v1", "./users//1"), "/v1/users/1");
        assert_eq!(join_paths("/v1/api", "../x"), "/v1/x");
        assert_eq!(join_paths("/", "../../x"), "/x");
        assert_eq!(join_paths("/", ""), "/");
    }

    #[test]
    fn test_url_goes_to_inspector() {
        let inspector = Url::parse("http://localhost:8889").unwrap();
        let api = Url::parse("https://ipleak.net/").unwrap();
        let url = test_url(&inspector, &api, "/json");
        assert_eq!(url.as_str(), "http://localhost:8889/json");
    }

    #[test]
    fn test_url_keeps_api_base_path_and_query() {
        let inspector = Url::parse("http://localhost:8889/").unwrap();
        let api = Url::parse("https://example.com/api/v2/").unwrap();
        let url = test_url(&inspector, &api, "items?filter=a/b");
        assert_eq!(url.as_str(), "http://localhost:8889/api/v2/items?filter=a/b");
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(TestCase::new("a", "get", "/").http_method().unwrap(), Method::GET);
        assert_eq!(TestCase::new("a", "PATCH", "/").http_method().unwrap(), Method::PATCH);
        assert!(matches!(
            TestCase::new("a", "GE T", "/").http_method(),
            Err(HarnessError::InvalidMethod(_))
        ));
    }

    #[test]
    fn test_with_payload() {
        #[derive(Serialize)]
        struct Login {
            user: &'static str,
            remember: bool,
        }

        let case = TestCase::new("login", "POST", "/login")
            .with_payload(&Login {
                user: "alice",
                remember: true,
            })
            .unwrap();
        let payload = case.payload.unwrap();
        assert_eq!(payload["user"], "alice");
        assert_eq!(payload["remember"], true);
    }

    #[test]
    fn test_deserialize_defaults_method() {
        let case: TestCase = serde_json::from_str(r#"{"name": "x", "path": "/json"}"#).unwrap();
        assert_eq!(case.method, "GET");
        assert!(case.payload.is_none());
    }
}
