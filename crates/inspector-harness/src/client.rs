//! HTTP client creation and the optional request hook.
//!
//! One client is shared by the relay (forwarding to the real API) and the
//! test runner (sending cases to the inspector). Clones share the same
//! connection pool.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::error::HarnessError;

/// Body type for every request and response the harness builds.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Type alias for the underlying pooled client.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, ProxyBody>;

// Transport ceilings; there is no per-request deadline on top of these.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Mutates outgoing requests just before they hit the transport.
///
/// Typical use is injecting headers the API insists on, such as a
/// browser-like `User-Agent`.
pub trait RequestHook: Send + Sync + fmt::Debug {
    fn apply(&self, req: &mut Request<ProxyBody>);
}

/// Request hook that sets a fixed set of headers, replacing existing values.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HarnessError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name_str = name.as_ref();
            let header_name = HeaderName::from_bytes(name_str.as_bytes()).map_err(|e| {
                HarnessError::InvalidHeader {
                    name: name_str.to_string(),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value.as_ref()).map_err(|e| HarnessError::InvalidHeader {
                    name: name_str.to_string(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }
        Ok(Self { headers })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl RequestHook for DefaultHeaders {
    fn apply(&self, req: &mut Request<ProxyBody>) {
        for (name, value) in self.headers.iter() {
            req.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

/// Shared client with the request hook wired in front of the transport.
#[derive(Clone)]
pub struct InstrumentedClient {
    inner: HttpClient,
    hook: Option<Arc<dyn RequestHook>>,
}

impl InstrumentedClient {
    pub fn new(hook: Option<Arc<dyn RequestHook>>) -> Result<Self, HarnessError> {
        Ok(Self {
            inner: create_http_client()?,
            hook,
        })
    }

    /// The bare client, without the hook.
    pub fn raw(&self) -> &HttpClient {
        &self.inner
    }

    /// Send a request through the hook and the pooled transport.
    pub async fn send(
        &self,
        mut req: Request<ProxyBody>,
    ) -> Result<Response<Incoming>, HarnessError> {
        if let Some(hook) = &self.hook {
            hook.apply(&mut req);
        }
        debug!("Sending {} {}", req.method(), req.uri());
        Ok(self.inner.request(req).await?)
    }
}

/// Create the pooled HTTP/HTTPS client (HTTP/1.1, native root certificates).
pub fn create_http_client() -> Result<HttpClient, HarnessError> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(KEEPALIVE));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_provider_and_native_roots(rustls::crypto::ring::default_provider())
        .map_err(|e| HarnessError::Tls(format!("failed to load native root certificates: {e}")))?
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    Ok(Client::builder(TokioExecutor::new())
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build(https_connector))
}

pub fn empty_body() -> ProxyBody {
    BoxBody::new(Empty::<Bytes>::new().map_err(|never: Infallible| match never {}))
}

pub fn full_body(bytes: impl Into<Bytes>) -> ProxyBody {
    BoxBody::new(Full::new(bytes.into()).map_err(|never: Infallible| match never {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::USER_AGENT;

    #[test]
    fn test_default_headers_replace_existing() {
        let hook = DefaultHeaders::from_pairs([("User-Agent", "Mozilla/5.0")]).unwrap();
        let mut req = Request::builder()
            .uri("http://localhost/")
            .header(USER_AGENT, "hyper")
            .body(empty_body())
            .unwrap();

        hook.apply(&mut req);

        let values: Vec<_> = req.headers().get_all(USER_AGENT).iter().collect();
        assert_eq!(values, vec!["Mozilla/5.0"]);
    }

    #[test]
    fn test_default_headers_invalid_name() {
        let err = DefaultHeaders::from_pairs([("bad header", "x")]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidHeader { .. }));
    }

    #[test]
    fn test_default_headers_invalid_value() {
        let err = DefaultHeaders::from_pairs([("x-test", "line\nbreak")]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidHeader { .. }));
    }

    #[tokio::test]
    async fn test_full_body_roundtrip() {
        let body = full_body("hello");
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"hello");
    }
}
