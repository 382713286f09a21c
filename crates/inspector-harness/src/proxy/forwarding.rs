//! Request forwarding from the relay to the real API.
//!
//! Each inbound request is turned into a fresh outbound request; nothing
//! from the inbound request object is mutated or reused apart from its
//! method, headers and body stream.

use std::convert::Infallible;

use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode, Uri};
use tracing::{error, info};
use url::Url;

use super::dump::{dump_request, dump_response};
use super::headers::{copy_request_headers, copy_response_headers};
use crate::client::{full_body, InstrumentedClient, ProxyBody};
use crate::error::HarnessError;
use crate::stream::ErrorSink;

/// Everything a relay call needs, shared by all connections.
pub(crate) struct RelayContext {
    pub api_url: Url,
    pub client: InstrumentedClient,
    pub sink: ErrorSink,
    pub debug_print: bool,
}

/// Resolve the inbound request target against the API base URL.
///
/// Inbound targets are origin-form (`/path?query`), so resolution keeps the
/// API's scheme and authority and takes path and query from the request.
pub fn upstream_uri(api_url: &Url, inbound: &Uri) -> Result<Uri, HarnessError> {
    let mut target = api_url.clone();
    target.set_path(inbound.path());
    target.set_query(inbound.query());
    target.set_fragment(None);

    target
        .as_str()
        .parse::<Uri>()
        .map_err(|e| HarnessError::InvalidUrl {
            url: target.to_string(),
            reason: e.to_string(),
        })
}

/// Helper function to create an error response.
pub fn error_response(status: StatusCode, message: &str) -> Response<ProxyBody> {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// hyper service entry point for one relayed request.
///
/// Failures are reported on the error sink and answered with `502`; they
/// never take the listener down.
pub(crate) async fn relay_request(
    ctx: &RelayContext,
    req: Request<Incoming>,
) -> Result<Response<ProxyBody>, Infallible> {
    let request_uri = req.uri().to_string();
    let path = req.uri().path().to_string();
    info!("Proxy received: {}", request_uri);

    let response = match forward(ctx, req).await {
        Ok(response) => {
            info!("Forwarded {} for {}", response.status(), request_uri);
            response
        }
        Err(err) => {
            error!("Relay of {} failed: {}", request_uri, err);
            ctx.sink.report(err);
            error_response(StatusCode::BAD_GATEWAY, "Bad Gateway")
        }
    };

    info!("Done with: {}", path);
    Ok(response)
}

async fn forward(
    ctx: &RelayContext,
    req: Request<Incoming>,
) -> Result<Response<ProxyBody>, HarnessError> {
    let (parts, body) = req.into_parts();
    let uri = upstream_uri(&ctx.api_url, &parts.uri)?;

    let outbound = if ctx.debug_print {
        // Dumping needs the whole body; buffer it and forward the copy.
        let bytes = body.collect().await?.to_bytes();
        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            .body(full_body(bytes.clone()))?;
        copy_request_headers(&parts.headers, outbound.headers_mut());
        let (head, body) = outbound.into_parts();
        info!("{}", dump_request(&head, &bytes));
        Request::from_parts(head, body)
    } else {
        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            .body(BoxBody::new(body))?;
        copy_request_headers(&parts.headers, outbound.headers_mut());
        outbound
    };

    let upstream = ctx.client.send(outbound).await?;
    let (upstream_parts, upstream_body) = upstream.into_parts();

    let body = if ctx.debug_print {
        let bytes = upstream_body.collect().await?.to_bytes();
        info!("{}", dump_response(&upstream_parts, &bytes));
        full_body(bytes)
    } else {
        // Streamed through; errors surfacing mid-body are reported as they happen.
        let sink = ctx.sink.clone();
        BoxBody::new(upstream_body.map_err(move |e| {
            sink.report(HarnessError::Stream(e.to_string()));
            e
        }))
    };

    let mut response = Response::new(body);
    *response.status_mut() = upstream_parts.status;
    copy_response_headers(&upstream_parts.headers, response.headers_mut());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_upstream_uri_replaces_origin() {
        let inbound: Uri = "/json".parse().unwrap();
        let uri = upstream_uri(&api("https://ipleak.net/"), &inbound).unwrap();
        assert_eq!(uri.to_string(), "https://ipleak.net/json");
    }

    #[test]
    fn test_upstream_uri_keeps_query() {
        let inbound: Uri = "/v1/users?page=2&limit=10".parse().unwrap();
        let uri = upstream_uri(&api("http://127.0.0.1:9000/v1/"), &inbound).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:9000/v1/users?page=2&limit=10");
    }

    #[test]
    fn test_upstream_uri_from_absolute_form() {
        let inbound: Uri = "http://localhost:8889/status".parse().unwrap();
        let uri = upstream_uri(&api("https://api.ipify.org/"), &inbound).unwrap();
        assert_eq!(uri.to_string(), "https://api.ipify.org/status");
    }

    #[test]
    fn test_upstream_uri_ignores_double_slash_authority() {
        let inbound: Uri = "//evil.example/x".parse().unwrap();
        let uri = upstream_uri(&api("https://api.ipify.org/"), &inbound).unwrap();
        assert_eq!(uri.host(), Some("api.ipify.org"));
    }

    #[tokio::test]
    async fn test_error_response() {
        let response = error_response(StatusCode::BAD_GATEWAY, "Bad Gateway");
        assert_eq!(response.status(), 502);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"Bad Gateway"}"#);
    }
}
