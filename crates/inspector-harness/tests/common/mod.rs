//! Shared helpers for harness integration tests.
//!
//! The mock API stands in for the real upstream; the harness runs in bypass
//! mode (`host:port` listen address), so the "inspector" URL points straight
//! at the relay.

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use inspector_harness::HarnessConfig;
use tokio::net::TcpListener;

pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/86.0.4240.183 Safari/537.36";

/// Running mock API.
pub struct MockApi {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    continue;
                };
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        route(req)
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, hits }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn reply(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

async fn route(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let response = match path.as_str() {
        "/json" => {
            let mut response = reply(StatusCode::OK, r#"{"ip":"1.2.3.4"}"#);
            response.headers_mut().insert(
                "content-type",
                hyper::header::HeaderValue::from_static("application/json"),
            );
            response
        }
        "/unavailable" => reply(StatusCode::SERVICE_UNAVAILABLE, "try later"),
        "/slow" => {
            tokio::time::sleep(Duration::from_millis(400)).await;
            reply(StatusCode::OK, "finally")
        }
        "/large" => reply(StatusCode::OK, vec![b'x'; 2 * 1024 * 1024]),
        "/require-ua" => {
            let ua_ok = req
                .headers()
                .get("user-agent")
                .is_some_and(|ua| ua.as_bytes() == BROWSER_UA.as_bytes());
            if ua_ok {
                reply(StatusCode::OK, "welcome")
            } else {
                reply(StatusCode::FORBIDDEN, "bots not allowed")
            }
        }
        "/users" => {
            let is_json = req
                .headers()
                .get("content-type")
                .is_some_and(|ct| ct == "application/json");
            let method_ok = req.method() == &hyper::Method::POST;
            let body = req.into_body().collect().await.unwrap().to_bytes();
            let parsed: Result<serde_json::Value, _> = serde_json::from_slice(&body);
            match parsed {
                Ok(value) if is_json && method_ok && value["name"] == "alice" => {
                    reply(StatusCode::OK, "created")
                }
                _ => reply(StatusCode::BAD_REQUEST, "bad user"),
            }
        }
        _ => reply(StatusCode::NOT_FOUND, "not found"),
    };
    Ok(response)
}

/// Port nobody listens on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Bypass-mode config: relay on a free port, "inspector" URL pointing at it.
pub fn bypass_config(api_url: &str) -> HarnessConfig {
    let port = port_check::free_local_port().expect("no free port");
    HarnessConfig::new(api_url, &format!("http://127.0.0.1:{port}"))
        .unwrap()
        .with_listen_addr(format!("127.0.0.1:{port}"))
}
