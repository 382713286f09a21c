//! RelayServer struct and its accept loop.
//!
//! Each relay owns its listener and handler; nothing is registered on
//! process-wide state, so several harnesses can run side by side.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

use super::forwarding::{relay_request, RelayContext};
use crate::client::InstrumentedClient;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::stream::ErrorSink;

/// A bound, not yet running, relay listener.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    ctx: Arc<RelayContext>,
}

async fn serve_connection(stream: TcpStream, remote_addr: SocketAddr, ctx: Arc<RelayContext>) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let ctx = Arc::clone(&ctx);
        async move { relay_request(&ctx, req).await }
    });

    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
        debug!("Error serving connection from {}: {}", remote_addr, err);
    }
}

impl RelayServer {
    /// Bind the listener. Failing to bind is the relay's one fatal error.
    pub async fn bind(
        addr: &str,
        config: &HarnessConfig,
        client: InstrumentedClient,
        sink: ErrorSink,
    ) -> Result<Self, HarnessError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HarnessError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            ctx: Arc::new(RelayContext {
                api_url: config.api_url.clone(),
                client,
                sink,
                debug_print: config.debug_print,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept and serve connections until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Relay listening on http://{}", self.local_addr);
        info!("Relaying to {}", self.ctx.api_url);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Relay on {} shutting down", self.local_addr);
                    break;
                }
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let conn = serve_connection(stream, remote_addr, Arc::clone(&self.ctx));
                            tokio::spawn(conn.in_current_span());
                        }
                        Err(err) => {
                            error!("Accept error on {}: {}", self.local_addr, err);
                        }
                    }
                }
            }
        }
    }
}
