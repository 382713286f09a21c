//! Test orchestrator.
//!
//! A [`Harness`] owns the configuration and the shared client, starts the
//! relay at most once, and runs test cases one at a time against the
//! inspector. Results come back on an [`ErrorStream`]: an empty stream that
//! closes means every case passed.

mod runner;
mod test_case;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};

use crate::client::InstrumentedClient;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::proxy::RelayServer;
use crate::reachability::wait_for_internet;
use crate::stream::{ErrorSink, ErrorStream};
use runner::TestRunner;

pub use test_case::{join_paths, test_url, TestCase};

/// Orchestrator instance. Dropping it stops the relay.
pub struct Harness {
    config: Arc<HarnessConfig>,
    listen_addr: String,
    client: InstrumentedClient,
    proxy_started: AtomicBool,
    proxy_addr: OnceLock<SocketAddr>,
    /// Shared with the relay; retargeted by each `start_*` call.
    relay_sink: ErrorSink,
    shutdown: CancellationToken,
}

impl Harness {
    /// Validate the configuration and build the client. No network activity.
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        let listen_addr = config.listen_addr()?;
        let client = InstrumentedClient::new(config.request_hook.clone())?;

        Ok(Self {
            config: Arc::new(config),
            listen_addr,
            client,
            proxy_started: AtomicBool::new(false),
            proxy_addr: OnceLock::new(),
            relay_sink: ErrorSink::detached(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Resolved relay listen address (`host:port`).
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Address the relay actually bound, once started.
    pub fn proxy_addr(&self) -> Option<SocketAddr> {
        self.proxy_addr.get().copied()
    }

    pub fn is_proxy_started(&self) -> bool {
        self.proxy_started.load(Ordering::Acquire)
    }

    /// Start only the relay, e.g. ahead of the tests.
    ///
    /// The returned stream carries relay failures that happen outside a
    /// [`start_all`](Self::start_all) run and stays open while the relay runs.
    pub async fn start_proxy(&self) -> Result<ErrorStream, HarnessError> {
        if self.is_proxy_started() {
            return Err(HarnessError::ProxyAlreadyStarted);
        }
        self.check_internet().await?;

        let (tx, stream) = mpsc::unbounded_channel();
        self.relay_sink.attach_owned(tx);
        match self.launch_relay().await {
            Ok(true) => Ok(stream),
            Ok(false) => Err(HarnessError::ProxyAlreadyStarted),
            Err(err) => {
                self.relay_sink.detach_owned();
                Err(err)
            }
        }
    }

    /// Start the relay (unless [`start_proxy`](Self::start_proxy) already
    /// did) and then run `tests` in order on a background task.
    ///
    /// Relay failures during the run are reported on the returned stream,
    /// which closes once every case was attempted. Cancel the returned token
    /// to stop before the next case.
    pub async fn start_all(
        &self,
        tests: Vec<TestCase>,
    ) -> Result<(ErrorStream, CancellationToken), HarnessError> {
        self.check_internet().await?;

        let (tx, stream) = mpsc::unbounded_channel();
        self.relay_sink.attach_run(&tx);
        if !self.launch_relay().await? {
            info!("Proxy already running, skipping start");
        }

        let cancel = CancellationToken::new();
        let runner = self.runner();
        tokio::spawn(runner.run_all(tests, tx, cancel.clone()).in_current_span());

        Ok((stream, cancel))
    }

    /// Run a single case directly, outside the background loop.
    pub async fn run_test(&self, case: &TestCase) -> Result<(), HarnessError> {
        self.runner().run_test(case).await
    }

    /// Stop the relay's accept loop and close the
    /// [`start_proxy`](Self::start_proxy) stream. Connections in flight finish
    /// on their own.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.relay_sink.detach_owned();
    }

    fn runner(&self) -> TestRunner {
        TestRunner {
            config: Arc::clone(&self.config),
            client: self.client.clone(),
        }
    }

    async fn check_internet(&self) -> Result<(), HarnessError> {
        if let Some(timeout) = self.config.internet_check_timeout {
            info!("Waiting up to {:?} for internet access", timeout);
            wait_for_internet(self.client.raw(), &self.config.probe_url, timeout).await?;
        }
        Ok(())
    }

    /// Bind and spawn the relay once. Returns `false` if it was already started.
    async fn launch_relay(&self) -> Result<bool, HarnessError> {
        if self
            .proxy_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let server = match RelayServer::bind(
            &self.listen_addr,
            &self.config,
            self.client.clone(),
            self.relay_sink.clone(),
        )
        .await
        {
                Ok(server) => server,
                Err(err) => {
                    self.proxy_started.store(false, Ordering::Release);
                    return Err(err);
                }
            };

        let _ = self.proxy_addr.set(server.local_addr());
        tokio::spawn(server.run(self.shutdown.clone()).in_current_span());
        Ok(true)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
