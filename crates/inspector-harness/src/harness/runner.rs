//! Sequential execution of test cases.

use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::test_case::{test_url, TestCase};
use crate::client::{empty_body, full_body, InstrumentedClient};
use crate::config::HarnessConfig;
use crate::error::HarnessError;

#[derive(Clone)]
pub(crate) struct TestRunner {
    pub config: Arc<HarnessConfig>,
    pub client: InstrumentedClient,
}

impl TestRunner {
    /// Send one case through the inspector and check for `200 OK`.
    pub async fn run_test(&self, case: &TestCase) -> Result<(), HarnessError> {
        let url = test_url(&self.config.inspector_url, &self.config.api_url, &case.path);
        let method = case.http_method()?;

        let builder = Request::builder().method(method).uri(url.as_str());
        let req = match &case.payload {
            Some(payload) => {
                let bytes = serde_json::to_vec(payload)?;
                builder
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .body(full_body(bytes))?
            }
            None => builder.body(empty_body())?,
        };

        let response = self.client.send(req).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(HarnessError::BadStatus(status.as_u16()));
        }

        // Drain so the whole body passes through the inspector and the relay.
        let mut body = response.into_body();
        let mut drained = 0usize;
        while let Some(frame) = body.frame().await {
            if let Some(chunk) = frame?.data_ref() {
                drained += chunk.len();
            }
        }
        debug!("Drained {} body bytes for '{}'", drained, case.name);
        Ok(())
    }

    /// Run every case in order, reporting failures on `errors`.
    ///
    /// `cancel` is checked before each case; a case already in flight runs
    /// to completion. Dropping `errors` at the end closes the stream.
    pub async fn run_all(
        self,
        tests: Vec<TestCase>,
        errors: UnboundedSender<HarnessError>,
        cancel: CancellationToken,
    ) {
        info!("Defined {} tests", tests.len());
        let mut failed = 0usize;
        let mut attempted = 0usize;

        for case in &tests {
            if cancel.is_cancelled() {
                info!("Test run cancelled before '{}'", case.name);
                break;
            }

            info!("Running test: {}", case.path);
            attempted += 1;
            if let Err(err) = self.run_test(case).await {
                failed += 1;
                warn!("Test '{}' failed: {}", case.name, err);
                if errors.send(err.in_test(&case.name)).is_err() {
                    debug!("Error stream receiver dropped");
                }
            }
        }

        info!(
            "Test run finished: {} attempted, {} failed",
            attempted, failed
        );
    }
}
