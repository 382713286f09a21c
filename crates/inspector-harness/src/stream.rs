//! Fan-in error reporting.
//!
//! The relay and the test loop both report into unbounded channels. A test
//! run's stream closes when its loop drops the only strong sender; the relay
//! reaches that stream through a weak sender, so it never holds a run open.
//!
//! The relay outlives individual runs, so its [`ErrorSink`] is a shared
//! handle whose targets are swapped as runs start: failures go to the active
//! run if there is one, otherwise to the stream returned by
//! [`Harness::start_proxy`](crate::Harness::start_proxy).

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tracing::warn;

use crate::error::HarnessError;

/// Receiving side handed to callers. Read until it yields `None`.
pub type ErrorStream = UnboundedReceiver<HarnessError>;

#[derive(Debug, Default)]
struct SinkTargets {
    /// Keeps its stream open for as long as it is attached.
    owned: Option<UnboundedSender<HarnessError>>,
    /// The current test run; preferred while it is alive.
    run: Option<WeakUnboundedSender<HarnessError>>,
}

/// Sending side used by background tasks. Clones share their targets.
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    targets: Arc<Mutex<SinkTargets>>,
}

impl ErrorSink {
    /// A sink owning the sender of a fresh stream.
    pub fn channel() -> (Self, ErrorStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self::detached();
        sink.attach_owned(tx);
        (sink, rx)
    }

    /// A sink with no targets yet; reports are dropped until one is attached.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn attach_owned(&self, tx: UnboundedSender<HarnessError>) {
        self.targets.lock().owned = Some(tx);
    }

    /// Release the owned sender, closing its stream once other senders are gone.
    pub fn detach_owned(&self) {
        self.targets.lock().owned = None;
    }

    /// Route reports to a run's stream without keeping that stream open.
    pub fn attach_run(&self, tx: &UnboundedSender<HarnessError>) {
        self.targets.lock().run = Some(tx.downgrade());
    }

    pub fn report(&self, err: HarnessError) {
        let undelivered = {
            let targets = self.targets.lock();
            match targets.run.as_ref().and_then(WeakUnboundedSender::upgrade) {
                Some(tx) => tx.send(err).err().map(|e| e.0),
                None => match &targets.owned {
                    Some(tx) => tx.send(err).err().map(|e| e.0),
                    None => Some(err),
                },
            }
        };
        if let Some(err) = undelivered {
            warn!("No open error stream, dropping: {}", err);
        }
    }
}

/// Drain the stream until it closes.
pub async fn collect_errors(stream: &mut ErrorStream) -> Vec<HarnessError> {
    let mut errors = Vec::new();
    while let Some(err) = stream.recv().await {
        errors.push(err);
    }
    errors
}

/// Newline-joined messages, for surfacing a run as one aggregate failure.
pub fn join_errors(errors: &[HarnessError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
