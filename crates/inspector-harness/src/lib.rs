//! Inspector harness: drives real API traffic through an API-traffic
//! inspector and reports which test cases failed.
//!
//! ```text
//! Harness --HTTP--> inspector --HTTP--> relay --HTTP(S)--> real API
//! ```
//!
//! The relay is a transparent reverse proxy listening where the inspector
//! expects its upstream; the harness sends each [`TestCase`] to the
//! inspector's public URL and reports non-200 responses and transport
//! errors on an [`ErrorStream`].

pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod proxy;
pub mod reachability;
pub mod stream;

pub use client::{DefaultHeaders, InstrumentedClient, RequestHook};
pub use config::{HarnessConfig, HarnessFile};
pub use error::HarnessError;
pub use harness::{Harness, TestCase};
pub use stream::{collect_errors, join_errors, ErrorSink, ErrorStream};
