//! Proxy relay module.
//!
//! The relay is the transparent reverse proxy the inspector forwards into:
//! every request is re-targeted at the real API and the response is relayed
//! back verbatim.
//!
//! # Module Structure
//!
//! - `server` - RelayServer struct and accept loop
//! - `forwarding` - Per-request relay logic
//! - `headers` - Header copying rules
//! - `dump` - Wire-level dumps for debug printing

mod dump;
mod forwarding;
mod headers;
mod server;


pub use dump::{dump_request, dump_response};
pub use forwarding::{error_response, upstream_uri};
pub use headers::{copy_request_headers, copy_response_headers, is_hop_by_hop};
pub use server::RelayServer;
