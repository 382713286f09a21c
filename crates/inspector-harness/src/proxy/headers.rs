//! Header copying between the inbound and outbound halves of a relay call.
//!
//! Everything is copied value-by-value (repeated headers keep their
//! multiplicity) except hop-by-hop fields, which describe a single
//! connection and are re-derived by hyper on each side.

use hyper::header::{self, HeaderMap, HeaderName};

/// Connection-scoped headers that never cross the relay.
pub static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Copy request headers for the upstream call. `Host` is dropped so the
/// client fills it in for the API host.
pub fn copy_request_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src.iter() {
        if name == header::HOST || is_hop_by_hop(name) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

/// Copy upstream response headers onto the client-facing response.
pub fn copy_response_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src.iter() {
        if is_hop_by_hop(name) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}
