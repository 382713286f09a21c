//! Wire-level dumps of relayed traffic, for `debug_print`.

use std::fmt::Write;

use hyper::header::HeaderMap;
use hyper::http::{request, response};

pub fn dump_request(parts: &request::Parts, body: &[u8]) -> String {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut out = format!("{} {} {:?}\r\n", parts.method, target, parts.version);
    if let Some(host) = parts.uri.authority() {
        let _ = write!(out, "Host: {host}\r\n");
    }
    write_headers(&mut out, &parts.headers);
    write_body(&mut out, body);
    out
}

pub fn dump_response(parts: &response::Parts, body: &[u8]) -> String {
    let mut out = format!("{:?} {}\r\n", parts.version, parts.status);
    write_headers(&mut out, &parts.headers);
    write_body(&mut out, body);
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers.iter() {
        let _ = write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
    }
    out.push_str("\r\n");
}

fn write_body(out: &mut String, body: &[u8]) {
    out.push_str(&String::from_utf8_lossy(body));
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Request, Response, StatusCode};

    #[test]
    fn test_dump_request() {
        let (parts, _) = Request::post("https://api.ipify.org/json?format=1")
            .header("content-type", "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let dump = dump_request(&parts, br#"{"a":1}"#);
        assert!(dump.starts_with("POST /json?format=1 HTTP/1.1\r\n"));
        assert!(dump.contains("Host: api.ipify.org\r\n"));
        assert!(dump.contains("content-type: application/json\r\n"));
        assert!(dump.ends_with("\r\n\r\n{\"a\":1}"));
    }

    #[test]
    fn test_dump_response() {
        let (parts, _) = Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .header("retry-after", "5")
            .body(())
            .unwrap()
            .into_parts();

        let dump = dump_response(&parts, b"");
        assert!(dump.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
        assert!(dump.contains("retry-after: 5\r\n"));
    }
}
