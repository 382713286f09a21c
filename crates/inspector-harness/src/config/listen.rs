//! Proxy listen address resolution.

use crate::error::HarnessError;

/// Environment variable through which the inspector hands out the port it
/// expects the relay on.
pub const INSPECTOR_PORT_ENV: &str = "OPTIC_API_PORT";

/// Host used when the configured listen address is empty.
pub const DEFAULT_LISTEN_HOST: &str = "localhost";

/// Resolve the relay listen address.
///
/// A value that already carries a port (`host:port`) is returned unchanged;
/// this bypasses the inspector and is meant for local debugging only. A bare
/// host is completed with `port`, which must be a positive integer.
pub fn resolve_listen_addr(addr: &str, port: Option<&str>) -> Result<String, HarnessError> {
    if addr.contains(':') {
        return Ok(addr.to_string());
    }

    let host = if addr.trim().is_empty() {
        DEFAULT_LISTEN_HOST
    } else {
        addr.trim()
    };

    let raw = port.ok_or_else(|| HarnessError::BadPort {
        var: INSPECTOR_PORT_ENV,
        reason: "not set".to_string(),
    })?;

    let port: u16 = raw.trim().parse().map_err(|e| HarnessError::BadPort {
        var: INSPECTOR_PORT_ENV,
        reason: format!("'{raw}': {e}"),
    })?;

    if port == 0 {
        return Err(HarnessError::BadPort {
            var: INSPECTOR_PORT_ENV,
            reason: "port must be positive".to_string(),
        });
    }

    Ok(format!("{host}:{port}"))
}

/// Resolve the listen address against the inspector's port environment variable.
pub fn listen_addr_from_env(addr: &str) -> Result<String, HarnessError> {
    let port = std::env::var(INSPECTOR_PORT_ENV).ok();
    resolve_listen_addr(addr, port.as_deref())
}
