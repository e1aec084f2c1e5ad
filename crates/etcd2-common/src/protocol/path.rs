//! Logical key validation.
//!
//! Logical keys are absolute, slash-separated paths (`/config/db/host`). On
//! the wire they live under the `/keys` namespace of the v2 API.

use super::error::{Etcd2Error, Result};

/// Namespace prepended to every logical key.
pub const KEYS_PREFIX: &str = "/keys";

/// Fails with [`Etcd2Error::InvalidPath`] unless `path` starts with `/`.
pub fn validate_path(path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(Etcd2Error::InvalidPath(path.to_string()))
    }
}

/// Validates `path` and returns its wire form, `/keys` + `path`.
///
/// ```
/// use etcd2_common::to_wire_path;
///
/// assert_eq!(to_wire_path("/a/b").unwrap(), "/keys/a/b");
/// assert!(to_wire_path("a/b").is_err());
/// ```
pub fn to_wire_path(path: &str) -> Result<String> {
    validate_path(path)?;
    Ok(format!("{}{}", KEYS_PREFIX, path))
}
