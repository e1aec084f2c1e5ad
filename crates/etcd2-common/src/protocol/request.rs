//! Logical request descriptors.
//!
//! A [`LogicalRequest`] is what a collaborator op hands to the dispatcher:
//! verb, path, parameters and body fields, but no member address. The
//! dispatcher resolves it against whichever cluster member is active.

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

use super::error::{Etcd2Error, Result};

/// API version spoken by this client.
pub const API_VERSION: u32 = 2;

/// HTTP verb of a logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side extension namespace, reached under `/mod/v2/{module}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Lock,
    Leader,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Lock => "lock",
            Module::Leader => "leader",
        }
    }
}

/// One logical operation against the cluster.
///
/// Built fresh per call and consumed once by the dispatcher.
///
/// # Example
///
/// ```
/// use etcd2_common::{LogicalRequest, Verb};
///
/// let request = LogicalRequest::put("/keys/a/b")
///     .with_value("5")
///     .with_form("ttl", 60);
///
/// assert_eq!(request.verb, Verb::Put);
/// assert_eq!(
///     request.url("http://127.0.0.1:4001").unwrap().as_str(),
///     "http://127.0.0.1:4001/v2/keys/a/b"
/// );
/// assert_eq!(request.form_fields().get("value").map(String::as_str), Some("5"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRequest {
    pub verb: Verb,
    /// Wire path below the API root (e.g. `/keys/a/b`, `/stats/self`)
    pub path: String,
    /// Scalar value, merged into the body under `value`
    pub value: Option<String>,
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
    pub module: Option<Module>,
    /// Path is relative to the member root rather than `/v2` (e.g. `/version`)
    pub unversioned: bool,
    /// Whether a connection failure may rotate to another member
    pub allow_failover: bool,
}

impl LogicalRequest {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            value: None,
            query: BTreeMap::new(),
            form: BTreeMap::new(),
            module: None,
            unversioned: false,
            allow_failover: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Verb::Put, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Verb::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn with_form(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.form.insert(key.into(), value.to_string());
        self
    }

    pub fn in_module(mut self, module: Module) -> Self {
        self.module = Some(module);
        self
    }

    pub fn unversioned(mut self) -> Self {
        self.unversioned = true;
        self
    }

    pub fn without_failover(mut self) -> Self {
        self.allow_failover = false;
        self
    }

    /// Full URL of this request against a member prefix (scheme+host+port).
    ///
    /// Every segment of the path is percent-encoded, so `?`, `#` and `%`
    /// inside a key stay part of the key.
    pub fn url(&self, prefix: &str) -> Result<Url> {
        let mut url = Url::parse(prefix)
            .map_err(|e| Etcd2Error::Config(format!("bad member prefix {}: {}", prefix, e)))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Etcd2Error::Config(format!("member prefix {} cannot be a base", prefix))
            })?;
            segments.pop_if_empty();

            let version = format!("v{}", API_VERSION);
            if !self.unversioned {
                match self.module {
                    Some(module) => segments.push("mod").push(&version).push(module.as_str()),
                    None => segments.push(&version),
                };
            }
            segments.extend(self.path.split('/').skip(1));
        }

        Ok(url)
    }

    /// Body fields with the scalar value merged in under `value`.
    pub fn form_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.form.clone();
        if let Some(value) = &self.value {
            fields.insert("value".to_string(), value.clone());
        }
        fields
    }
}
