//! Mapping of non-2xx answers onto [`Etcd2Error`].
//!
//! | status | errorCode | error |
//! |--------|-----------|-------|
//! | 412    | any       | [`Etcd2Error::PreconditionFailed`] |
//! | 404    | 100       | [`Etcd2Error::KeyNotFound`] |
//! | 403    | 102       | [`Etcd2Error::AlreadyExists`] |
//! | other  |           | [`Etcd2Error::ServerRequest`] |
//!
//! A body that does not parse as an error envelope falls through to
//! [`Etcd2Error::ServerRequest`] whenever an error code would be needed.

use serde::{Deserialize, Serialize};

use super::error::{Etcd2Error, Result};

pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_PRECONDITION_FAILED: u16 = 412;

pub const ERROR_KEY_NOT_FOUND: i64 = 100;
pub const ERROR_NOT_A_FILE: i64 = 102;

/// Error envelope sent by the server with non-2xx answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub index: Option<u64>,
}

impl ServerError {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    fn describe(&self) -> String {
        match &self.cause {
            Some(cause) => format!("{} [{}]", self.message, cause),
            None => self.message.clone(),
        }
    }
}

/// Translates a non-2xx status and its body into a client error.
pub fn translate_status(status: u16, body: &str) -> Etcd2Error {
    let parsed = ServerError::parse(body);

    match (status, parsed) {
        (STATUS_PRECONDITION_FAILED, parsed) => Etcd2Error::PreconditionFailed {
            message: parsed
                .map(|e| e.describe())
                .unwrap_or_else(|| body.to_string()),
        },
        (STATUS_NOT_FOUND, Some(error)) if error.error_code == ERROR_KEY_NOT_FOUND => {
            Etcd2Error::KeyNotFound {
                key: error.cause.clone().unwrap_or_default(),
                message: error.message,
            }
        }
        (STATUS_FORBIDDEN, Some(error)) if error.error_code == ERROR_NOT_A_FILE => {
            Etcd2Error::AlreadyExists {
                key: error.cause.clone().unwrap_or_default(),
                message: error.message,
            }
        }
        _ => Etcd2Error::ServerRequest {
            status,
            body: body.to_string(),
        },
    }
}

/// `Ok(())` on 2xx, the translated error otherwise.
pub fn check_status(status: u16, body: &str) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(translate_status(status, body))
    }
}
