//! etcd v2 Common Types
//!
//! This crate provides the wire protocol definitions shared by the etcd v2
//! client and command-line tool.
//!
//! # Overview
//!
//! The coordination server exposes a hierarchical key space over HTTP. Every
//! logical operation (get/set/delete/compare-and-swap on a node) becomes one
//! HTTP request against `/v2/keys{key}` (or `/mod/v2/{module}{path}` for the
//! lock and leader modules), and every successful answer is a JSON envelope
//! carrying an action tag and a recursive node tree.
//!
//! - **Paths**: validation and canonicalization of logical keys into wire paths
//! - **Requests**: the [`LogicalRequest`] descriptor consumed by the dispatcher
//! - **Node model**: a typed sum over file/directory and alive/deleted nodes
//! - **Responses**: the decoded [`ClientResponse`] envelope
//! - **Errors**: the [`Etcd2Error`] taxonomy and HTTP status translation
//!
//! # Example
//!
//! ```
//! use etcd2_common::{ClientResponse, Action};
//!
//! let body = br#"{"action":"get","node":{"key":"/a/b","value":"5","createdIndex":7,"modifiedIndex":7}}"#;
//! let response = ClientResponse::decode(body).unwrap();
//!
//! assert_eq!(response.action, Action::Get);
//! assert_eq!(response.node.value(), Some("5"));
//! ```

pub mod protocol;

pub use protocol::*;
