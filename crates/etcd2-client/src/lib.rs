//! etcd v2 client
//!
//! An async client for the v2 HTTP API with automatic failover across
//! cluster members.
//!
//! - [`Client`]: entry point; hands out the operation groups
//! - [`Dispatcher`]: executes requests against the active member and fails
//!   over on connection errors
//! - [`ClusterMembership`]: known members and their failure cooldowns
//! - [`ClientConfig`]: connection, TLS and failover settings

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod membership;
pub mod ops;

pub use client::Client;
pub use config::{ClientConfig, TlsConfig};
pub use dispatcher::{Dispatcher, RawResponse};
pub use membership::{parse_machine_entry, ClusterMember, ClusterMembership};
pub use ops::{
    CasCondition, DirectoryOps, GetOptions, InOrder, IndexLock, LeaderOps, LockOps, NodeOps,
    ServerOps, StatsOps, ValueLock, WaitOptions,
};

pub use etcd2_common::{Action, ClientResponse, Etcd2Error, Node, Result};
