//! Operations built on the dispatcher.
//!
//! Each group borrows the [`Client`](crate::Client), builds a
//! [`LogicalRequest`](etcd2_common::LogicalRequest) and hands it over. Types
//! that keep state across calls (locks, in-order directories) own a clone
//! of the client instead.

pub mod directory;
pub mod inorder;
pub mod leader;
pub mod lock;
pub mod node;
pub mod server;
pub mod stats;

pub use directory::DirectoryOps;
pub use inorder::InOrder;
pub use leader::{LeaderOps, LEADER_ERROR_PREFIX};
pub use lock::{IndexLock, LockOps, ValueLock};
pub use node::{CasCondition, GetOptions, NodeOps, WaitOptions};
pub use server::ServerOps;
pub use stats::StatsOps;
