pub mod error;
pub mod node;
pub mod path;
pub mod request;
pub mod response;
pub mod stats;
pub mod translate;

#[cfg(test)]
mod tests;

pub use error::{Etcd2Error, Result};
pub use node::{Expiry, Node, NodeMeta, RawNode};
pub use path::{to_wire_path, validate_path, KEYS_PREFIX};
pub use request::{LogicalRequest, Module, Verb};
pub use response::{Action, ClientResponse};
pub use stats::{FollowerStats, LeaderInfo, LeaderStats, SelfStats, StoreStats};
pub use translate::{check_status, translate_status, ServerError};
