use serde::{Deserialize, Serialize};

use super::error::Result;
use super::node::{Node, RawNode};

/// Action tag reported by the server on every successful key operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Get,
    Set,
    Create,
    Update,
    Delete,
    CompareAndSwap,
    CompareAndDelete,
    Expire,
    #[serde(other)]
    Unknown,
}

impl Action {
    /// The reported node (and its children) no longer exists.
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Action::Delete | Action::CompareAndDelete | Action::Expire
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    action: Action,
    node: RawNode,
    #[serde(default)]
    prev_node: Option<RawNode>,
}

/// A decoded 2xx response of the key API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub action: Action,
    pub node: Node,
    /// Pre-image of the node before a mutation, when the server sends one
    pub prev_node: Option<Node>,
}

impl ClientResponse {
    /// Decodes a response body into the action and its root node.
    ///
    /// The previous node is decoded as alive: it describes the state before
    /// the action took place.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(body)?;

        let node = Node::decode(envelope.action, &envelope.node)?;
        let prev_node = envelope
            .prev_node
            .as_ref()
            .map(|raw| Node::decode(Action::Get, raw))
            .transpose()?;

        Ok(Self {
            action: envelope.action,
            node,
            prev_node,
        })
    }
}
