//! Typed node model.
//!
//! The server describes every node with one JSON object whose shape depends
//! on what the node is: files carry a `value`, directories carry `dir: true`
//! and (sometimes) a `nodes` array, nodes with an expiry carry `expiration`
//! and `ttl`, and nodes reported by a deletion carry only their indices.
//!
//! [`Node`] turns that into a sum type over the two independent axes
//! (file/directory, alive/deleted). Alive directories additionally remember
//! whether they were fetched with their children.
//!
//! # Example
//!
//! ```
//! use etcd2_common::{Action, Node, RawNode};
//!
//! let raw: RawNode = serde_json::from_str(
//!     r#"{"key":"/dir","dir":true,"createdIndex":3,"modifiedIndex":3,
//!         "nodes":[{"key":"/dir/a","value":"1","createdIndex":4,"modifiedIndex":4}]}"#,
//! ).unwrap();
//! let node = Node::decode(Action::Get, &raw).unwrap();
//!
//! assert!(node.is_collection());
//! assert_eq!(node.children().unwrap()[0].value(), Some("1"));
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{Etcd2Error, Result};
use super::response::Action;

/// A node object exactly as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_index: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_dir_flag",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<RawNode>>,
}

// Older servers send `"dir": "true"` rather than a boolean.
#[derive(Deserialize)]
#[serde(untagged)]
enum DirFlag {
    Bool(bool),
    Text(String),
}

fn deserialize_dir_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<DirFlag>::deserialize(deserializer)? {
        Some(DirFlag::Bool(flag)) => flag,
        Some(DirFlag::Text(text)) => text.eq_ignore_ascii_case("true"),
        None => false,
    })
}

/// Fields shared by every node variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMeta {
    /// Absolute key of the node
    pub key: String,
    /// Index assigned by the server when the node was created
    pub created_index: u64,
    /// Index assigned by the server on the last modification
    pub modified_index: u64,
    /// Last path segment starts with `_`
    pub hidden: bool,
}

impl NodeMeta {
    fn from_raw(raw: &RawNode) -> Result<Self> {
        let key = raw
            .key
            .clone()
            .ok_or_else(|| Etcd2Error::MalformedNode("missing key".into()))?;
        let created_index = raw.created_index.ok_or_else(|| {
            Etcd2Error::MalformedNode(format!("missing createdIndex on {}", key))
        })?;
        let modified_index = raw.modified_index.ok_or_else(|| {
            Etcd2Error::MalformedNode(format!("missing modifiedIndex on {}", key))
        })?;

        if created_index > modified_index {
            return Err(Etcd2Error::MalformedNode(format!(
                "createdIndex {} is after modifiedIndex {} on {}",
                created_index, modified_index, key
            )));
        }

        let hidden = key
            .rsplit('/')
            .next()
            .map(|segment| segment.starts_with('_'))
            .unwrap_or(false);

        Ok(Self {
            key,
            created_index,
            modified_index,
            hidden,
        })
    }
}

/// Expiry of a node created with a TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    /// Absolute expiration time, with the server's UTC offset
    pub expiration: DateTime<FixedOffset>,
    /// Seconds remaining when the server answered, if it said
    pub ttl: Option<i64>,
}

impl Expiry {
    fn from_raw(raw: &RawNode, key: &str) -> Result<Option<Self>> {
        let Some(expiration) = &raw.expiration else {
            return Ok(None);
        };

        let parsed = DateTime::parse_from_rfc3339(expiration).map_err(|e| {
            Etcd2Error::MalformedNode(format!(
                "bad expiration {:?} on {}: {}",
                expiration, key, e
            ))
        })?;
        Ok(Some(Self {
            expiration: parsed,
            ttl: raw.ttl,
        }))
    }
}

/// A decoded node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    AliveFile {
        meta: NodeMeta,
        value: String,
        expiry: Option<Expiry>,
    },
    DeletedFile {
        meta: NodeMeta,
    },
    AliveDirectory {
        meta: NodeMeta,
        expiry: Option<Expiry>,
        /// `Some` only when the server listed the children
        children: Option<Vec<Node>>,
    },
    DeletedDirectory {
        meta: NodeMeta,
    },
}

impl Node {
    /// Decodes one node object reported under `action`.
    ///
    /// Children inherit the action of their parent.
    pub fn decode(action: Action, raw: &RawNode) -> Result<Self> {
        let meta = NodeMeta::from_raw(raw)?;

        match (raw.dir, action.is_deletion()) {
            (false, false) => {
                let value = raw.value.clone().ok_or_else(|| {
                    Etcd2Error::MalformedNode(format!("missing value on {}", meta.key))
                })?;
                let expiry = Expiry::from_raw(raw, &meta.key)?;
                Ok(Node::AliveFile {
                    meta,
                    value,
                    expiry,
                })
            }
            (false, true) => Ok(Node::DeletedFile { meta }),
            (true, false) => {
                let expiry = Expiry::from_raw(raw, &meta.key)?;
                let children = match &raw.nodes {
                    Some(nodes) => Some(
                        nodes
                            .iter()
                            .map(|child| Node::decode(action, child))
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    None => None,
                };
                Ok(Node::AliveDirectory {
                    meta,
                    expiry,
                    children,
                })
            }
            (true, true) => Ok(Node::DeletedDirectory { meta }),
        }
    }

    /// Re-encodes the node into its wire shape.
    pub fn to_raw(&self) -> RawNode {
        let meta = self.meta();
        let mut raw = RawNode {
            key: Some(meta.key.clone()),
            created_index: Some(meta.created_index),
            modified_index: Some(meta.modified_index),
            dir: self.is_directory(),
            ..Default::default()
        };

        if let Some(expiry) = self.expiry() {
            raw.expiration = Some(expiry.expiration.to_rfc3339());
            raw.ttl = expiry.ttl;
        }

        match self {
            Node::AliveFile { value, .. } => raw.value = Some(value.clone()),
            Node::AliveDirectory {
                children: Some(children),
                ..
            } => raw.nodes = Some(children.iter().map(Node::to_raw).collect()),
            _ => {}
        }

        raw
    }

    pub fn meta(&self) -> &NodeMeta {
        match self {
            Node::AliveFile { meta, .. }
            | Node::DeletedFile { meta }
            | Node::AliveDirectory { meta, .. }
            | Node::DeletedDirectory { meta } => meta,
        }
    }

    pub fn key(&self) -> &str {
        &self.meta().key
    }

    pub fn created_index(&self) -> u64 {
        self.meta().created_index
    }

    pub fn modified_index(&self) -> u64 {
        self.meta().modified_index
    }

    pub fn is_hidden(&self) -> bool {
        self.meta().hidden
    }

    pub fn is_directory(&self) -> bool {
        matches!(
            self,
            Node::AliveDirectory { .. } | Node::DeletedDirectory { .. }
        )
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Node::DeletedFile { .. } | Node::DeletedDirectory { .. })
    }

    /// An alive directory fetched together with its children.
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Node::AliveDirectory {
                children: Some(_),
                ..
            }
        )
    }

    /// Value of an alive file.
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::AliveFile { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn expiry(&self) -> Option<&Expiry> {
        match self {
            Node::AliveFile { expiry, .. } | Node::AliveDirectory { expiry, .. } => {
                expiry.as_ref()
            }
            _ => None,
        }
    }

    pub fn ttl(&self) -> Option<i64> {
        self.expiry().and_then(|e| e.ttl)
    }

    pub fn expiration(&self) -> Option<DateTime<FixedOffset>> {
        self.expiry().map(|e| e.expiration)
    }

    /// Children of a collection, in server order.
    ///
    /// Fails with [`Etcd2Error::NotACollection`] on anything that was not
    /// fetched with children, rather than pretending the list is empty.
    pub fn children(&self) -> Result<&[Node]> {
        match self {
            Node::AliveDirectory {
                children: Some(children),
                ..
            } => Ok(children),
            other => Err(Etcd2Error::NotACollection(other.key().to_string())),
        }
    }
}
