//! Plain-text rendering of responses.

use anyhow::{bail, Result};
use etcd2_client::{Action, ClientResponse, Node};

/// Raw value of a file node.
pub fn value(node: &Node) -> Result<&str> {
    match node.value() {
        Some(value) => Ok(value),
        None if node.is_directory() => bail!("{}: is a directory", node.key()),
        None => bail!("{}: has no value", node.key()),
    }
}

/// Keys below `node`, depth first, directories suffixed with `/`.
///
/// A file lists as itself. A directory fetched without children (the server
/// omits the list for empty ones) lists as nothing.
pub fn listing(node: &Node) -> Result<Vec<String>> {
    if !node.is_directory() {
        return Ok(vec![node.key().to_string()]);
    }

    let mut lines = Vec::new();
    if node.is_collection() {
        collect(node.children()?, &mut lines)?;
    }
    Ok(lines)
}

fn collect(children: &[Node], lines: &mut Vec<String>) -> Result<()> {
    for child in children {
        if child.is_directory() {
            lines.push(format!("{}/", child.key()));
            if child.is_collection() {
                collect(child.children()?, lines)?;
            }
        } else {
            lines.push(child.key().to_string());
        }
    }
    Ok(())
}

/// One-line summary of a watched change: `action key [value]`.
pub fn change(response: &ClientResponse) -> String {
    let action = action_name(response.action);
    match response.node.value() {
        Some(value) => format!("{} {} {}", action, response.node.key(), value),
        None => format!("{} {}", action, response.node.key()),
    }
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Get => "get",
        Action::Set => "set",
        Action::Create => "create",
        Action::Update => "update",
        Action::Delete => "delete",
        Action::CompareAndSwap => "compareAndSwap",
        Action::CompareAndDelete => "compareAndDelete",
        Action::Expire => "expire",
        Action::Unknown => "unknown",
    }
}
