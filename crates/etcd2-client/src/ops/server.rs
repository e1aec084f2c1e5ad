use crate::dispatcher::Dispatcher;
use crate::membership::parse_machine_entry;
use crate::Client;
use etcd2_common::{to_wire_path, Etcd2Error, LogicalRequest, Result};

/// Prefix of the answer of the version probe.
pub const VERSION_PREFIX: &str = "etcd v";

/// Key listing the cluster members.
pub const MACHINES_KEY: &str = "/_etcd/machines";

/// Server-level queries.
pub struct ServerOps<'a> {
    client: &'a Client,
}

impl<'a> ServerOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Server version, without the `etcd v` prefix (e.g. `0.2.0`).
    pub async fn version(&self) -> Result<String> {
        probe_version(self.client.dispatcher()).await
    }

    /// URL prefix of the current raft leader.
    pub async fn leader_url(&self) -> Result<String> {
        let text = self
            .client
            .dispatcher()
            .execute_text(&LogicalRequest::get("/leader"))
            .await?;
        Ok(text.trim().to_string())
    }

    /// Client URL prefixes of every published member.
    pub async fn machines(&self) -> Result<Vec<String>> {
        list_machines(self.client.dispatcher()).await
    }

    pub async fn dashboard_url(&self) -> String {
        format!("{}/mod/dashboard/", self.client.active_member().await)
    }
}

/// `GET /version` without failover.
pub(crate) async fn probe_version(dispatcher: &Dispatcher) -> Result<String> {
    let request = LogicalRequest::get("/version")
        .unversioned()
        .without_failover();
    let text = dispatcher.execute_text(&request).await?;
    parse_version(&text)
}

/// Machine listing without failover.
pub(crate) async fn list_machines(dispatcher: &Dispatcher) -> Result<Vec<String>> {
    let request = LogicalRequest::get(to_wire_path(MACHINES_KEY)?).without_failover();
    let response = dispatcher.execute(&request).await?;

    Ok(response
        .node
        .children()?
        .iter()
        .filter_map(|machine| machine.value())
        .filter_map(parse_machine_entry)
        .collect())
}

pub fn parse_version(text: &str) -> Result<String> {
    let text = text.trim();
    match text.strip_prefix(VERSION_PREFIX) {
        Some(version) if !version.is_empty() => Ok(version.to_string()),
        _ => Err(Etcd2Error::InvalidResponse(format!(
            "could not parse server version: {:?}",
            text
        ))),
    }
}
