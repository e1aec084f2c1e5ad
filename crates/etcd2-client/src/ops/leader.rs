use crate::Client;
use etcd2_common::{Etcd2Error, LogicalRequest, Module, Result};
use tracing::debug;

/// Text the leader module answers with, on a 200, when a read fails.
pub const LEADER_ERROR_PREFIX: &str = "get leader error:";

/// Leader election of the server's leader module.
///
/// The first process to set a value on a key holds it until the TTL runs
/// out; others are blocked until then.
pub struct LeaderOps<'a> {
    client: &'a Client,
}

impl<'a> LeaderOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn set_or_renew(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        debug!("Setting leader {} to {}", key, value);
        let request = LogicalRequest::put(leader_path(key))
            .in_module(Module::Leader)
            .with_query("ttl", ttl)
            .with_form("name", value);
        self.client.dispatcher().execute_text(&request).await?;
        Ok(())
    }

    /// Current leader of `key`, `None` when nobody holds it.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let request = LogicalRequest::get(leader_path(key)).in_module(Module::Leader);
        let text = self.client.dispatcher().execute_text(&request).await?;

        if text.is_empty() {
            return Ok(None);
        }
        if text.starts_with(LEADER_ERROR_PREFIX) {
            return Err(Etcd2Error::KeyNotFound {
                key: key.to_string(),
                message: text.trim_end().to_string(),
            });
        }
        Ok(Some(text))
    }

    /// Steps `value` down as leader of `key`.
    ///
    /// The module answers 500 when `value` is not the leader; that is
    /// reported as `KeyNotFound`.
    pub async fn delete(&self, key: &str, value: &str) -> Result<()> {
        debug!("Deleting leader {} with {}", key, value);
        let request = LogicalRequest::delete(leader_path(key))
            .in_module(Module::Leader)
            .with_query("name", value);

        match self.client.dispatcher().execute_text(&request).await {
            Ok(_) => Ok(()),
            Err(Etcd2Error::ServerRequest { status: 500, body }) => Err(Etcd2Error::KeyNotFound {
                key: key.to_string(),
                message: body.trim_end().to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

fn leader_path(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}
