use crate::ops::GetOptions;
use crate::Client;
use etcd2_common::{to_wire_path, ClientResponse, LogicalRequest, Result};

/// A directory of server-ordered keys, usable as a queue.
///
/// [`add`](Self::add) lets the server pick a monotonically increasing key
/// for each value, so listing with `sorted` yields insertion order.
pub struct InOrder {
    client: Client,
    path: String,
}

impl InOrder {
    pub(crate) fn new(client: Client, path: &str) -> Self {
        Self {
            client,
            path: path.trim_end_matches('/').to_string(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Creates the directory. Adding creates it implicitly too.
    pub async fn create(&self) -> Result<ClientResponse> {
        self.client.directory().create(&self.path, None).await
    }

    /// Deletes the directory and everything in it.
    pub async fn delete(&self) -> Result<ClientResponse> {
        self.client.directory().delete_recursive(&self.path).await
    }

    /// Appends `value` under a server-assigned key.
    pub async fn add(&self, value: &str) -> Result<ClientResponse> {
        let request = LogicalRequest::post(to_wire_path(&self.path)?).with_value(value);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn list(&self, sorted: bool) -> Result<ClientResponse> {
        let options = GetOptions {
            sorted,
            ..Default::default()
        };
        self.client.node().get_with(&self.path, options).await
    }

    /// Removes the entry `name` (the last segment of its key).
    pub async fn pop(&self, name: &str) -> Result<ClientResponse> {
        let key = format!("{}/{}", self.path, name.trim_start_matches('/'));
        self.client.node().delete(&key).await
    }
}
