use crate::Client;
use etcd2_common::{to_wire_path, ClientResponse, LogicalRequest, Result};

/// Explicit directory management.
///
/// Setting a key creates its parent directories implicitly; these calls are
/// for when a directory itself is the point (TTL'd directories, listings,
/// removal).
pub struct DirectoryOps<'a> {
    client: &'a Client,
}

impl<'a> DirectoryOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fails with `AlreadyExists` when `path` is an existing file.
    pub async fn create(&self, path: &str, ttl: Option<u64>) -> Result<ClientResponse> {
        let mut request = LogicalRequest::put(to_wire_path(path)?).with_form("dir", true);
        if let Some(ttl) = ttl {
            request = request.with_form("ttl", ttl);
        }
        self.client.dispatcher().execute(&request).await
    }

    /// Resets the TTL of an existing directory.
    pub async fn update_ttl(&self, path: &str, ttl: u64) -> Result<ClientResponse> {
        let request = LogicalRequest::put(to_wire_path(path)?)
            .with_query("dir", true)
            .with_query("prevExist", true)
            .with_form("ttl", ttl);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn list(&self, path: &str, recursive: bool) -> Result<ClientResponse> {
        let mut request = LogicalRequest::get(to_wire_path(path)?);
        if recursive {
            request = request.with_query("recursive", true);
        }
        self.client.dispatcher().execute(&request).await
    }

    /// Deletes an empty directory.
    pub async fn delete(&self, path: &str) -> Result<ClientResponse> {
        let request = LogicalRequest::delete(to_wire_path(path)?).with_query("dir", true);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn delete_recursive(&self, path: &str) -> Result<ClientResponse> {
        let request = LogicalRequest::delete(to_wire_path(path)?)
            .with_query("dir", true)
            .with_query("recursive", true);
        self.client.dispatcher().execute(&request).await
    }
}
