use crate::Client;
use etcd2_common::{to_wire_path, ClientResponse, Etcd2Error, LogicalRequest, Result};
use tracing::debug;

/// Read options of [`NodeOps::get_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Include every descendant of a directory
    pub recursive: bool,
    /// Children in key order
    pub sorted: bool,
    /// Read through the leader
    pub consistent: bool,
    /// Read through quorum
    pub quorum: bool,
}

/// Options of [`NodeOps::wait`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitOptions {
    /// Also fire on changes below the key
    pub recursive: bool,
    /// Fire on the first change at or after this index
    pub wait_index: Option<u64>,
}

/// Preconditions of a compare-and-swap. Unset fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasCondition {
    pub prev_value: Option<String>,
    pub prev_index: Option<u64>,
    pub prev_exist: Option<bool>,
}

impl CasCondition {
    pub fn prev_value(value: impl Into<String>) -> Self {
        Self {
            prev_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn prev_index(index: u64) -> Self {
        Self {
            prev_index: Some(index),
            ..Default::default()
        }
    }

    pub fn prev_exist(exist: bool) -> Self {
        Self {
            prev_exist: Some(exist),
            ..Default::default()
        }
    }

    fn apply(&self, mut request: LogicalRequest) -> LogicalRequest {
        if let Some(value) = &self.prev_value {
            request = request.with_query("prevValue", value);
        }
        if let Some(index) = self.prev_index {
            request = request.with_query("prevIndex", index);
        }
        if let Some(exist) = self.prev_exist {
            request = request.with_query("prevExist", exist);
        }
        request
    }
}

/// Reads, writes and conditional updates of single nodes.
pub struct NodeOps<'a> {
    client: &'a Client,
}

impl<'a> NodeOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, path: &str) -> Result<ClientResponse> {
        self.get_with(path, GetOptions::default()).await
    }

    pub async fn get_with(&self, path: &str, options: GetOptions) -> Result<ClientResponse> {
        let mut request = LogicalRequest::get(to_wire_path(path)?);
        if options.recursive {
            request = request.with_query("recursive", true);
        }
        if options.sorted {
            request = request.with_query("sorted", true);
        }
        if options.consistent {
            request = request.with_query("consistent", true);
        }
        if options.quorum {
            request = request.with_query("quorum", true);
        }
        self.client.dispatcher().execute(&request).await
    }

    /// Blocks until the key changes, then returns the change.
    ///
    /// The server holds the connection open until then. Configure no
    /// request timeout (the default) when waiting on quiet keys.
    pub async fn wait(&self, path: &str, options: WaitOptions) -> Result<ClientResponse> {
        let mut request = LogicalRequest::get(to_wire_path(path)?).with_query("wait", true);
        if options.recursive {
            request = request.with_query("recursive", true);
        }
        if let Some(index) = options.wait_index {
            request = request.with_query("waitIndex", index);
        }
        self.client.dispatcher().execute(&request).await
    }

    /// Sets the value of a file, creating it and any missing parent
    /// directories.
    pub async fn set(&self, path: &str, value: &str, ttl: Option<u64>) -> Result<ClientResponse> {
        self.compare_and_swap(path, value, &CasCondition::default(), ttl)
            .await
    }

    /// Sets the value only if the key does not exist yet.
    pub async fn create_only(
        &self,
        path: &str,
        value: &str,
        ttl: Option<u64>,
    ) -> Result<ClientResponse> {
        self.compare_and_swap(path, value, &CasCondition::prev_exist(false), ttl)
            .await
    }

    /// Sets the value only if the key already exists.
    pub async fn update_only(
        &self,
        path: &str,
        value: &str,
        ttl: Option<u64>,
    ) -> Result<ClientResponse> {
        self.compare_and_swap(path, value, &CasCondition::prev_exist(true), ttl)
            .await
    }

    pub async fn update_if_index(
        &self,
        path: &str,
        value: &str,
        prev_index: u64,
        ttl: Option<u64>,
    ) -> Result<ClientResponse> {
        self.compare_and_swap(path, value, &CasCondition::prev_index(prev_index), ttl)
            .await
    }

    pub async fn update_if_value(
        &self,
        path: &str,
        value: &str,
        prev_value: &str,
        ttl: Option<u64>,
    ) -> Result<ClientResponse> {
        self.compare_and_swap(path, value, &CasCondition::prev_value(prev_value), ttl)
            .await
    }

    /// Writes `value` if every precondition in `condition` holds.
    ///
    /// # Errors
    ///
    /// [`Etcd2Error::PreconditionFailed`] when the server rejects the
    /// comparison, [`Etcd2Error::KeyNotFound`] when the key must exist
    /// and does not.
    pub async fn compare_and_swap(
        &self,
        path: &str,
        value: &str,
        condition: &CasCondition,
        ttl: Option<u64>,
    ) -> Result<ClientResponse> {
        let mut request = LogicalRequest::put(to_wire_path(path)?).with_value(value);
        if let Some(ttl) = ttl {
            request = request.with_form("ttl", ttl);
        }
        let request = condition.apply(request);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn delete(&self, path: &str) -> Result<ClientResponse> {
        let request = LogicalRequest::delete(to_wire_path(path)?);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn delete_if_index(&self, path: &str, prev_index: u64) -> Result<ClientResponse> {
        let request =
            LogicalRequest::delete(to_wire_path(path)?).with_query("prevIndex", prev_index);
        self.client.dispatcher().execute(&request).await
    }

    pub async fn delete_if_value(&self, path: &str, prev_value: &str) -> Result<ClientResponse> {
        let request =
            LogicalRequest::delete(to_wire_path(path)?).with_query("prevValue", prev_value);
        self.client.dispatcher().execute(&request).await
    }

    /// Read-modify-write of a file value.
    ///
    /// Reads the current value, computes the new one with `update` and
    /// writes it back conditioned on the modification index that was read.
    /// A lost race re-reads and retries, up to the configured number of
    /// attempts. The TTL of the file is not carried over.
    ///
    /// # Errors
    ///
    /// - [`Etcd2Error::AtomicUpdateExhausted`] after too many lost races
    /// - [`Etcd2Error::InvalidResponse`] when the key is not a file
    /// - any error of the read or the write other than a lost race
    pub async fn atomic_update<F>(&self, path: &str, mut update: F) -> Result<ClientResponse>
    where
        F: FnMut(&str) -> String,
    {
        let attempts = self.client.config().atomic_update_attempts;

        for attempt in 1..=attempts {
            let current = self.get(path).await?.node;
            let value = current.value().ok_or_else(|| {
                Etcd2Error::InvalidResponse(format!("{} is not a file", path))
            })?;

            let next = update(value);
            match self
                .update_if_index(path, &next, current.modified_index(), None)
                .await
            {
                Err(Etcd2Error::PreconditionFailed { message }) => {
                    debug!(
                        "Atomic update of {} lost a race (attempt {}/{}): {}",
                        path, attempt, attempts, message
                    );
                }
                result => return result,
            }
        }

        Err(Etcd2Error::AtomicUpdateExhausted {
            key: path.to_string(),
            attempts,
        })
    }
}
