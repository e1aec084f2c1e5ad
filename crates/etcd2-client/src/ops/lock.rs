//! Distributed locks of the server's lock module.
//!
//! Two flavors share one key space:
//!
//! - [`IndexLock`]: exclusive; every acquisition gets a fresh index that
//!   must be presented to renew or release it.
//! - [`ValueLock`]: reentrant; holders identify themselves by a value and
//!   re-acquiring with the same value does not block.
//!
//! Using a lock key for any other kind of data makes the server answer 500.

use crate::Client;
use etcd2_common::{Etcd2Error, LogicalRequest, Module, Result};
use std::future::Future;
use tracing::debug;

/// Factory for locks.
pub struct LockOps<'a> {
    client: &'a Client,
}

impl<'a> LockOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// An exclusive lock named `name`, held for `ttl` seconds once acquired.
    pub fn index(&self, name: &str, ttl: u64) -> IndexLock {
        IndexLock {
            client: self.client.clone(),
            path: lock_path(name),
            ttl,
            index: None,
        }
    }

    /// A reentrant lock named `name`, held on behalf of `value`.
    pub fn value(&self, name: &str, value: impl Into<String>, ttl: u64) -> ValueLock {
        ValueLock {
            client: self.client.clone(),
            path: lock_path(name),
            ttl,
            value: value.into(),
        }
    }
}

fn lock_path(name: &str) -> String {
    format!("/{}", name.trim_start_matches('/'))
}

async fn call_lock_module(client: &Client, request: LogicalRequest, action: &str) -> Result<String> {
    let path = request.path.clone();
    let result = client
        .dispatcher()
        .execute_text(&request.in_module(Module::Lock))
        .await;

    if let Err(Etcd2Error::ServerRequest { status: 500, .. }) = &result {
        debug!(
            "Server error while trying to {} lock {}; make sure the key is not used for other data",
            action, path
        );
    }
    result
}

/// Exclusive lock addressed by the index the server hands out.
pub struct IndexLock {
    client: Client,
    path: String,
    ttl: u64,
    index: Option<u64>,
}

impl IndexLock {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Index of the current acquisition, if any.
    pub fn index(&self) -> Option<u64> {
        self.index
    }

    /// Blocks until the lock is ours and returns the acquisition index.
    pub async fn acquire(&mut self) -> Result<u64> {
        debug!("Acquiring lock {}", self.path);
        let request = LogicalRequest::post(self.path.clone()).with_query("ttl", self.ttl);
        let text = call_lock_module(&self.client, request, "acquire").await?;

        let index = parse_index(&text)?.ok_or_else(|| {
            Etcd2Error::InvalidResponse(format!("empty lock index for {}", self.path))
        })?;
        self.index = Some(index);
        Ok(index)
    }

    pub async fn renew(&mut self, ttl: u64) -> Result<()> {
        let index = self
            .index
            .ok_or_else(|| Etcd2Error::LockNotHeld(self.path.clone()))?;

        debug!("Renewing lock {}", self.path);
        let request = LogicalRequest::put(self.path.clone())
            .with_query("ttl", ttl)
            .with_form("index", index);
        call_lock_module(&self.client, request, "renew").await?;
        Ok(())
    }

    /// Index of whoever holds the lock right now, `None` when free.
    pub async fn active_index(&self) -> Result<Option<u64>> {
        let request = LogicalRequest::get(self.path.clone()).with_query("field", "index");
        let text = call_lock_module(&self.client, request, "read").await?;
        parse_index(&text)
    }

    /// Releases the lock. The acquisition is forgotten even if the server
    /// call fails.
    pub async fn release(&mut self) -> Result<()> {
        let index = self
            .index
            .take()
            .ok_or_else(|| Etcd2Error::LockNotHeld(self.path.clone()))?;

        debug!("Releasing lock {}", self.path);
        let request = LogicalRequest::delete(self.path.clone()).with_query("index", index);
        call_lock_module(&self.client, request, "release").await?;
        Ok(())
    }

    /// Runs `task` while holding the lock.
    ///
    /// The lock is released whatever `task` returns; the output is handed
    /// back untouched once the release succeeded.
    pub async fn run_locked<F, T>(&mut self, task: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        self.acquire().await?;
        let output = task.await;
        self.release().await?;
        Ok(output)
    }
}

/// Reentrant lock addressed by the holder's value.
pub struct ValueLock {
    client: Client,
    path: String,
    ttl: u64,
    value: String,
}

impl ValueLock {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub async fn acquire(&self) -> Result<()> {
        debug!("Acquiring lock {} as {}", self.path, self.value);
        let request = LogicalRequest::post(self.path.clone())
            .with_query("ttl", self.ttl)
            .with_value(self.value.clone());
        call_lock_module(&self.client, request, "acquire").await?;
        Ok(())
    }

    pub async fn renew(&self, ttl: u64) -> Result<()> {
        let request = LogicalRequest::put(self.path.clone())
            .with_query("ttl", ttl)
            .with_value(self.value.clone());
        call_lock_module(&self.client, request, "renew").await?;
        Ok(())
    }

    /// Value of whoever holds the lock right now, `None` when free.
    pub async fn active_value(&self) -> Result<Option<String>> {
        let request = LogicalRequest::get(self.path.clone());
        let text = call_lock_module(&self.client, request, "read").await?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    pub async fn release(&self) -> Result<()> {
        debug!("Releasing lock {} as {}", self.path, self.value);
        let request =
            LogicalRequest::delete(self.path.clone()).with_query("value", self.value.clone());
        call_lock_module(&self.client, request, "release").await?;
        Ok(())
    }

    /// Runs `task` while holding the lock, releasing it afterwards.
    pub async fn run_locked<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        self.acquire().await?;
        let output = task.await;
        self.release().await?;
        Ok(output)
    }
}

fn parse_index(text: &str) -> Result<Option<u64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|_| Etcd2Error::InvalidResponse(format!("bad lock index: {:?}", text)))
}
