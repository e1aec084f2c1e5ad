// Copyright 2026 etcd2-rs Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Client;
use etcd2_common::{Etcd2Error, LeaderStats, LogicalRequest, Result, SelfStats, StoreStats};
use serde::de::DeserializeOwned;

/// Statistics endpoints
pub struct StatsOps<'a> {
    client: &'a Client,
}

impl<'a> StatsOps<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Leader and follower replication statistics.
    ///
    /// Only the leader answers this; followers reply with an error status.
    pub async fn leader(&self) -> Result<LeaderStats> {
        self.fetch("/stats/leader").await
    }

    pub async fn self_stats(&self) -> Result<SelfStats> {
        self.fetch("/stats/self").await
    }

    pub async fn store(&self) -> Result<StoreStats> {
        self.fetch("/stats/store").await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self
            .client
            .dispatcher()
            .execute_text(&LogicalRequest::get(path))
            .await?;

        serde_json::from_str(&text)
            .map_err(|e| Etcd2Error::InvalidResponse(format!("{}: {}", path, e)))
    }
}
