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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload of `/v2/stats/leader`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LeaderStats {
    /// Name of the leader
    pub leader: String,
    /// Per-follower statistics, keyed by follower name
    #[serde(default)]
    pub followers: HashMap<String, FollowerStats>,
}

/// Replication statistics of one follower, as seen by the leader
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FollowerStats {
    #[serde(default)]
    pub latency: LatencyStats,
    #[serde(default)]
    pub counts: CountStats,
}

/// Round-trip latency in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatencyStats {
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub standard_deviation: f64,
    #[serde(default)]
    pub minimum: f64,
    #[serde(default)]
    pub maximum: f64,
}

/// Successful and failed append requests
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountStats {
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub fail: u64,
}

/// Payload of `/v2/stats/self`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelfStats {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Raft state, e.g. `StateLeader` or `follower`
    pub state: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub leader_info: LeaderInfo,
    #[serde(default)]
    pub recv_append_request_cnt: u64,
    #[serde(default)]
    pub send_append_request_cnt: u64,
    #[serde(default)]
    pub recv_pkg_rate: Option<f64>,
    #[serde(default)]
    pub recv_bandwidth_rate: Option<f64>,
    #[serde(default)]
    pub send_pkg_rate: Option<f64>,
    #[serde(default)]
    pub send_bandwidth_rate: Option<f64>,
}

impl SelfStats {
    /// Whether the reporting member believes it is the leader
    pub fn is_leader(&self) -> bool {
        self.state.eq_ignore_ascii_case("stateleader") || self.state.eq_ignore_ascii_case("leader")
    }
}

/// Leader as seen by the reporting member
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderInfo {
    #[serde(default)]
    pub leader: String,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

/// Payload of `/v2/stats/store`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreStats {
    pub gets_success: u64,
    pub gets_fail: u64,
    pub sets_success: u64,
    pub sets_fail: u64,
    pub delete_success: u64,
    pub delete_fail: u64,
    pub update_success: u64,
    pub update_fail: u64,
    pub create_success: u64,
    pub create_fail: u64,
    pub compare_and_swap_success: u64,
    pub compare_and_swap_fail: u64,
    pub compare_and_delete_success: u64,
    pub compare_and_delete_fail: u64,
    pub expire_count: u64,
    pub watchers: u64,
}

impl StoreStats {
    /// Sum of all successful operations
    pub fn total_success(&self) -> u64 {
        self.gets_success
            + self.sets_success
            + self.delete_success
            + self.update_success
            + self.create_success
            + self.compare_and_swap_success
            + self.compare_and_delete_success
    }
}
