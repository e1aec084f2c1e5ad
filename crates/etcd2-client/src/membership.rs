use etcd2_common::{Etcd2Error, Result};
use std::time::{Duration, Instant};

/// One member of the cluster, addressed by its URL prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMember {
    /// `scheme://host:port`
    pub prefix: String,
    pub last_failure: Option<Instant>,
}

impl ClusterMember {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: normalize(&prefix.into()),
            last_failure: None,
        }
    }

    /// A member is eligible once its cooldown has fully elapsed.
    pub fn is_eligible(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_failure {
            None => true,
            Some(failed_at) => now.saturating_duration_since(failed_at) > cooldown,
        }
    }
}

/// Known members and the one requests currently go to.
///
/// Members are never added or removed after construction; only failure
/// timestamps and the active index change.
#[derive(Debug, Clone)]
pub struct ClusterMembership {
    members: Vec<ClusterMember>,
    active: usize,
}

impl ClusterMembership {
    /// Builds the membership from the published member list.
    ///
    /// The active member is the one whose prefix equals `own_prefix`.
    /// Duplicate prefixes are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// [`Etcd2Error::MembershipMismatch`] when `own_prefix` is not
    /// published, e.g. because the client was configured with a hostname
    /// and the cluster advertises IP addresses.
    pub fn new(prefixes: Vec<String>, own_prefix: &str) -> Result<Self> {
        let mut members: Vec<ClusterMember> = Vec::with_capacity(prefixes.len());
        for prefix in prefixes {
            let member = ClusterMember::new(prefix);
            if !members.iter().any(|m| m.prefix == member.prefix) {
                members.push(member);
            }
        }

        let own = normalize(own_prefix);
        let active = members
            .iter()
            .position(|m| m.prefix == own)
            .ok_or_else(|| Etcd2Error::MembershipMismatch {
                prefix: own.clone(),
                members: members.iter().map(|m| m.prefix.clone()).collect(),
            })?;

        Ok(Self { members, active })
    }

    /// A membership of exactly one member, used when discovery is off.
    pub fn single(prefix: impl Into<String>) -> Self {
        Self {
            members: vec![ClusterMember::new(prefix)],
            active: 0,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_prefix(&self) -> &str {
        &self.members[self.active].prefix
    }

    pub fn members(&self) -> &[ClusterMember] {
        &self.members
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.members.iter().map(|m| m.prefix.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Records `now` as the last failure of the active member.
    pub fn mark_current_failed(&mut self, now: Instant) {
        self.members[self.active].last_failure = Some(now);
    }

    /// Moves the active index to the next eligible member.
    ///
    /// The scan starts just after the active member and wraps around,
    /// visiting every other member once. Each eligible member overwrites
    /// the candidate, so the last one seen wins: with several eligible
    /// members, the one just before the active index is elected.
    ///
    /// # Errors
    ///
    /// [`Etcd2Error::AllMembersFailed`] when no other member is outside its
    /// cooldown window. The active index is left unchanged.
    pub fn elect_next(&mut self, now: Instant, cooldown: Duration) -> Result<&str> {
        let count = self.members.len();
        let mut candidate = None;

        for offset in 1..count {
            let index = (self.active + offset) % count;
            if self.members[index].is_eligible(now, cooldown) {
                candidate = Some(index);
            }
        }

        let elected = candidate.ok_or(Etcd2Error::AllMembersFailed)?;
        self.active = elected;
        Ok(self.active_prefix())
    }
}

/// Extracts the client URL from one machine listing value.
///
/// Values are URL-encoded `key=value` pairs, e.g.
/// `raft=http%3A%2F%2F10.0.0.1%3A7001&etcd=http%3A%2F%2F10.0.0.1%3A4001`.
pub fn parse_machine_entry(value: &str) -> Option<String> {
    url::form_urlencoded::parse(value.as_bytes())
        .find(|(key, _)| key == "etcd")
        .map(|(_, prefix)| normalize(&prefix))
        .filter(|prefix| !prefix.is_empty())
}

fn normalize(prefix: &str) -> String {
    prefix.trim().trim_end_matches('/').to_string()
}
