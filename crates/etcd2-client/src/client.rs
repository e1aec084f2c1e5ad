use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::membership::{ClusterMember, ClusterMembership};
use crate::ops::{
    server, DirectoryOps, InOrder, LeaderOps, LockOps, NodeOps, ServerOps, StatsOps,
};
use etcd2_common::{validate_path, Result};
use std::sync::Arc;
use tracing::info;

/// etcd v2 client
///
/// Cheap to clone: clones share the transport and the cluster membership,
/// so a failover made by one task is seen by all of them.
///
/// # Example
///
/// ```rust,no_run
/// use etcd2_client::{Client, ClientConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::connect(ClientConfig::from_env()?).await?;
///
/// client.node().set("/config/db", "10.0.0.7", Some(60)).await?;
/// let response = client.node().get("/config/db").await?;
/// assert_eq!(response.node.value(), Some("10.0.0.7"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    dispatcher: Dispatcher,
    config: ClientConfig,
}

impl Client {
    /// Connects to the configured member.
    ///
    /// Probes the server version, then (unless discovery is off) seeds the
    /// membership from the machine listing. Neither call fails over, since
    /// there is no membership to fail over to yet.
    ///
    /// # Errors
    ///
    /// - [`Etcd2Error::Connection`](etcd2_common::Etcd2Error::Connection) when the member is unreachable
    /// - [`Etcd2Error::InvalidResponse`](etcd2_common::Etcd2Error::InvalidResponse) when the version probe is not understood
    /// - [`Etcd2Error::MembershipMismatch`](etcd2_common::Etcd2Error::MembershipMismatch) when the configured
    ///   prefix is not among the published members
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let prefix = config.prefix();
        let client = Self::from_membership(config, ClusterMembership::single(&prefix))?;

        let version = server::probe_version(client.dispatcher()).await?;

        if client.config().discover_members {
            let members = server::list_machines(client.dispatcher()).await?;
            let membership = ClusterMembership::new(members, &prefix)?;
            *client.dispatcher().membership().write().await = membership;
        }

        info!(
            "Connected to etcd {} at {} ({} members)",
            version,
            prefix,
            client.members().await.len()
        );
        Ok(client)
    }

    /// Builds a client over an explicit member list, without contacting
    /// the cluster.
    ///
    /// The configured prefix must be one of `members`.
    pub fn with_members(config: ClientConfig, members: Vec<String>) -> Result<Self> {
        let membership = ClusterMembership::new(members, &config.prefix())?;
        Self::from_membership(config, membership)
    }

    fn from_membership(config: ClientConfig, membership: ClusterMembership) -> Result<Self> {
        let http = config.build_http_client()?;
        let dispatcher = Dispatcher::new(http, membership, config.failover_cooldown);

        Ok(Self {
            inner: Arc::new(ClientInner { dispatcher, config }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Prefix requests currently go to.
    pub async fn active_member(&self) -> String {
        self.inner.dispatcher.active_prefix().await
    }

    /// Snapshot of the membership, in listing order.
    pub async fn members(&self) -> Vec<ClusterMember> {
        let membership = self.inner.dispatcher.membership();
        let membership = membership.read().await;
        membership.members().to_vec()
    }

    pub fn node(&self) -> NodeOps<'_> {
        NodeOps::new(self)
    }

    pub fn directory(&self) -> DirectoryOps<'_> {
        DirectoryOps::new(self)
    }

    pub fn server(&self) -> ServerOps<'_> {
        ServerOps::new(self)
    }

    pub fn stats(&self) -> StatsOps<'_> {
        StatsOps::new(self)
    }

    pub fn lock(&self) -> LockOps<'_> {
        LockOps::new(self)
    }

    pub fn leader(&self) -> LeaderOps<'_> {
        LeaderOps::new(self)
    }

    /// In-order keys under the directory at `path`.
    pub fn inorder(&self, path: &str) -> Result<InOrder> {
        validate_path(path)?;
        Ok(InOrder::new(self.clone(), path))
    }

    /// Alias of [`inorder`](Self::inorder).
    pub fn queue(&self, path: &str) -> Result<InOrder> {
        self.inorder(path)
    }
}
