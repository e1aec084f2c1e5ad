use crate::membership::ClusterMembership;
use etcd2_common::{check_status, ClientResponse, Etcd2Error, LogicalRequest, Result, Verb};
use reqwest::{Method, Url};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Status and body of an HTTP answer, before any translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body of a 2xx answer, the translated error otherwise.
    pub fn into_text(self) -> Result<String> {
        check_status(self.status, &self.body)?;
        Ok(self.body)
    }

    /// The decoded envelope of a 2xx answer, the translated error otherwise.
    pub fn into_response(self) -> Result<ClientResponse> {
        check_status(self.status, &self.body)?;
        ClientResponse::decode(self.body.as_bytes())
    }
}

/// Executes logical requests against the active cluster member.
///
/// The dispatcher owns the only copy of the membership. Every rotation is
/// made under its write lock, so all callers sharing a dispatcher observe
/// the same active member.
///
/// # Failover
///
/// Only a failure to connect moves requests to another member. Any HTTP
/// answer, whatever its status, is returned to the caller as is. The loop
/// ends when a member answers or when [`ClusterMembership::elect_next`]
/// finds no member outside its cooldown.
pub struct Dispatcher {
    http: reqwest::Client,
    membership: Arc<RwLock<ClusterMembership>>,
    cooldown: Duration,
}

impl Dispatcher {
    pub fn new(http: reqwest::Client, membership: ClusterMembership, cooldown: Duration) -> Self {
        Self {
            http,
            membership: Arc::new(RwLock::new(membership)),
            cooldown,
        }
    }

    /// Shared handle on the membership.
    pub fn membership(&self) -> Arc<RwLock<ClusterMembership>> {
        Arc::clone(&self.membership)
    }

    pub async fn active_prefix(&self) -> String {
        self.membership.read().await.active_prefix().to_string()
    }

    /// Executes `request` and decodes the answer into a [`ClientResponse`].
    pub async fn execute(&self, request: &LogicalRequest) -> Result<ClientResponse> {
        self.execute_raw(request).await?.into_response()
    }

    /// Executes `request` and returns the body of a 2xx answer as text.
    pub async fn execute_text(&self, request: &LogicalRequest) -> Result<String> {
        self.execute_raw(request).await?.into_text()
    }

    /// Executes `request`, failing over on connection errors, and returns
    /// the first HTTP answer untranslated.
    ///
    /// A member is tried at most once per call: when the election lands on
    /// a member this call already failed against, the call gives up.
    ///
    /// # Errors
    ///
    /// - [`Etcd2Error::Connection`] when the member cannot be reached and the
    ///   request forbids failover, or on transport errors after connecting
    /// - [`Etcd2Error::AllMembersFailed`] when every member is cooling down
    ///   or has already been tried by this call
    pub async fn execute_raw(&self, request: &LogicalRequest) -> Result<RawResponse> {
        let mut tried = HashSet::new();

        loop {
            let prefix = self.active_prefix().await;
            if !tried.insert(prefix.clone()) {
                warn!("Every member was tried once, last elected {}", prefix);
                return Err(Etcd2Error::AllMembersFailed);
            }

            let url = request.url(&prefix)?;
            match self.send(url, request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() => {
                    let reason = format!("{}: {}", prefix, e);
                    if !request.allow_failover {
                        return Err(Etcd2Error::Connection(reason));
                    }
                    self.fail_over(&prefix, &reason).await?;
                }
                Err(e) => {
                    return Err(Etcd2Error::Connection(format!("{}: {}", prefix, e)));
                }
            }
        }
    }

    /// Marks `failed` and elects the next member.
    ///
    /// Nothing happens if another caller already moved away from `failed`.
    async fn fail_over(&self, failed: &str, reason: &str) -> Result<()> {
        let mut membership = self.membership.write().await;
        if membership.active_prefix() != failed {
            debug!("Member {} already rotated out", failed);
            return Ok(());
        }

        let now = Instant::now();
        membership.mark_current_failed(now);

        match membership.elect_next(now, self.cooldown) {
            Ok(elected) => {
                warn!("Member unreachable ({}), failing over to {}", reason, elected);
                Ok(())
            }
            Err(e) => {
                warn!("Member unreachable ({}), no member left to fail over to", reason);
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        url: Url,
        request: &LogicalRequest,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        debug!("{} {}", request.verb, url);

        let method = match request.verb {
            Verb::Get => Method::GET,
            Verb::Put => Method::PUT,
            Verb::Post => Method::POST,
            Verb::Delete => Method::DELETE,
        };
        let mut builder = self.http.request(method, url.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let form = request.form_fields();
        if !form.is_empty() {
            builder = builder.form(&form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("{} {} -> {}", request.verb, url, status);
        Ok(RawResponse { status, body })
    }
}
