use thiserror::Error;

#[derive(Error, Debug)]
pub enum Etcd2Error {
    #[error("Invalid path: [{0}] should have been absolute")]
    InvalidPath(String),

    #[error("Membership mismatch: {prefix} is not among the published members {members:?}")]
    MembershipMismatch { prefix: String, members: Vec<String> },

    #[error("All cluster members failed")]
    AllMembersFailed,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Precondition failed: {message}")]
    PreconditionFailed { message: String },

    #[error("Key not found: {key} ({message})")]
    KeyNotFound { key: String, message: String },

    #[error("Already exists: {key} ({message})")]
    AlreadyExists { key: String, message: String },

    #[error("Malformed node: {0}")]
    MalformedNode(String),

    #[error("Not a collection: {0} was fetched without children")]
    NotACollection(String),

    #[error("Server request failed with HTTP {status}: {body}")]
    ServerRequest { status: u16, body: String },

    #[error("Atomic update of {key} exhausted after {attempts} attempts")]
    AtomicUpdateExhausted { key: String, attempts: u32 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Lock not held: {0}")]
    LockNotHeld(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Etcd2Error {
    /// Whether the dispatcher may fail over to another member on this error.
    ///
    /// Only transport-level failures qualify. Any HTTP answer, including
    /// 404 or 412, came from a reachable member and is a meaningful outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Etcd2Error::Connection(_))
    }
}

impl From<serde_json::Error> for Etcd2Error {
    fn from(err: serde_json::Error) -> Self {
        Etcd2Error::MalformedNode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Etcd2Error>;
