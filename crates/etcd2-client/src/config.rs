use etcd2_common::{Etcd2Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_HOST: &str = "ETCD2_HOST";
pub const ENV_PORT: &str = "ETCD2_PORT";
pub const ENV_SCHEME: &str = "ETCD2_SCHEME";
pub const ENV_CA_FILE: &str = "ETCD2_CA_FILE";
pub const ENV_CERT_FILE: &str = "ETCD2_CERT_FILE";
pub const ENV_KEY_FILE: &str = "ETCD2_KEY_FILE";
pub const ENV_TLS_VERIFY: &str = "ETCD2_TLS_VERIFY";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4001;
pub const DEFAULT_SCHEME: &str = "http";

/// TLS material used for every call made by a client.
///
/// All fields are optional. With `scheme = "https"` and nothing else set,
/// the server is verified against the built-in web PKI roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// PEM bundle of CA certificates trusted for the server
    pub ca_file: Option<PathBuf>,
    /// PEM client certificate for mutual TLS
    pub cert_file: Option<PathBuf>,
    /// PEM private key matching `cert_file`
    pub key_file: Option<PathBuf>,
    /// Verify the server certificate (default: true)
    pub verify: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            ca_file: None,
            cert_file: None,
            key_file: None,
            verify: true,
        }
    }
}

/// Client configuration, built once at startup and handed to
/// [`Client::connect`](crate::Client::connect).
///
/// # Example
///
/// ```rust
/// use etcd2_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_host("10.0.0.5")
///     .with_port(2379)
///     .with_failover_cooldown(Duration::from_secs(2));
///
/// assert_eq!(config.prefix(), "http://10.0.0.5:2379");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// `http` or `https`
    pub scheme: String,
    pub tls: TlsConfig,
    /// Time a failed member stays ineligible for election
    ///
    /// Default: 5 seconds
    pub failover_cooldown: Duration,
    /// Bound on establishing a TCP/TLS connection
    ///
    /// Default: 5 seconds
    pub connect_timeout: Duration,
    /// Bound on a whole request, `None` for unbounded
    ///
    /// Default: None, so long-poll waits are held as long as the server wants
    pub request_timeout: Option<Duration>,
    /// Seed the membership from the server's machine listing
    ///
    /// Default: true
    pub discover_members: bool,
    /// Compare-and-swap attempts made by `atomic_update` before giving up
    ///
    /// Default: 10
    pub atomic_update_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.to_string(),
            tls: TlsConfig::default(),
            failover_cooldown: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            request_timeout: None,
            discover_members: true,
            atomic_update_attempts: 10,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the `ETCD2_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Etcd2Error::Config`] when `ETCD2_PORT` is not a port number
    /// or `ETCD2_SCHEME` is neither `http` nor `https`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            config.port = port.trim().parse().map_err(|_| {
                Etcd2Error::Config(format!("{} is not a valid port: {:?}", ENV_PORT, port))
            })?;
        }

        if let Some(scheme) = lookup(ENV_SCHEME) {
            config.scheme = parse_scheme(&scheme)?;
        }

        config.tls.ca_file = lookup(ENV_CA_FILE).map(PathBuf::from);
        config.tls.cert_file = lookup(ENV_CERT_FILE).map(PathBuf::from);
        config.tls.key_file = lookup(ENV_KEY_FILE).map(PathBuf::from);

        if let Some(verify) = lookup(ENV_TLS_VERIFY) {
            config.tls.verify = !matches!(
                verify.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tls.ca_file = Some(path.into());
        self
    }

    pub fn with_client_cert(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls.cert_file = Some(cert.into());
        self.tls.key_file = Some(key.into());
        self
    }

    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls.verify = verify;
        self
    }

    pub fn with_failover_cooldown(mut self, cooldown: Duration) -> Self {
        self.failover_cooldown = cooldown;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn without_discovery(mut self) -> Self {
        self.discover_members = false;
        self
    }

    pub fn with_atomic_update_attempts(mut self, attempts: u32) -> Self {
        self.atomic_update_attempts = attempts;
        self
    }

    /// `scheme://host:port` of the configured member.
    pub fn prefix(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn is_tls(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// Builds the HTTP transport shared by every call of one client.
    ///
    /// # Errors
    ///
    /// - [`Etcd2Error::Io`] when a configured PEM file cannot be read
    /// - [`Etcd2Error::Config`] when the material is rejected, or when only
    ///   one of certificate and key is configured
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        parse_scheme(&self.scheme)?;

        let mut builder = reqwest::Client::builder().connect_timeout(self.connect_timeout);

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ca_file) = &self.tls.ca_file {
            let pem = std::fs::read(ca_file)?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                Etcd2Error::Config(format!("bad CA bundle {}: {}", ca_file.display(), e))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        match (&self.tls.cert_file, &self.tls.key_file) {
            (Some(cert_file), Some(key_file)) => {
                let mut pem = std::fs::read(cert_file)?;
                pem.push(b'\n');
                pem.extend(std::fs::read(key_file)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    Etcd2Error::Config(format!(
                        "bad client identity {} / {}: {}",
                        cert_file.display(),
                        key_file.display(),
                        e
                    ))
                })?;
                builder = builder.identity(identity);
            }
            (Some(_), None) => {
                return Err(Etcd2Error::Config(
                    "client certificate configured without a key".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(Etcd2Error::Config(
                    "client key configured without a certificate".to_string(),
                ))
            }
            (None, None) => {}
        }

        if !self.tls.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Etcd2Error::Config(format!("cannot build HTTP client: {}", e)))
    }
}

fn parse_scheme(scheme: &str) -> Result<String> {
    let scheme = scheme.trim().to_ascii_lowercase();
    match scheme.as_str() {
        "http" | "https" => Ok(scheme),
        _ => Err(Etcd2Error::Config(format!(
            "unsupported scheme {:?}, expected http or https",
            scheme
        ))),
    }
}
