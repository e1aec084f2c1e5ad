use std::str::FromStr;

use argh::FromArgs;

/// etcd2 - command-line client for etcd v2 clusters
#[derive(FromArgs, Debug)]
pub struct Cli {
    /// member host (overrides ETCD2_HOST, default 127.0.0.1)
    #[argh(option)]
    pub host: Option<String>,

    /// member port (overrides ETCD2_PORT, default 4001)
    #[argh(option)]
    pub port: Option<u16>,

    /// http or https (overrides ETCD2_SCHEME)
    #[argh(option)]
    pub scheme: Option<String>,

    /// PEM bundle of trusted CA certificates
    #[argh(option)]
    pub ca_file: Option<String>,

    /// PEM client certificate
    #[argh(option)]
    pub cert_file: Option<String>,

    /// PEM client private key
    #[argh(option)]
    pub key_file: Option<String>,

    /// skip server certificate verification
    #[argh(switch)]
    pub insecure: bool,

    /// talk to the given member only, without listing the cluster
    #[argh(switch)]
    pub no_discovery: bool,

    #[argh(subcommand)]
    pub command: Commands,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum Commands {
    Get(GetArgs),
    Set(SetArgs),
    Mk(MkArgs),
    Update(UpdateArgs),
    Rm(RmArgs),
    Mkdir(MkdirArgs),
    Rmdir(RmdirArgs),
    Ls(LsArgs),
    Watch(WatchArgs),
    Machines(MachinesArgs),
    Version(VersionArgs),
    Stats(StatsArgs),
}

/// Print the value of a key
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "get")]
pub struct GetArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// read through the leader
    #[argh(switch)]
    pub consistent: bool,
}

/// Set the value of a key
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "set")]
pub struct SetArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// new value
    #[argh(positional)]
    pub value: String,

    /// time to live in seconds
    #[argh(option)]
    pub ttl: Option<u64>,
}

/// Create a key that must not exist yet
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "mk")]
pub struct MkArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// value
    #[argh(positional)]
    pub value: String,

    /// time to live in seconds
    #[argh(option)]
    pub ttl: Option<u64>,
}

/// Update a key that must already exist
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "update")]
pub struct UpdateArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// new value
    #[argh(positional)]
    pub value: String,

    /// time to live in seconds
    #[argh(option)]
    pub ttl: Option<u64>,
}

/// Remove a key
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "rm")]
pub struct RmArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// only remove if the current value matches
    #[argh(option)]
    pub with_value: Option<String>,

    /// only remove if the modified index matches
    #[argh(option)]
    pub with_index: Option<u64>,
}

/// Create a directory
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "mkdir")]
pub struct MkdirArgs {
    /// directory path
    #[argh(positional)]
    pub key: String,

    /// time to live in seconds
    #[argh(option)]
    pub ttl: Option<u64>,
}

/// Remove a directory
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "rmdir")]
pub struct RmdirArgs {
    /// directory path
    #[argh(positional)]
    pub key: String,

    /// remove everything below it too
    #[argh(switch, short = 'r')]
    pub recursive: bool,
}

/// List a directory
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "ls")]
pub struct LsArgs {
    /// directory path (default /)
    #[argh(positional)]
    pub key: Option<String>,

    /// descend into subdirectories
    #[argh(switch, short = 'r')]
    pub recursive: bool,

    /// sort entries by key
    #[argh(switch)]
    pub sort: bool,
}

/// Wait for the next change to a key
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "watch")]
pub struct WatchArgs {
    /// key path
    #[argh(positional)]
    pub key: String,

    /// also report changes below the key
    #[argh(switch, short = 'r')]
    pub recursive: bool,

    /// wait for the change at or after this index
    #[argh(option)]
    pub index: Option<u64>,
}

/// List the cluster members
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "machines")]
pub struct MachinesArgs {}

/// Print the server version
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "version")]
pub struct VersionArgs {}

/// Print statistics as JSON
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "stats")]
pub struct StatsArgs {
    /// one of: leader, self, store
    #[argh(positional)]
    pub kind: StatsKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    Leader,
    SelfStats,
    Store,
}

impl FromStr for StatsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leader" => Ok(StatsKind::Leader),
            "self" => Ok(StatsKind::SelfStats),
            "store" => Ok(StatsKind::Store),
            other => Err(format!("unknown stats kind '{}'", other)),
        }
    }
}
