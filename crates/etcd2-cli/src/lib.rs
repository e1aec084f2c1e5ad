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

//! # etcd2 CLI
//!
//! Command-line client for etcd v2 clusters.
//!
//! The CLI uses the `argh` crate for argument parsing and dispatches every
//! subcommand to one operation of `etcd2-client`. Output is kept plain so it
//! pipes well: values are printed raw, listings one key per line, stats as
//! JSON.
//!
//! ## Key Commands
//!
//! - `etcd2 get /key`: print a value
//! - `etcd2 set /key value --ttl 60`: write a value
//! - `etcd2 ls / --recursive`: list keys
//! - `etcd2 watch /key`: wait for the next change
//! - `etcd2 stats self`: member statistics as JSON

pub mod args;
pub mod output;


use anyhow::{bail, Result};
use args::{Cli, Commands, StatsKind};
use etcd2_client::{Client, ClientConfig, GetOptions, WaitOptions};

/// Builds the client configuration: environment first, flags on top.
pub fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    apply_flags(cli, &mut config);
    Ok(config)
}

fn apply_flags(cli: &Cli, config: &mut ClientConfig) {
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(scheme) = &cli.scheme {
        config.scheme = scheme.clone();
    }
    if let Some(ca_file) = &cli.ca_file {
        config.tls.ca_file = Some(ca_file.into());
    }
    if let Some(cert_file) = &cli.cert_file {
        config.tls.cert_file = Some(cert_file.into());
    }
    if let Some(key_file) = &cli.key_file {
        config.tls.key_file = Some(key_file.into());
    }
    if cli.insecure {
        config.tls.verify = false;
    }
    if cli.no_discovery {
        config.discover_members = false;
    }
}

/// Runs one parsed command line, printing its result to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let config = client_config(&cli)?;
    let client = Client::connect(config).await?;

    match cli.command {
        Commands::Get(args) => {
            let options = GetOptions {
                consistent: args.consistent,
                ..Default::default()
            };
            let response = client.node().get_with(&args.key, options).await?;
            println!("{}", output::value(&response.node)?);
        }
        Commands::Set(args) => {
            let response = client.node().set(&args.key, &args.value, args.ttl).await?;
            println!("{}", output::value(&response.node)?);
        }
        Commands::Mk(args) => {
            let response = client
                .node()
                .create_only(&args.key, &args.value, args.ttl)
                .await?;
            println!("{}", output::value(&response.node)?);
        }
        Commands::Update(args) => {
            let response = client
                .node()
                .update_only(&args.key, &args.value, args.ttl)
                .await?;
            println!("{}", output::value(&response.node)?);
        }
        Commands::Rm(args) => {
            let node = client.node();
            match (args.with_value, args.with_index) {
                (Some(_), Some(_)) => bail!("--with-value and --with-index are exclusive"),
                (Some(value), None) => node.delete_if_value(&args.key, &value).await?,
                (None, Some(index)) => node.delete_if_index(&args.key, index).await?,
                (None, None) => node.delete(&args.key).await?,
            };
        }
        Commands::Mkdir(args) => {
            client.directory().create(&args.key, args.ttl).await?;
        }
        Commands::Rmdir(args) => {
            if args.recursive {
                client.directory().delete_recursive(&args.key).await?;
            } else {
                client.directory().delete(&args.key).await?;
            }
        }
        Commands::Ls(args) => {
            let key = args.key.as_deref().unwrap_or("/");
            let options = GetOptions {
                recursive: args.recursive,
                sorted: args.sort,
                ..Default::default()
            };
            let response = client.node().get_with(key, options).await?;
            for line in output::listing(&response.node)? {
                println!("{}", line);
            }
        }
        Commands::Watch(args) => {
            let options = WaitOptions {
                recursive: args.recursive,
                wait_index: args.index,
            };
            let response = client.node().wait(&args.key, options).await?;
            println!("{}", output::change(&response));
        }
        Commands::Machines(_) => {
            for machine in client.server().machines().await? {
                println!("{}", machine);
            }
        }
        Commands::Version(_) => {
            println!("{}", client.server().version().await?);
        }
        Commands::Stats(args) => {
            let json = match args.kind {
                StatsKind::Leader => serde_json::to_string_pretty(&client.stats().leader().await?)?,
                StatsKind::SelfStats => {
                    serde_json::to_string_pretty(&client.stats().self_stats().await?)?
                }
                StatsKind::Store => serde_json::to_string_pretty(&client.stats().store().await?)?,
            };
            println!("{}", json);
        }
    }

    Ok(())
}
