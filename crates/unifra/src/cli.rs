//! Clap derive structures for the `unifra` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strum::IntoEnumIterator;

use unifra_core::RestResource;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// unifra -- session-safe access to UniFi controller resources
#[derive(Debug, Parser)]
#[command(
    name = "unifra",
    version,
    about = "Read and manage UniFi controller resources with automatic session renewal",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "UNIFI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "UNIFRA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "UNIFI_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Site name
    #[arg(long, short = 's', env = "UNIFI_SITE", global = true)]
    pub site: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "UNIFI_USERNAME", global = true, hide_env = true)]
    pub username: Option<String>,

    /// Controller platform: auto, unifi-os, or classic
    #[arg(long, env = "UNIFI_PLATFORM", global = true)]
    pub platform: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "UNIFI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "UNIFI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and print controller system info
    Check,

    /// List sites visible to the account
    Sites,

    /// Per-subsystem health of the selected site
    Health,

    /// Print the supported resource kinds
    Kinds,

    /// List every object of a kind
    #[command(alias = "ls")]
    List {
        #[arg(value_parser = parse_kind)]
        kind: RestResource,
    },

    /// Fetch one object by id
    Get {
        #[arg(value_parser = parse_kind)]
        kind: RestResource,
        id: String,
    },

    /// Create an object from a JSON body
    Create {
        #[arg(value_parser = parse_kind)]
        kind: RestResource,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Replace an object's fields from a JSON body
    Update {
        #[arg(value_parser = parse_kind)]
        kind: RestResource,
        id: String,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Delete an object (succeeds if already gone)
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: RestResource,
        id: String,
    },
}

/// Request body, inline or from a file.
#[derive(Debug, Args)]
pub struct BodyArgs {
    /// JSON object body
    #[arg(long, short = 'd', required_unless_present = "from_file", conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'f')]
    pub from_file: Option<PathBuf>,
}

fn parse_kind(value: &str) -> Result<RestResource, String> {
    value.parse().map_err(|_| {
        let known: Vec<String> = RestResource::iter().map(|k| k.to_string()).collect();
        format!("unknown kind '{value}' (expected one of: {})", known.join(", "))
    })
}
