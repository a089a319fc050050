use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rmctl", about = "Operator CLI for the edge resource-manager core", version)]
pub struct Cli {
    /// Base URL of a running rm-api server, for the client subcommands.
    #[arg(long, env = "RM_URL", global = true, default_value = "http://localhost:8080")]
    pub server: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server backed by the in-memory inventory fake.
    Serve {
        /// Path to a YAML service config file. Falls back to built-in
        /// defaults (RBAC/sanitisation off, permissive default tenant) when
        /// omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Trigger an out-of-band full resweep of one cache/reconciler kind.
    Resweep {
        /// One of: schedule, profile.
        kind: String,
    },

    /// Print the server's effective configuration flags.
    Status,

    /// Print the assembled update schedule for a host.
    ScheduleFor {
        /// Host GUID, as carried in PlatformUpdateStatusRequest (§6.1).
        host_uuid: String,

        /// Tenant id to act as.
        #[arg(long, env = "RM_TENANT")]
        tenant: String,
    },
}
