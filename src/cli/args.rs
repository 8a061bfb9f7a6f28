//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dmctl")]
#[command(author, version, about = "CLI to configure and control Drone Mission Control onboard software", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (defaults to ~/.dmc.yaml)
    #[arg(long, global = true, env = "DMCTL_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Download latest image versions
    Pull {
        /// Workload to pull (drone, sim)
        #[arg(default_value = "drone")]
        workload: String,
    },

    /// Start dmc containers
    Start {
        /// Workload to start (drone, sim)
        #[arg(default_value = "drone")]
        workload: String,

        /// Recreate if already running
        #[arg(short, long)]
        recreate: bool,

        /// Do not enable automatic restart
        #[arg(short = 'n', long = "no_restart", visible_alias = "no-restart")]
        no_restart: bool,

        /// Simulation location (LAT,LNG,ALT)
        #[arg(short, long, value_name = "LAT,LNG,ALT")]
        location: Option<String>,
    },

    /// Stop dmc containers
    Stop {
        /// Workload to stop (drone, sim)
        #[arg(default_value = "drone")]
        workload: String,
    },

    /// Show running containers
    Ps,

    /// Show logs from running containers
    Logs {
        /// Container to show logs for
        #[arg(default_value = "drone")]
        workload: String,

        /// Attach and continuously output logs
        #[arg(short, long)]
        follow: bool,
    },

    /// Configure dmc settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Lists all configuration
    List,

    /// Clears all configuration
    Clear,

    /// Set a single configuration value
    Set {
        /// Key, e.g. ID, PASSWORD, FCU_URL, MOCK_POSITION
        key: String,
        value: String,
    },

    /// Configure onboard software version
    Obc {
        /// Onboard computer type (rpi, x86, sim)
        kind: String,
    },
}
