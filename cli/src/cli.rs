use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Browse and register users in the roster directory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (defaults to the public directory API)
    #[arg(long, global = true, env = "ROSTER_API_BASE_URL")]
    pub api_url: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List users, page by page
    Users {
        /// Number of pages to load
        #[arg(long, short = 'p', default_value = "1")]
        pages: u32,
    },
    /// List the positions a new user can take
    Positions,
    /// Register a new user
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Phone number, e.g. +380501234567
        #[arg(long)]
        phone: String,

        /// Position id (see `roster positions`)
        #[arg(long)]
        position_id: Option<i64>,

        /// Photo file (JPEG or PNG, at least 70x70)
        #[arg(long)]
        photo: Option<PathBuf>,
    },
}
