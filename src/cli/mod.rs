//! Command-line interface for recruitr.

use clap::{Parser, Subcommand};

/// Recruitr - multi-tenant recruitment backend
#[derive(Parser)]
#[command(name = "recruitr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default)
    Serve,

    /// Apply pending schema migrations and exit.
    /// Exits non-zero when a migration fails fatally.
    Migrate {
        /// Directory of ordered *.sql files; defaults to the configured one
        #[arg(long)]
        dir: Option<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
