//! CLI module - command-line interface for Foliotrack
//!
//! This module provides a structured CLI using clap for argument parsing.

use clap::{Parser, Subcommand};

/// Foliotrack - personal investment portfolio tracker
#[derive(Parser)]
#[command(name = "foliotrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the API server (default)
    Serve,

    /// Create a default config file
    Init,

    /// Create an admin account directly in the database
    CreateAdmin {
        email: String,
        password: String,
        name: String,
    },
}
