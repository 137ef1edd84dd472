//! CLI module - Command-line interface for annodesk
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// annodesk - image annotation workbench
/// Distributes image batches to annotators and packages labelled results
#[derive(Parser)]
#[command(name = "annodesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Register an account without going through the sign-up page
    CreateUser {
        #[arg(long)]
        email: String,
        /// Display name; stored uppercased
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        /// Grant the administrator role (the first account is always an administrator)
        #[arg(long)]
        admin: bool,
    },
}

pub use commands::*;
