use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bear-mcp")]
#[command(version, about = "MCP server for Bear notes")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to Bear's database.sqlite (overrides DB_ROUTE)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Defaults to `serve` so MCP clients can launch the bare binary
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server over stdio
    Serve {
        /// Log Bear URLs instead of opening them
        #[arg(long)]
        dry_run: bool,
    },

    /// List notes, most recently modified first
    Notes {
        /// List archived notes instead of active ones
        #[arg(long)]
        archived: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tags in use
    Tags {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find notes whose title or text contains a string
    Search {
        /// Text to look for (case-insensitive)
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note by its unique identifier
    Get {
        /// Note identifier (ZUNIQUEIDENTIFIER)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes with a tag, including nested tags
    Tagged {
        /// Tag name, with or without the leading '#'
        tag: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that Bear's database can be found and read
    Check,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve { dry_run: false }
    }
}
