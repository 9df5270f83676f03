use clap::Parser;
use bear_mcp::cli::{
    handle_check, handle_get, handle_notes, handle_search, handle_serve, handle_tagged,
    handle_tags, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();

    // stdout carries the MCP protocol, so logs always go to stderr.
    let default_level = match command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let db = cli.db;
    let result = match command {
        Commands::Serve { dry_run } => handle_serve(db, dry_run),
        Commands::Notes { archived, json } => handle_notes(db, archived, json),
        Commands::Tags { json } => handle_tags(db, json),
        Commands::Search { query, json } => handle_search(db, query, json),
        Commands::Get { id, json } => handle_get(db, id, json),
        Commands::Tagged { tag, json } => handle_tagged(db, tag, json),
        Commands::Check => handle_check(db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
