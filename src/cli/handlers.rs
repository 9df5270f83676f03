use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::command::{Dispatcher, DryRunDispatcher, NoteWriter, SystemDispatcher};
use crate::config::Config;
use crate::entity::Note;
use crate::error::{BearError, Result};
use crate::mcp::BearServer;
use crate::store::NoteReader;

/// Resolve the database path and open it, failing before any work is done
/// if it is missing, unreadable or not shaped like Bear's database.
fn open_reader(db: Option<PathBuf>) -> Result<(Config, NoteReader)> {
    let config = Config::from_env().with_store_path(db);
    let path = config.verify_store()?;
    let reader = NoteReader::open(&path)?;
    Ok((config, reader))
}

pub fn handle_serve(db: Option<PathBuf>, dry_run: bool) -> Result<()> {
    let (config, reader) = open_reader(db)?;

    let dispatcher: Arc<dyn Dispatcher> = if dry_run {
        Arc::new(DryRunDispatcher::new())
    } else {
        Arc::new(SystemDispatcher::new(config.launcher.clone()))
    };
    let server = BearServer::new(reader.clone(), NoteWriter::new(dispatcher));

    info!(
        path = %reader.path().display(),
        dry_run,
        "starting Bear MCP server on stdio"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime
        .block_on(server.serve(rmcp::transport::stdio()))
        .map_err(|e| BearError::Server(e.to_string()))?;

    info!("Bear MCP server stopped");
    Ok(())
}

pub fn handle_notes(db: Option<PathBuf>, archived: bool, json: bool) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let notes = if archived {
        reader.list_archived()?
    } else {
        reader.list_notes()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("{}:\n", if archived { "Archived notes" } else { "Notes" });
        print_notes(&notes);
    }
    Ok(())
}

pub fn handle_tags(db: Option<PathBuf>, json: bool) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let tags = reader.list_tags()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else if tags.is_empty() {
        println!("No tags found.");
    } else {
        for tag in tags {
            println!("  #{}", tag);
        }
    }
    Ok(())
}

pub fn handle_search(db: Option<PathBuf>, query: String, json: bool) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let notes = reader.search_text(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes found for '{}'.", query);
    } else {
        println!("Notes matching '{}':\n", query);
        print_notes(&notes);
    }
    Ok(())
}

pub fn handle_get(db: Option<PathBuf>, id: String, json: bool) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let note = reader.get_by_id(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!("{}", note.title);
    println!("  id:       {}", note.id);
    if let Some(modified) = note.modified_at {
        println!("  modified: {}", modified.to_rfc3339());
    }
    let mut state = Vec::new();
    if note.pinned {
        state.push("pinned");
    }
    if note.archived {
        state.push("archived");
    }
    if note.trashed {
        state.push("trashed");
    }
    if !state.is_empty() {
        println!("  state:    {}", state.join(", "));
    }
    if !note.tags.is_empty() {
        println!("  tags:     {}", note.tags.join(", "));
    }
    println!("\n{}", note.text);
    Ok(())
}

pub fn handle_tagged(db: Option<PathBuf>, tag: String, json: bool) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let notes = reader.get_by_tag(&tag)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes tagged '{}'.", tag);
    } else {
        println!("Notes tagged '{}':\n", tag);
        print_notes(&notes);
    }
    Ok(())
}

pub fn handle_check(db: Option<PathBuf>) -> Result<()> {
    let (_, reader) = open_reader(db)?;
    let active = reader.list_notes()?.len();
    let archived = reader.list_archived()?.len();
    println!("Bear database: {}", reader.path().display());
    println!("  {} active notes, {} archived", active, archived);
    Ok(())
}

fn print_notes(notes: &[Note]) {
    for n in notes {
        let pin = if n.pinned { "*" } else { " " };
        println!("{} {}  {}", pin, n.id, n.title);
        if !n.tags.is_empty() {
            println!("      tags: {}", n.tags.join(", "));
        }
    }
}
