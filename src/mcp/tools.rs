//! MCP tool types and helpers for the Bear server.
//!
//! This module contains parameter types, result types, and validation helpers
//! for MCP tools. The actual tool implementations are in mod.rs within the
//! #[tool_router] impl block.

use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{Dispatched, TextMode};
use crate::entity::Note;
use crate::mcp::error::McpError;

// ============================================================================
// Parameter Types
// ============================================================================

/// Parameters for get_notes_like tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetNotesLikeParams {
    /// Find notes that have this text in the title or body
    pub like: String,
}

/// Parameters for tools that target a single note
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteIdParams {
    /// The unique identifier of the note (ZUNIQUEIDENTIFIER)
    pub note_id: String,
}

/// Parameters for tools that take a single tag
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TagParams {
    /// Tag name (without # prefix)
    pub tag: String,
}

/// Parameters for create_note tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    /// Note title
    pub title: Option<String>,
    /// Note content (supports Markdown)
    pub text: Option<String>,
    /// Tags to add (without # prefix)
    pub tags: Option<Vec<String>>,
    /// Pin the note to the top of the list
    #[serde(alias = "pinned")]
    pub pin: Option<bool>,
    /// Open the note in Bear after creation
    pub open_note: Option<bool>,
}

/// Parameters for add_text tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddTextParams {
    /// The unique identifier of the note (ZUNIQUEIDENTIFIER)
    pub note_id: String,
    /// Text to add
    pub text: String,
    /// Where to add text: append, prepend, or replace (default: append)
    pub mode: Option<String>,
    /// Open the note in Bear after modification
    pub open_note: Option<bool>,
}

/// Parameters for add_tags tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddTagsParams {
    /// The unique identifier of the note (ZUNIQUEIDENTIFIER)
    pub note_id: String,
    /// Tags to add (without # prefix)
    pub tags: Vec<String>,
}

/// Parameters for rename_tag tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenameTagParams {
    /// Current tag name (without # prefix)
    pub old_tag: String,
    /// New tag name (without # prefix)
    pub new_tag: String,
}

/// Parameters for search_bear tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchBearParams {
    /// Search term
    pub term: String,
}

// ============================================================================
// Result Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
    pub count: usize,
}

impl From<Vec<Note>> for NotesResponse {
    fn from(notes: Vec<Note>) -> Self {
        Self {
            count: notes.len(),
            notes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteResponse {
    pub note: Note,
}

/// Reply to every write tool. `status` is always "dispatched".
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub dispatched: Dispatched,
    pub note: &'static str,
}

const DISPATCH_NOTE: &str = "The request was sent to Bear. Bear does not confirm changes; \
     read the note again to check the result.";

impl From<Dispatched> for DispatchResponse {
    fn from(dispatched: Dispatched) -> Self {
        Self {
            status: "dispatched",
            dispatched,
            note: DISPATCH_NOTE,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn parse_text_mode(mode: Option<&str>) -> Result<TextMode, McpError> {
    let Some(mode) = mode else {
        return Ok(TextMode::default());
    };
    mode.parse().map_err(|_| McpError::InvalidEnumValue {
        field: "mode".to_string(),
        value: mode.to_string(),
        valid: TextMode::VALID.iter().map(|s| s.to_string()).collect(),
    })
}

/// Serialize `value` as the text content of a successful tool result.
pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
