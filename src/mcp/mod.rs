//! MCP (Model Context Protocol) server exposing Bear notes.
//!
//! Reads go straight to Bear's database through [`NoteReader`]. Writes are
//! sent to Bear as x-callback URLs through [`NoteWriter`] and answered with a
//! "dispatched" receipt as soon as the URL is handed off.
//!
//! Consistency contract: a write tool never reports the state of a note. Bear
//! gives no confirmation, so a write followed by a read may or may not show
//! the change yet, and a write to an unknown id is dispatched and silently
//! ignored by Bear. Callers that need to know the outcome must issue a read.

pub mod error;
pub mod tools;

use crate::command::{NewNote, NoteWriter};
use crate::store::NoteReader;
use error::McpError;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::*,
    service::RoleServer,
    tool, tool_handler, tool_router, ErrorData as McpErrorData, ServerHandler,
};
use tools::*;

/// The MCP server for Bear.
#[derive(Clone)]
pub struct BearServer {
    /// Read path: direct, read-only queries.
    pub reader: NoteReader,
    /// Write path: unconfirmed URL-scheme requests.
    pub writer: NoteWriter,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

#[tool_router]
impl BearServer {
    pub fn new(reader: NoteReader, writer: NoteWriter) -> Self {
        Self {
            reader,
            writer,
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// This method runs the server until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(self, transport: T) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport).await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        running.waiting().await.map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Ping tool for health checks.
    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[tool(description = "Get all notes from Bear that are not archived or trashed, most recently modified first")]
    pub async fn get_notes(&self) -> Result<CallToolResult, McpErrorData> {
        let notes = self.reader.list_notes().map_err(McpError::from)?;
        Ok(json_result(&NotesResponse::from(notes))?)
    }

    #[tool(description = "Get all note tags. You can list the notes for a tag with get_notes_by_tag")]
    pub async fn get_tags(&self) -> Result<CallToolResult, McpErrorData> {
        let tags = self.reader.list_tags().map_err(McpError::from)?;
        let response = TagsResponse {
            count: tags.len(),
            tags,
        };
        Ok(json_result(&response)?)
    }

    #[tool(description = "Get notes whose title or text contains a string (case-insensitive)")]
    pub async fn get_notes_like(
        &self,
        Parameters(params): Parameters<GetNotesLikeParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let notes = self
            .reader
            .search_text(&params.like)
            .map_err(McpError::from)?;
        Ok(json_result(&NotesResponse::from(notes))?)
    }

    #[tool(description = "Get a specific note by its unique identifier")]
    pub async fn get_note_by_id(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let note = self
            .reader
            .get_by_id(&params.note_id)
            .map_err(McpError::from)?;
        Ok(json_result(&NoteResponse { note })?)
    }

    #[tool(description = "Get all notes with a specific tag, including nested tags")]
    pub async fn get_notes_by_tag(
        &self,
        Parameters(params): Parameters<TagParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let notes = self.reader.get_by_tag(&params.tag).map_err(McpError::from)?;
        Ok(json_result(&NotesResponse::from(notes))?)
    }

    #[tool(description = "Get all archived notes")]
    pub async fn get_archived_notes(&self) -> Result<CallToolResult, McpErrorData> {
        let notes = self.reader.list_archived().map_err(McpError::from)?;
        Ok(json_result(&NotesResponse::from(notes))?)
    }

    // ========================================================================
    // Writes (dispatched, never confirmed)
    // ========================================================================

    #[tool(description = "Create a new note in Bear. Returns once the request is sent; use a read tool to confirm")]
    pub async fn create_note(
        &self,
        Parameters(params): Parameters<CreateNoteParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let note = NewNote {
            title: params.title,
            text: params.text,
            tags: params.tags.unwrap_or_default(),
            pin: params.pin.unwrap_or(false),
            open_note: params.open_note.unwrap_or(false),
        };
        let dispatched = self.writer.create_note(&note).map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Add text to an existing note (mode: append, prepend, or replace)")]
    pub async fn add_text(
        &self,
        Parameters(params): Parameters<AddTextParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let mode = parse_text_mode(params.mode.as_deref())?;
        let dispatched = self
            .writer
            .add_text(
                &params.note_id,
                &params.text,
                mode,
                params.open_note.unwrap_or(false),
            )
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Add tags to an existing note")]
    pub async fn add_tags(
        &self,
        Parameters(params): Parameters<AddTagsParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .add_tags(&params.note_id, &params.tags)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Move a note to trash")]
    pub async fn trash_note(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .trash_note(&params.note_id)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Archive a note")]
    pub async fn archive_note(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .archive_note(&params.note_id)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Unarchive a note")]
    pub async fn unarchive_note(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .unarchive_note(&params.note_id)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Rename a tag across all notes")]
    pub async fn rename_tag(
        &self,
        Parameters(params): Parameters<RenameTagParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .rename_tag(&params.old_tag, &params.new_tag)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Open Bear and show all notes with a specific tag")]
    pub async fn open_tag(
        &self,
        Parameters(params): Parameters<TagParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self.writer.open_tag(&params.tag).map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Open a specific note in Bear")]
    pub async fn open_note(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self
            .writer
            .open_note(&params.note_id)
            .map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }

    #[tool(description = "Open Bear and show search results for a term")]
    pub async fn search_bear(
        &self,
        Parameters(params): Parameters<SearchBearParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let dispatched = self.writer.search(&params.term).map_err(McpError::from)?;
        Ok(json_result(&DispatchResponse::from(dispatched))?)
    }
}

#[tool_handler]
impl ServerHandler for BearServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Bear notes server. get_* tools read Bear's database directly and \
                 reflect its current state. Write tools (create_note, add_text, \
                 add_tags, trash_note, archive_note, unarchive_note, rename_tag) and \
                 UI tools (open_note, open_tag, search_bear) only send a request to \
                 Bear and return 'dispatched'; Bear does not confirm the change. \
                 Identify notes by note_id, never by title, and read the note again \
                 to check the outcome of a write. A missing or mistyped required \
                 argument is rejected with -32602 (invalid params); a present but \
                 invalid value is rejected with -32003 and data.error_type \
                 'InvalidInput'."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DryRunDispatcher;
    use crate::mcp::error::error_codes;
    use crate::store::fixtures::{FixtureNote, FixtureStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_test_server() -> (BearServer, Arc<DryRunDispatcher>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = FixtureStore::create(tmp.path());
        store
            .insert(FixtureNote {
                id: "NOTE-1",
                title: "Weekly review",
                text: "# Weekly review\nCheck #work items",
                modified: 20.0,
                ..Default::default()
            })
            .insert(FixtureNote {
                id: "NOTE-2",
                title: "Garden",
                text: "Plant tomatoes #home",
                pinned: true,
                modified: 10.0,
                ..Default::default()
            })
            .insert(FixtureNote {
                id: "NOTE-3",
                title: "Tax 2019",
                text: "Filed #home/finance",
                archived: true,
                ..Default::default()
            })
            .tag("work")
            .tag("home")
            .tag("home/finance");

        let reader = NoteReader::open(&store.path).unwrap();
        let dispatcher = Arc::new(DryRunDispatcher::new());
        let writer = NoteWriter::new(dispatcher.clone());
        (BearServer::new(reader, writer), dispatcher, tmp)
    }

    fn json_of(result: &CallToolResult) -> serde_json::Value {
        let text = result
            .content
            .first()
            .and_then(|c| {
                if let RawContent::Text(ref t) = c.raw {
                    Some(t.text.clone())
                } else {
                    None
                }
            })
            .expect("text content");
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_server_info() {
        let (server, _, _tmp) = setup_test_server();
        let info = server.get_info();
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("dispatched"));
        assert!(instructions.contains("-32602"));
    }

    #[test]
    fn test_missing_required_argument_is_invalid_params() {
        // Same deserialization rmcp applies to `Parameters<T>` before a tool runs.
        let args = serde_json::json!({ "text": "more" }).as_object().unwrap().clone();
        let err =
            rmcp::handler::server::tool::parse_json_object::<AddTextParams>(args).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("note_id"));
        assert!(err.data.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let (server, _, _tmp) = setup_test_server();
        assert!(server.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_get_notes() {
        let (server, _, _tmp) = setup_test_server();
        let value = json_of(&server.get_notes().await.unwrap());
        assert_eq!(value["count"], 2);
        assert_eq!(value["notes"][0]["id"], "NOTE-1");
        assert_eq!(value["notes"][1]["pinned"], true);
        for note in value["notes"].as_array().unwrap() {
            assert_eq!(note["archived"], false);
        }
    }

    #[tokio::test]
    async fn test_get_archived_notes() {
        let (server, _, _tmp) = setup_test_server();
        let value = json_of(&server.get_archived_notes().await.unwrap());
        assert_eq!(value["count"], 1);
        assert_eq!(value["notes"][0]["archived"], true);
    }

    #[tokio::test]
    async fn test_get_tags() {
        let (server, _, _tmp) = setup_test_server();
        let value = json_of(&server.get_tags().await.unwrap());
        assert_eq!(
            value["tags"],
            serde_json::json!(["home", "home/finance", "work"])
        );
    }

    #[tokio::test]
    async fn test_get_notes_like() {
        let (server, _, _tmp) = setup_test_server();
        let result = server
            .get_notes_like(Parameters(GetNotesLikeParams {
                like: "TOMATO".to_string(),
            }))
            .await
            .unwrap();
        let value = json_of(&result);
        assert_eq!(value["count"], 1);
        assert_eq!(value["notes"][0]["id"], "NOTE-2");
    }

    #[tokio::test]
    async fn test_get_notes_like_empty_query() {
        let (server, _, _tmp) = setup_test_server();
        let err = server
            .get_notes_like(Parameters(GetNotesLikeParams {
                like: String::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(error_codes::INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_get_note_by_id() {
        let (server, _, _tmp) = setup_test_server();
        let result = server
            .get_note_by_id(Parameters(NoteIdParams {
                note_id: "NOTE-3".to_string(),
            }))
            .await
            .unwrap();
        let value = json_of(&result);
        assert_eq!(value["note"]["id"], "NOTE-3");
        assert_eq!(value["note"]["tags"], serde_json::json!(["home/finance"]));
    }

    #[tokio::test]
    async fn test_get_note_by_id_not_found() {
        let (server, _, _tmp) = setup_test_server();
        let err = server
            .get_note_by_id(Parameters(NoteIdParams {
                note_id: "note-1".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(error_codes::NOTE_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_get_notes_by_tag() {
        let (server, _, _tmp) = setup_test_server();
        let result = server
            .get_notes_by_tag(Parameters(TagParams {
                tag: "home".to_string(),
            }))
            .await
            .unwrap();
        let value = json_of(&result);
        // NOTE-3 is archived, so only the active note shows up.
        assert_eq!(value["count"], 1);
        assert_eq!(value["notes"][0]["id"], "NOTE-2");
    }

    #[tokio::test]
    async fn test_create_note_dispatches() {
        let (server, sent, _tmp) = setup_test_server();
        let result = server
            .create_note(Parameters(CreateNoteParams {
                title: Some("a&b=c".to_string()),
                text: Some("x y".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        let value = json_of(&result);
        assert_eq!(value["status"], "dispatched");
        assert_eq!(value["action"], "create");
        assert_eq!(
            sent.sent(),
            vec!["bear://x-callback-url/create?title=a%26b%3Dc&text=x%20y"]
        );
    }

    #[tokio::test]
    async fn test_create_note_does_not_touch_reads() {
        let (server, _, _tmp) = setup_test_server();
        server
            .create_note(Parameters(CreateNoteParams {
                title: Some("Never lands".to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        let value = json_of(&server.get_notes().await.unwrap());
        assert_eq!(value["count"], 2);
    }

    #[tokio::test]
    async fn test_add_text_invalid_mode_not_dispatched() {
        let (server, sent, _tmp) = setup_test_server();
        let err = server
            .add_text(Parameters(AddTextParams {
                note_id: "NOTE-1".to_string(),
                text: "more".to_string(),
                mode: Some("sideways".to_string()),
                open_note: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(error_codes::INVALID_INPUT));
        assert!(sent.sent().is_empty());
    }

    #[tokio::test]
    async fn test_add_text_defaults_to_append() {
        let (server, sent, _tmp) = setup_test_server();
        server
            .add_text(Parameters(AddTextParams {
                note_id: "NOTE-1".to_string(),
                text: "more".to_string(),
                mode: None,
                open_note: Some(true),
            }))
            .await
            .unwrap();
        assert_eq!(
            sent.sent(),
            vec!["bear://x-callback-url/add-text?id=NOTE-1&text=more&mode=append&open_note=yes"]
        );
    }

    #[tokio::test]
    async fn test_add_tags_reserved_delimiter_not_dispatched() {
        let (server, sent, _tmp) = setup_test_server();
        let err = server
            .add_tags(Parameters(AddTagsParams {
                note_id: "NOTE-1".to_string(),
                tags: vec!["ok".to_string(), "bad,tag".to_string()],
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode(error_codes::INVALID_INPUT));
        assert!(sent.sent().is_empty());
    }

    #[tokio::test]
    async fn test_trash_unknown_note_is_accepted() {
        let (server, sent, _tmp) = setup_test_server();
        let result = server
            .trash_note(Parameters(NoteIdParams {
                note_id: "nonexistent-id".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(json_of(&result)["status"], "dispatched");
        assert_eq!(sent.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_archive_and_unarchive() {
        let (server, sent, _tmp) = setup_test_server();
        server
            .archive_note(Parameters(NoteIdParams {
                note_id: "NOTE-1".to_string(),
            }))
            .await
            .unwrap();
        server
            .unarchive_note(Parameters(NoteIdParams {
                note_id: "NOTE-1".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            sent.sent(),
            vec![
                "bear://x-callback-url/archive?id=NOTE-1",
                "bear://x-callback-url/unarchive?id=NOTE-1",
            ]
        );
    }

    #[tokio::test]
    async fn test_ui_tools() {
        let (server, sent, _tmp) = setup_test_server();
        server
            .open_note(Parameters(NoteIdParams {
                note_id: "NOTE-2".to_string(),
            }))
            .await
            .unwrap();
        server
            .open_tag(Parameters(TagParams {
                tag: "home".to_string(),
            }))
            .await
            .unwrap();
        server
            .search_bear(Parameters(SearchBearParams {
                term: "tomatoes".to_string(),
            }))
            .await
            .unwrap();
        server
            .rename_tag(Parameters(RenameTagParams {
                old_tag: "home".to_string(),
                new_tag: "house".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            sent.sent(),
            vec![
                "bear://x-callback-url/open-note?id=NOTE-2",
                "bear://x-callback-url/open-tag?name=home",
                "bear://x-callback-url/search?term=tomatoes",
                "bear://x-callback-url/rename-tag?name=home&new_name=house",
            ]
        );
    }
}
