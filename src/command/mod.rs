//! Requests to Bear through its `bear://x-callback-url` scheme.
//!
//! Every mutation goes through here. Requests are fire-and-forget: the result
//! is a [`Dispatched`] receipt meaning "handed off", never "applied". Note ids
//! are not checked against the database before sending; Bear is the authority
//! and silently ignores ids it does not know.

mod dispatch;
mod url;

pub use dispatch::{DryRunDispatcher, Dispatcher, SystemDispatcher};
pub use url::{decode_url, BearAction, XCallbackUrl, URL_PREFIX};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{BearError, Result};

/// Characters that would break Bear's tag markup or the comma-joined tag list.
pub const TAG_RESERVED: &[char] = &[',', '#', '\n', '\r'];

/// Receipt for a request handed to Bear.
///
/// Carries no note data. Bear gives no confirmation, so callers
/// that need the resulting state must read it back separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatched {
    pub action: BearAction,
    pub url: String,
}

/// Where `add_text` puts the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Append,
    Prepend,
    Replace,
}

impl TextMode {
    pub const VALID: &'static [&'static str] = &["append", "prepend", "replace"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextMode::Append => "append",
            TextMode::Prepend => "prepend",
            TextMode::Replace => "replace",
        }
    }
}

impl fmt::Display for TextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextMode {
    type Err = BearError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(TextMode::Append),
            "prepend" => Ok(TextMode::Prepend),
            "replace" => Ok(TextMode::Replace),
            other => Err(BearError::invalid(
                "mode",
                format!(
                    "'{}' is not a valid mode. Use one of: {}",
                    other,
                    TextMode::VALID.join(", ")
                ),
            )),
        }
    }
}

/// Fields for a new note. All optional; an empty note is allowed.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: Option<String>,
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub pin: bool,
    pub open_note: bool,
}

/// Builds Bear URLs and hands them to a [`Dispatcher`].
#[derive(Clone)]
pub struct NoteWriter {
    dispatcher: Arc<dyn Dispatcher>,
}

impl NoteWriter {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn create_note(&self, note: &NewNote) -> Result<Dispatched> {
        let tags = validate_tags(&note.tags, true)?;
        let mut url = XCallbackUrl::new(BearAction::Create);
        if let Some(title) = note.title.as_deref().filter(|t| !t.is_empty()) {
            url = url.param("title", title);
        }
        if let Some(text) = note.text.as_deref().filter(|t| !t.is_empty()) {
            url = url.param("text", text);
        }
        if !tags.is_empty() {
            url = url.param("tags", tags.join(","));
        }
        self.send(url.flag("pin", note.pin).flag("open_note", note.open_note))
    }

    pub fn add_text(
        &self,
        id: &str,
        text: &str,
        mode: TextMode,
        open_note: bool,
    ) -> Result<Dispatched> {
        let id = validate_note_id(id)?;
        let url = XCallbackUrl::new(BearAction::AddText)
            .param("id", id)
            .param("text", text)
            .param("mode", mode.as_str())
            .flag("open_note", open_note);
        self.send(url)
    }

    pub fn add_tags(&self, id: &str, tags: &[String]) -> Result<Dispatched> {
        let id = validate_note_id(id)?;
        let tags = validate_tags(tags, false)?;
        let url = XCallbackUrl::new(BearAction::AddTags)
            .param("id", id)
            .param("tags", tags.join(","));
        self.send(url)
    }

    pub fn trash_note(&self, id: &str) -> Result<Dispatched> {
        self.send_for_note(BearAction::Trash, id)
    }

    pub fn archive_note(&self, id: &str) -> Result<Dispatched> {
        self.send_for_note(BearAction::Archive, id)
    }

    pub fn unarchive_note(&self, id: &str) -> Result<Dispatched> {
        self.send_for_note(BearAction::Unarchive, id)
    }

    pub fn open_note(&self, id: &str) -> Result<Dispatched> {
        self.send_for_note(BearAction::OpenNote, id)
    }

    /// Rename a tag across all notes. Bear applies this in bulk; partial
    /// completion is not observable from here.
    pub fn rename_tag(&self, old: &str, new: &str) -> Result<Dispatched> {
        let old = validate_tag("old_tag", old)?;
        let new = validate_tag("new_tag", new)?;
        let url = XCallbackUrl::new(BearAction::RenameTag)
            .param("name", old)
            .param("new_name", new);
        self.send(url)
    }

    pub fn open_tag(&self, tag: &str) -> Result<Dispatched> {
        let tag = validate_tag("tag", tag)?;
        self.send(XCallbackUrl::new(BearAction::OpenTag).param("name", tag))
    }

    pub fn search(&self, term: &str) -> Result<Dispatched> {
        self.send(XCallbackUrl::new(BearAction::Search).param("term", term))
    }

    fn send_for_note(&self, action: BearAction, id: &str) -> Result<Dispatched> {
        let id = validate_note_id(id)?;
        self.send(XCallbackUrl::new(action).param("id", id))
    }

    fn send(&self, url: XCallbackUrl) -> Result<Dispatched> {
        let action = url.action();
        let url = url.to_string();
        if let Err(e) = self.dispatcher.dispatch(&url) {
            warn!(%action, error = %e, "could not dispatch Bear command");
            return Err(e);
        }
        info!(%action, %url, "dispatched Bear command");
        Ok(Dispatched { action, url })
    }
}

/// Note ids are opaque; only emptiness is checked.
pub fn validate_note_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(BearError::invalid("note_id", "Note id cannot be empty"));
    }
    Ok(id)
}

/// Trim a tag and drop one leading `#`, rejecting empty tags and tags that
/// contain markup or list delimiters.
pub fn validate_tag<'a>(field: &str, tag: &'a str) -> Result<&'a str> {
    let trimmed = tag.trim();
    let name = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if name.is_empty() {
        return Err(BearError::invalid(field, "Tag cannot be empty"));
    }
    if name.contains(TAG_RESERVED) {
        return Err(BearError::invalid(
            field,
            format!(
                "Tag '{}' contains a reserved character (',', '#' or a line break)",
                name
            ),
        ));
    }
    Ok(name)
}

/// Validate every tag in a list. `allow_empty` permits an empty list.
pub fn validate_tags(tags: &[String], allow_empty: bool) -> Result<Vec<String>> {
    if tags.is_empty() && !allow_empty {
        return Err(BearError::invalid("tags", "At least one tag is required"));
    }
    tags.iter()
        .map(|t| validate_tag("tags", t).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> (NoteWriter, Arc<DryRunDispatcher>) {
        let dispatcher = Arc::new(DryRunDispatcher::new());
        (NoteWriter::new(dispatcher.clone()), dispatcher)
    }

    fn params_of(url: &str) -> Vec<(String, String)> {
        decode_url(url).unwrap().1
    }

    #[test]
    fn test_create_note_encodes_params() {
        let (writer, sent) = writer();
        let receipt = writer
            .create_note(&NewNote {
                title: Some("a&b=c".to_string()),
                text: Some("x y".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(receipt.action, BearAction::Create);
        assert!(receipt.url.contains("a%26b%3Dc"));
        assert!(receipt.url.contains("x%20y"));
        assert_eq!(sent.sent(), vec![receipt.url.clone()]);
        assert_eq!(
            params_of(&receipt.url),
            vec![
                ("title".to_string(), "a&b=c".to_string()),
                ("text".to_string(), "x y".to_string()),
            ]
        );
    }

    #[test]
    fn test_create_note_with_tags_and_flags() {
        let (writer, _) = writer();
        let receipt = writer
            .create_note(&NewNote {
                title: Some("Trip".to_string()),
                tags: vec!["travel".to_string(), "#road trip".to_string()],
                pin: true,
                open_note: true,
                ..Default::default()
            })
            .unwrap();
        let params = params_of(&receipt.url);
        assert!(params.contains(&("tags".to_string(), "travel,road trip".to_string())));
        assert!(params.contains(&("pin".to_string(), "yes".to_string())));
        assert!(params.contains(&("open_note".to_string(), "yes".to_string())));
    }

    #[test]
    fn test_empty_note_is_allowed() {
        let (writer, _) = writer();
        let receipt = writer.create_note(&NewNote::default()).unwrap();
        assert_eq!(receipt.url, "bear://x-callback-url/create");
    }

    #[test]
    fn test_add_text_modes() {
        let (writer, _) = writer();
        let receipt = writer
            .add_text("NOTE-1", "more", TextMode::Prepend, false)
            .unwrap();
        assert_eq!(
            receipt.url,
            "bear://x-callback-url/add-text?id=NOTE-1&text=more&mode=prepend"
        );
    }

    #[test]
    fn test_text_mode_parse() {
        assert_eq!("append".parse::<TextMode>().unwrap(), TextMode::Append);
        assert_eq!("replace".parse::<TextMode>().unwrap(), TextMode::Replace);
        assert!(matches!(
            "overwrite".parse::<TextMode>(),
            Err(BearError::InvalidInput { field, .. }) if field == "mode"
        ));
    }

    #[test]
    fn test_add_tags_rejects_reserved_characters() {
        let (writer, sent) = writer();
        for bad in ["a,b", "foo#bar", "line\nbreak", "  ", "#"] {
            let err = writer.add_tags("NOTE-1", &[bad.to_string()]).unwrap_err();
            assert!(matches!(err, BearError::InvalidInput { .. }), "{:?}", bad);
        }
        assert!(sent.sent().is_empty());
    }

    #[test]
    fn test_add_tags_requires_tags() {
        let (writer, sent) = writer();
        assert!(writer.add_tags("NOTE-1", &[]).is_err());
        assert!(sent.sent().is_empty());
    }

    #[test]
    fn test_add_tags_joins_with_commas() {
        let (writer, _) = writer();
        let receipt = writer
            .add_tags("NOTE-1", &["work".to_string(), "work/q3".to_string()])
            .unwrap();
        assert_eq!(
            params_of(&receipt.url)[1],
            ("tags".to_string(), "work,work/q3".to_string())
        );
    }

    #[test]
    fn test_unknown_id_is_still_dispatched() {
        let (writer, sent) = writer();
        let receipt = writer.trash_note("nonexistent-id").unwrap();
        assert_eq!(receipt.action, BearAction::Trash);
        assert_eq!(
            sent.sent(),
            vec!["bear://x-callback-url/trash?id=nonexistent-id"]
        );
    }

    #[test]
    fn test_empty_id_is_rejected() {
        let (writer, sent) = writer();
        assert!(writer.archive_note("").is_err());
        assert!(writer.unarchive_note("   ").is_err());
        assert!(writer.open_note("").is_err());
        assert!(sent.sent().is_empty());
    }

    #[test]
    fn test_rename_and_open_tag() {
        let (writer, _) = writer();
        let receipt = writer.rename_tag("old tag", "#new").unwrap();
        assert_eq!(
            receipt.url,
            "bear://x-callback-url/rename-tag?name=old%20tag&new_name=new"
        );
        let receipt = writer.open_tag("work/q3").unwrap();
        assert_eq!(receipt.url, "bear://x-callback-url/open-tag?name=work%2Fq3");
    }

    #[test]
    fn test_search_passes_term_through() {
        let (writer, _) = writer();
        let receipt = writer.search("100% done").unwrap();
        assert_eq!(receipt.url, "bear://x-callback-url/search?term=100%25%20done");
    }
}
