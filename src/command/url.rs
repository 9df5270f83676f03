use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BearError, Result};

pub const URL_PREFIX: &str = "bear://x-callback-url/";

/// The Bear URL actions this server can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BearAction {
    Create,
    AddText,
    AddTags,
    Trash,
    Archive,
    Unarchive,
    RenameTag,
    OpenTag,
    OpenNote,
    Search,
}

impl BearAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BearAction::Create => "create",
            BearAction::AddText => "add-text",
            BearAction::AddTags => "add-tags",
            BearAction::Trash => "trash",
            BearAction::Archive => "archive",
            BearAction::Unarchive => "unarchive",
            BearAction::RenameTag => "rename-tag",
            BearAction::OpenTag => "open-tag",
            BearAction::OpenNote => "open-note",
            BearAction::Search => "search",
        }
    }
}

impl fmt::Display for BearAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `bear://x-callback-url/<action>?k=v&...` invocation.
///
/// Values are kept raw and percent-encoded only when the URL is rendered, so
/// nothing reaches the URL unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XCallbackUrl {
    action: BearAction,
    params: Vec<(&'static str, String)>,
}

impl XCallbackUrl {
    pub fn new(action: BearAction) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// Add `key=yes` when `enabled`, the form Bear uses for boolean options.
    pub fn flag(self, key: &'static str, enabled: bool) -> Self {
        if enabled {
            self.param(key, "yes")
        } else {
            self
        }
    }

    pub fn action(&self) -> BearAction {
        self.action
    }
}

impl fmt::Display for XCallbackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", URL_PREFIX, self.action)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, urlencoding::encode(value))?;
        }
        Ok(())
    }
}

/// Split a rendered Bear URL into its action and decoded query pairs.
pub fn decode_url(url: &str) -> Result<(String, Vec<(String, String)>)> {
    let rest = url
        .strip_prefix(URL_PREFIX)
        .ok_or_else(|| BearError::Dispatch(format!("Not a Bear URL: {}", url)))?;
    let (action, query) = rest.split_once('?').unwrap_or((rest, ""));

    let mut pairs = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map_err(|e| BearError::Dispatch(format!("Invalid encoding in '{}': {}", key, e)))?;
        pairs.push((key.to_string(), value.into_owned()));
    }
    Ok((action.to_string(), pairs))
}
