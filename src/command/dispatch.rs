//! Handing Bear URLs to the operating system.
//!
//! Delivery is one-way. A successful dispatch only means the URL was passed to
//! the launcher; Bear may not be running, and nothing reports back whether the
//! change was applied.

use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, warn};

use super::url::URL_PREFIX;
use crate::error::{BearError, Result};

pub trait Dispatcher: Send + Sync {
    /// Hand `url` off for delivery and return without waiting for Bear.
    fn dispatch(&self, url: &str) -> Result<()>;
}

/// Opens URLs with an external launcher (`open` on macOS).
#[derive(Debug, Clone)]
pub struct SystemDispatcher {
    launcher: String,
}

impl SystemDispatcher {
    pub fn new(launcher: impl Into<String>) -> Self {
        Self {
            launcher: launcher.into(),
        }
    }
}

impl Dispatcher for SystemDispatcher {
    fn dispatch(&self, url: &str) -> Result<()> {
        ensure_well_formed(url)?;

        // stdout carries the MCP stream, so the launcher must not write to it.
        let mut child = Command::new(&self.launcher)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                BearError::Dispatch(format!("Could not run '{}': {}", self.launcher, e))
            })?;

        let launcher = self.launcher.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!(%launcher, "launcher finished"),
            Ok(status) => warn!(%launcher, %status, "launcher exited with failure"),
            Err(e) => warn!(%launcher, error = %e, "failed to wait for launcher"),
        });
        Ok(())
    }
}

/// Records URLs instead of opening them.
#[derive(Debug, Default)]
pub struct DryRunDispatcher {
    sent: Mutex<Vec<String>>,
}

impl DryRunDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs dispatched so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Dispatcher for DryRunDispatcher {
    fn dispatch(&self, url: &str) -> Result<()> {
        ensure_well_formed(url)?;
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());
        Ok(())
    }
}

/// A URL the launcher can take as a single argument: Bear scheme, no
/// whitespace or control characters.
fn ensure_well_formed(url: &str) -> Result<()> {
    if !url.starts_with(URL_PREFIX) {
        return Err(BearError::Dispatch(format!("Not a Bear URL: {}", url)));
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(BearError::Dispatch(
            "URL contains unescaped whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}
