//! Per-user session context.
//!
//! The core never keeps state between calls. Workflows take a [`Session`]
//! and hand back an updated one; whoever drives the UI decides where it
//! lives (the CLI keeps it in `~/.coursecraft/session.json`).

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CourseCraftError, Result};
use crate::types::{GeneratedContent, Query};

/// Last query and last generated content for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_query: Option<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_content: Option<GeneratedContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Record a submitted query. Content from an earlier query is dropped so
    /// a failed generation never leaves stale content behind.
    pub fn with_query(mut self, query: Query) -> Self {
        self.last_query = Some(query);
        self.last_content = None;
        self.updated_at = Some(Utc::now());
        self
    }

    /// Record successfully generated content.
    pub fn with_content(mut self, content: GeneratedContent) -> Self {
        self.last_query = Some(content.source_query.clone());
        self.last_content = Some(content);
        self.updated_at = Some(Utc::now());
        self
    }

    /// Load a session file. A missing file yields an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "no session file, starting fresh");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| CourseCraftError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            CourseCraftError::validation(format!("invalid session file {}: {e}", path.display()))
        })
    }

    /// Persist the session as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CourseCraftError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CourseCraftError::validation(format!("session serialization failed: {e}")))?;
        std::fs::write(path, json).map_err(|e| CourseCraftError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;

    #[test]
    fn new_query_clears_previous_content() {
        let query = Query::new("Oncology", "checkpoint inhibitors");
        let session = Session::default()
            .with_content(GeneratedContent::new("old", ContentKind::FreeText, query.clone()))
            .with_query(Query::new("Oncology", "CAR-T"));

        assert_eq!(session.last_query.unwrap().text, "CAR-T");
        assert!(session.last_content.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("cc-session-test-{}", std::process::id()));
        let path = dir.join("session.json");

        let session = Session::default().with_content(GeneratedContent::new(
            "text",
            ContentKind::CsvTable,
            Query::new("Pharmacology", "statins"),
        ));
        session.save(&path).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.last_content.unwrap().kind, ContentKind::CsvTable);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_empty_session() {
        let loaded = Session::load(Path::new("/nonexistent/coursecraft/session.json")).unwrap();
        assert!(loaded.last_query.is_none());
    }
}
