//! Recently opened files, keyed by their stable source string.
//!
//! A session keeps the encoded audio bytes so a file can be reopened without
//! going back to its origin. Listings are newest-first by last open time and
//! paginated with an inclusive timestamp cursor.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;

use crate::app_dirs;
use crate::track::TrackSource;

mod sqlite;

#[cfg(test)]
mod tests;

pub use sqlite::SqliteSessionStore;

/// Filename of the session database inside the app root.
pub const SESSION_DB_FILE_NAME: &str = "sessions.db";

/// Errors raised by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// SQLite query failed.
    #[error("Session database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    /// Database is locked or busy.
    #[error("Session database is busy, please retry")]
    Busy,
    /// Failed to create the database directory.
    #[error("Could not create {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// No application directory could be resolved.
    #[error("No suitable directory for the session database")]
    NoDataDir,
    /// A stored timestamp is outside the representable range.
    #[error("Stored timestamp {0} is out of range")]
    InvalidTimestamp(i128),
}

/// Fields supplied when a file is opened for the first time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSession {
    /// Stable key: file path or canonical URL.
    pub source: String,
    /// Title shown to the user.
    pub display_name: String,
    /// Encoded audio.
    pub audio_bytes: Vec<u8>,
}

/// A stored session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    /// Stable key: file path or canonical URL.
    pub source: String,
    /// Title shown to the user.
    pub display_name: String,
    /// Encoded audio.
    pub audio_bytes: Vec<u8>,
    /// First time the session was stored.
    pub created_at: OffsetDateTime,
    /// Last time the session was opened.
    pub last_opened_at: OffsetDateTime,
}

impl SessionRecord {
    /// Initialization request for a [`crate::track::Track`].
    pub fn to_track_source(&self) -> TrackSource {
        TrackSource {
            bytes: Arc::from(self.audio_bytes.as_slice()),
            display_name: self.display_name.clone(),
            source: self.source.clone(),
        }
    }
}

/// A session without its audio payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    /// Stable key.
    pub source: String,
    /// Title shown to the user.
    pub display_name: String,
    /// First time the session was stored.
    pub created_at: OffsetDateTime,
    /// Last time the session was opened.
    pub last_opened_at: OffsetDateTime,
}

/// One page of summaries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionPage {
    /// Newest first.
    pub summaries: Vec<SessionSummary>,
    /// Pass back to fetch the next page; `None` on the last page.
    pub next_cursor: Option<OffsetDateTime>,
    /// Number of stored sessions.
    pub total: u64,
}

/// Persistence for sessions.
pub trait SessionStore {
    /// Look up a session by source key.
    fn get_session(&self, source: &str) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Store or replace a session; both timestamps are set to now.
    fn add_session(&mut self, session: NewSession) -> Result<SessionRecord, SessionStoreError>;

    /// Bump the last-opened time. Unknown sources are ignored.
    fn update_last_opened_at(&mut self, source: &str) -> Result<(), SessionStoreError>;

    /// Up to `limit` summaries opened at or before `cursor`, newest first.
    fn get_session_summaries(
        &self,
        limit: usize,
        cursor: Option<OffsetDateTime>,
    ) -> Result<SessionPage, SessionStoreError>;
}

/// Default location of the session database.
pub fn session_db_path() -> Result<PathBuf, SessionStoreError> {
    let root = app_dirs::app_root_dir().map_err(|err| match err {
        app_dirs::AppDirError::NoBaseDir => SessionStoreError::NoDataDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            SessionStoreError::CreateDir { path, source }
        }
    })?;
    Ok(root.join(SESSION_DB_FILE_NAME))
}
