use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{
    NewSession, SessionPage, SessionRecord, SessionStore, SessionStoreError, SessionSummary,
};

type Clock = Box<dyn Fn() -> OffsetDateTime + Send>;

/// [`SessionStore`] backed by a single SQLite file.
pub struct SqliteSessionStore {
    connection: Connection,
    clock: Clock,
}

impl SqliteSessionStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionStoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SessionStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let connection = Connection::open(path).map_err(map_sql_error)?;
        let store = Self::from_connection(connection)?;
        info!("Opened session database at {}", path.display());
        Ok(store)
    }

    /// Database that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self, SessionStoreError> {
        Self::from_connection(Connection::open_in_memory().map_err(map_sql_error)?)
    }

    /// Replace the time source used for new timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> OffsetDateTime + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn from_connection(connection: Connection) -> Result<Self, SessionStoreError> {
        let store = Self {
            connection,
            clock: Box::new(OffsetDateTime::now_utc),
        };
        store.apply_pragmas()?;
        store.apply_schema()?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> Result<(), SessionStoreError> {
        self.connection
            .execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout=5000;",
            )
            .map_err(map_sql_error)
    }

    fn apply_schema(&self) -> Result<(), SessionStoreError> {
        self.connection
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    source TEXT PRIMARY KEY,
                    display_name TEXT NOT NULL,
                    audio BLOB NOT NULL,
                    created_at INTEGER NOT NULL,
                    last_opened_at INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_sessions_last_opened_at
                    ON sessions (last_opened_at);",
            )
            .map_err(map_sql_error)
    }

    fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }
}

impl SessionStore for SqliteSessionStore {
    fn get_session(&self, source: &str) -> Result<Option<SessionRecord>, SessionStoreError> {
        let row = self
            .connection
            .query_row(
                "SELECT source, display_name, audio, created_at, last_opened_at
                 FROM sessions WHERE source = ?1",
                params![source],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(map_sql_error)?;
        let Some((source, display_name, audio_bytes, created_at, last_opened_at)) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            source,
            display_name,
            audio_bytes,
            created_at: from_nanos(created_at)?,
            last_opened_at: from_nanos(last_opened_at)?,
        }))
    }

    fn add_session(&mut self, session: NewSession) -> Result<SessionRecord, SessionStoreError> {
        let now = self.now();
        let stamp = to_nanos(now);
        self.connection
            .execute(
                "INSERT OR REPLACE INTO sessions
                    (source, display_name, audio, created_at, last_opened_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![session.source, session.display_name, session.audio_bytes, stamp],
            )
            .map_err(map_sql_error)?;
        debug!(source = %session.source, bytes = session.audio_bytes.len(), "Session stored");
        Ok(SessionRecord {
            source: session.source,
            display_name: session.display_name,
            audio_bytes: session.audio_bytes,
            created_at: now,
            last_opened_at: now,
        })
    }

    fn update_last_opened_at(&mut self, source: &str) -> Result<(), SessionStoreError> {
        let stamp = to_nanos(self.now());
        let changed = self
            .connection
            .execute(
                "UPDATE sessions SET last_opened_at = ?1 WHERE source = ?2",
                params![stamp, source],
            )
            .map_err(map_sql_error)?;
        debug!(source, changed, "Session reopened");
        Ok(())
    }

    fn get_session_summaries(
        &self,
        limit: usize,
        cursor: Option<OffsetDateTime>,
    ) -> Result<SessionPage, SessionStoreError> {
        let total: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        let upper = cursor.map_or(i64::MAX, to_nanos);
        let fetch = i64::try_from(limit).unwrap_or(i64::MAX).saturating_add(1);
        let mut stmt = self
            .connection
            .prepare_cached(
                "SELECT source, display_name, created_at, last_opened_at
                 FROM sessions
                 WHERE last_opened_at <= ?1
                 ORDER BY last_opened_at DESC, source ASC
                 LIMIT ?2",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![upper, fetch], summary_columns)
            .map_err(map_sql_error)?;
        let mut summaries = Vec::new();
        for row in rows {
            let (source, display_name, created_at, last_opened_at) = row.map_err(map_sql_error)?;
            summaries.push(SessionSummary {
                source,
                display_name,
                created_at: from_nanos(created_at)?,
                last_opened_at: from_nanos(last_opened_at)?,
            });
        }
        let next_cursor = if summaries.len() > limit {
            summaries.pop().map(|extra| extra.last_opened_at)
        } else {
            None
        };
        Ok(SessionPage {
            summaries,
            next_cursor,
            total: total.max(0) as u64,
        })
    }
}

fn summary_columns(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn to_nanos(at: OffsetDateTime) -> i64 {
    i64::try_from(at.unix_timestamp_nanos()).unwrap_or(i64::MAX)
}

fn from_nanos(value: i64) -> Result<OffsetDateTime, SessionStoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(value))
        .map_err(|_| SessionStoreError::InvalidTimestamp(i128::from(value)))
}

/// Translate rusqlite errors into friendlier variants.
fn map_sql_error(err: rusqlite::Error) -> SessionStoreError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.extended_code == rusqlite::ffi::SQLITE_BUSY =>
        {
            SessionStoreError::Busy
        }
        other => SessionStoreError::Sql(other),
    }
}
