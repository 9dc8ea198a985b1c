//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Finished workout sessions (plank and HIIT)
//! - Named HIIT presets
//!
//! This is the persistence collaborator of the timer engines: it accepts
//! exactly what a [`Completion`] carries and hands back a record with an id.

use std::path::Path;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::events::{Completion, ExerciseType};
use crate::stats::Stats;
use crate::timer::IntervalConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub exercise: ExerciseType,
    pub duration_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hiit_config: Option<IntervalConfig>,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiitPreset {
    pub name: String,
    pub config: IntervalConfig,
    pub created_at: DateTime<Utc>,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/fittimer.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("fittimer.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened session database");
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_type TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                work_secs     INTEGER,
                rest_secs     INTEGER,
                rounds        INTEGER,
                started_at    TEXT NOT NULL,
                created_at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS presets (
                name       TEXT PRIMARY KEY,
                work_secs  INTEGER NOT NULL,
                rest_secs  INTEGER NOT NULL,
                rounds     INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_exercise_started_at ON sessions(exercise_type, started_at);",
        )?;
        Ok(())
    }

    /// Persist a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn save_session(
        &self,
        exercise: ExerciseType,
        duration_secs: u64,
        started_at: DateTime<Utc>,
        hiit_config: Option<&IntervalConfig>,
    ) -> Result<SessionRecord> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO sessions (exercise_type, duration_secs, work_secs, rest_secs, rounds, started_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                exercise.as_str(),
                duration_secs,
                hiit_config.map(|c| c.work_secs),
                hiit_config.map(|c| c.rest_secs),
                hiit_config.map(|c| c.rounds),
                timestamp(started_at),
                timestamp(created_at),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, exercise = %exercise, duration_secs, "session saved");
        self.get_session(id)?.ok_or_else(|| {
            DatabaseError::QueryFailed(format!("session {id} vanished after insert")).into()
        })
    }

    pub fn save_completion(&self, completion: &Completion) -> Result<SessionRecord> {
        self.save_session(
            completion.exercise,
            completion.duration_secs,
            completion.started_at,
            completion.config.as_ref(),
        )
    }

    pub fn get_session(&self, id: i64) -> Result<Option<SessionRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, exercise_type, duration_secs, work_secs, rest_secs, rounds, started_at, created_at
                 FROM sessions WHERE id = ?1",
                params![id],
                session_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Sessions newest first, optionally filtered by exercise.
    pub fn list_sessions(
        &self,
        exercise: Option<ExerciseType>,
        limit: Option<usize>,
    ) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, exercise_type, duration_secs, work_secs, rest_secs, rounds, started_at, created_at
             FROM sessions
             WHERE ?1 IS NULL OR exercise_type = ?1
             ORDER BY started_at DESC, id DESC
             LIMIT ?2",
        )?;
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX)).unwrap_or(-1);
        let rows = stmt.query_map(params![exercise.map(|e| e.as_str()), limit], session_from_row)?;
        let sessions = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Returns `false` when no session had that id.
    pub fn delete_session(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Aggregates over stored sessions, bucketed by local calendar day.
    pub fn stats(&self, exercise: Option<ExerciseType>) -> Result<Stats> {
        let sessions = self.list_sessions(exercise, None)?;
        Ok(Stats::from_sessions(exercise, &sessions, Local::now()))
    }

    /// Insert or replace a named preset.
    pub fn save_preset(&self, name: &str, config: &IntervalConfig) -> Result<HiitPreset> {
        config.validate()?;
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT OR REPLACE INTO presets (name, work_secs, rest_secs, rounds, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                config.work_secs,
                config.rest_secs,
                config.rounds,
                timestamp(created_at),
            ],
        )?;
        Ok(HiitPreset {
            name: name.to_string(),
            config: *config,
            created_at: parse_timestamp(4, timestamp(created_at))?,
        })
    }

    pub fn get_preset(&self, name: &str) -> Result<Option<HiitPreset>> {
        let preset = self
            .conn
            .query_row(
                "SELECT name, work_secs, rest_secs, rounds, created_at FROM presets WHERE name = ?1",
                params![name],
                preset_from_row,
            )
            .optional()?;
        Ok(preset)
    }

    pub fn list_presets(&self) -> Result<Vec<HiitPreset>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, work_secs, rest_secs, rounds, created_at FROM presets ORDER BY name",
        )?;
        let rows = stmt.query_map([], preset_from_row)?;
        let presets = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(presets)
    }

    pub fn delete_preset(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM presets WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }
}

/// Fixed-width UTC text so lexical order matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let exercise = row
        .get::<_, String>(1)?
        .parse::<ExerciseType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let work: Option<u32> = row.get(3)?;
    let rest: Option<u32> = row.get(4)?;
    let rounds: Option<u32> = row.get(5)?;
    let hiit_config = match (work, rest, rounds) {
        (Some(work_secs), Some(rest_secs), Some(rounds)) => Some(IntervalConfig {
            work_secs,
            rest_secs,
            rounds,
        }),
        _ => None,
    };
    Ok(SessionRecord {
        id: row.get(0)?,
        exercise,
        duration_secs: row.get(2)?,
        hiit_config,
        started_at: parse_timestamp(6, row.get(6)?)?,
        created_at: parse_timestamp(7, row.get(7)?)?,
    })
}

fn preset_from_row(row: &Row<'_>) -> rusqlite::Result<HiitPreset> {
    Ok(HiitPreset {
        name: row.get(0)?,
        config: IntervalConfig {
            work_secs: row.get(1)?,
            rest_secs: row.get(2)?,
            rounds: row.get(3)?,
        },
        created_at: parse_timestamp(4, row.get(4)?)?,
    })
}
