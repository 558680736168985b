//! SQLite-backed progress store.
//!
//! Provides persistent storage for:
//! - The single user progress record (coins, totals, streak, active pet)
//! - Owned pets
//! - Completed focus session history

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{data_dir, ProgressStore};
use crate::error::{DatabaseError, LedgerError};
use crate::ledger::{LedgerRecord, OwnedPet, PetId, UserProgress};

/// SQLite database holding user progress and session history.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database at `~/.config/pawmodoro/pawmodoro.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, LedgerError> {
        let path = data_dir()
            .map_err(|e| LedgerError::Store(e.to_string()))?
            .join("pawmodoro.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS progress (
                    id              INTEGER PRIMARY KEY CHECK (id = 1),
                    coins           INTEGER NOT NULL DEFAULT 0,
                    total_completed INTEGER NOT NULL DEFAULT 0,
                    current_streak  INTEGER NOT NULL DEFAULT 0,
                    last_session_at TEXT,
                    active_pet      TEXT,
                    created_at      TEXT NOT NULL,
                    updated_at      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS owned_pets (
                    pet_id       TEXT PRIMARY KEY,
                    price_paid   INTEGER NOT NULL,
                    purchased_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    id                   TEXT PRIMARY KEY,
                    actual_duration_secs REAL NOT NULL,
                    coins_earned         INTEGER NOT NULL,
                    started_at           TEXT NOT NULL,
                    completed_at         TEXT NOT NULL,
                    pet_used             TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn load(&self) -> Result<Option<UserProgress>, LedgerError> {
        let row = self
            .conn
            .query_row(
                "SELECT coins, total_completed, current_streak, last_session_at,
                        active_pet, created_at, updated_at
                 FROM progress WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((coins, total, streak, last, active, created, updated)) = row else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT pet_id, price_paid, purchased_at FROM owned_pets ORDER BY purchased_at")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut owned_pets = Vec::new();
        for row in rows {
            let (id, price, purchased_at) = row?;
            owned_pets.push(OwnedPet {
                id: PetId::from_stored(id),
                price_paid: price.max(0) as u64,
                purchased_at: parse_ts("owned_pets", &purchased_at)?,
            });
        }

        Ok(Some(UserProgress {
            coins: coins.max(0) as u64,
            total_completed: total.max(0) as u64,
            current_streak: streak.clamp(0, u32::MAX as i64) as u32,
            last_session_at: last.as_deref().map(|s| parse_ts("progress", s)).transpose()?,
            owned_pets,
            active_pet: active.map(PetId::from_stored),
            created_at: parse_ts("progress", &created)?,
            updated_at: parse_ts("progress", &updated)?,
        }))
    }
}

fn parse_ts(table: &'static str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            table,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn write_progress(conn: &Connection, progress: &UserProgress) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO progress (id, coins, total_completed, current_streak, last_session_at,
                               active_pet, created_at, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            coins = excluded.coins,
            total_completed = excluded.total_completed,
            current_streak = excluded.current_streak,
            last_session_at = excluded.last_session_at,
            active_pet = excluded.active_pet,
            updated_at = excluded.updated_at",
        params![
            progress.coins as i64,
            progress.total_completed as i64,
            progress.current_streak as i64,
            progress.last_session_at.map(|t| t.to_rfc3339()),
            progress.active_pet.as_ref().map(|p| p.as_str().to_string()),
            progress.created_at.to_rfc3339(),
            progress.updated_at.to_rfc3339(),
        ],
    )?;

    conn.execute("DELETE FROM owned_pets", [])?;
    for pet in &progress.owned_pets {
        conn.execute(
            "INSERT INTO owned_pets (pet_id, price_paid, purchased_at) VALUES (?1, ?2, ?3)",
            params![
                pet.id.as_str(),
                pet.price_paid as i64,
                pet.purchased_at.to_rfc3339()
            ],
        )?;
    }
    Ok(())
}

fn write_record(conn: &Connection, record: &LedgerRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO sessions (id, actual_duration_secs, coins_earned, started_at, completed_at, pet_used)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id.to_string(),
            record.actual_duration_secs,
            record.coins_earned as i64,
            record.started_at.to_rfc3339(),
            record.completed_at.to_rfc3339(),
            record.pet_used.as_ref().map(|p| p.as_str().to_string()),
        ],
    )?;
    Ok(())
}

impl ProgressStore for SqliteStore {
    fn get_or_create(&mut self, now: DateTime<Utc>) -> Result<UserProgress, LedgerError> {
        if let Some(progress) = self.load()? {
            return Ok(progress);
        }
        let fresh = UserProgress::new(now);
        self.save(&fresh)?;
        tracing::info!("created new progress profile with starter pet");
        Ok(fresh)
    }

    fn save(&mut self, progress: &UserProgress) -> Result<(), LedgerError> {
        let tx = self.conn.transaction()?;
        write_progress(&tx, progress)?;
        tx.commit()?;
        Ok(())
    }

    fn append_history(&mut self, record: &LedgerRecord) -> Result<(), LedgerError> {
        write_record(&self.conn, record)?;
        Ok(())
    }

    fn fetch_history(&mut self, limit: usize) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actual_duration_secs, coins_earned, started_at, completed_at, pet_used
             FROM sessions
             ORDER BY started_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, actual, coins, started, completed, pet) = row?;
            let id = Uuid::parse_str(&id).map_err(|e| DatabaseError::CorruptRow {
                table: "sessions",
                message: format!("bad id '{id}': {e}"),
            })?;
            records.push(LedgerRecord {
                id,
                actual_duration_secs: actual,
                coins_earned: coins.max(0) as u64,
                started_at: parse_ts("sessions", &started)?,
                completed_at: parse_ts("sessions", &completed)?,
                pet_used: pet.map(PetId::from_stored),
            });
        }
        Ok(records)
    }

    fn commit_completion(
        &mut self,
        progress: &UserProgress,
        record: &LedgerRecord,
    ) -> Result<(), LedgerError> {
        let tx = self.conn.transaction()?;
        write_progress(&tx, progress)?;
        write_record(&tx, record)?;
        tx.commit()?;
        Ok(())
    }
}
