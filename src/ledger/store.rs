//! Embedded SQLite score ledger.
//!
//! ## Tables
//!
//! - `scores`: outbox of games this validator played, pending push
//! - `scores_all`: mirror of the backend's canonical ledger
//! - `miner_records`: one row per participant seat per canonical game
//! - `sync_state`: pull cursor
//!
//! All access goes through one mutex-guarded connection. The file runs in
//! WAL mode so readers are not blocked by the writer. Deleting the file
//! resets the cursor and forces a full re-pull.
//!
//! Window queries are right-open: `since <= ts < end`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, info};

use super::record::{ScoreRecord, SyncPage, WindowAggregate};
use crate::core::{Competition, LedgerConfig, Seat, SeatMap, Team, Timestamp};
use crate::game::EndReason;

/// Ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("ledger directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt ledger row: {0}")]
    Corrupt(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

const CURSOR_KEY: &str = "since_id";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS scores (
    room_id     TEXT PRIMARY KEY,
    competition TEXT NOT NULL,
    rs TEXT NOT NULL, ro TEXT NOT NULL, bs TEXT NOT NULL, bo TEXT NOT NULL,
    score_rs REAL NOT NULL, score_ro REAL NOT NULL,
    score_bs REAL NOT NULL, score_bo REAL NOT NULL,
    winner      TEXT,
    started_at  INTEGER NOT NULL,
    ended_at    INTEGER NOT NULL,
    reason      TEXT,
    synced_at   INTEGER
);
CREATE INDEX IF NOT EXISTS idx_scores_pending ON scores(synced_at, ended_at);

CREATE TABLE IF NOT EXISTS scores_all (
    id          INTEGER PRIMARY KEY,
    room_id     TEXT NOT NULL UNIQUE,
    competition TEXT NOT NULL,
    validator   TEXT NOT NULL,
    rs TEXT NOT NULL, ro TEXT NOT NULL, bs TEXT NOT NULL, bo TEXT NOT NULL,
    score_rs REAL NOT NULL, score_ro REAL NOT NULL,
    score_bs REAL NOT NULL, score_bo REAL NOT NULL,
    winner      TEXT,
    reason      TEXT,
    started_at  INTEGER NOT NULL,
    ended_at    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scores_all_window ON scores_all(competition, ended_at);

CREATE TABLE IF NOT EXISTS miner_records (
    room_id     TEXT NOT NULL,
    seat        TEXT NOT NULL,
    hotkey      TEXT NOT NULL,
    competition TEXT NOT NULL,
    score       REAL NOT NULL,
    ts          INTEGER NOT NULL,
    PRIMARY KEY (room_id, seat)
);
CREATE INDEX IF NOT EXISTS idx_miner_records_window ON miner_records(competition, ts);
CREATE INDEX IF NOT EXISTS idx_miner_records_hotkey ON miner_records(hotkey);

CREATE TABLE IF NOT EXISTS sync_state (
    key   TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
";

/// Score ledger for one competition.
pub struct ScoreLedger {
    conn: Mutex<Connection>,
    competition: Competition,
    own_hotkey: String,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("competition", &self.competition)
            .field("path", &self.path)
            .finish()
    }
}

/// Path of a competition's ledger file under `data_dir`.
#[must_use]
pub fn ledger_path(data_dir: &Path, competition: Competition) -> PathBuf {
    data_dir.join(competition.as_str()).join("scores.db")
}

impl ScoreLedger {
    /// Open `<data_dir>/<competition>/scores.db`, creating it if needed.
    pub fn open(config: &LedgerConfig, competition: Competition) -> LedgerResult<Self> {
        let path = ledger_path(&config.data_dir, competition);
        Self::open_path(&path, competition, &config.validator_hotkey)
    }

    /// Open a ledger file at an explicit path.
    pub fn open_path(path: &Path, competition: Competition, own_hotkey: &str) -> LedgerResult<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        let ledger = Self::init(conn, competition, own_hotkey, Some(path.to_path_buf()))?;
        info!(path = %path.display(), competition = %competition, "score ledger opened");
        Ok(ledger)
    }

    /// Throwaway in-memory ledger.
    pub fn open_in_memory(competition: Competition, own_hotkey: &str) -> LedgerResult<Self> {
        Self::init(Connection::open_in_memory()?, competition, own_hotkey, None)
    }

    fn init(
        conn: Connection,
        competition: Competition,
        own_hotkey: &str,
        path: Option<PathBuf>,
    ) -> LedgerResult<Self> {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let _: String =
            conn.pragma_update_and_check(None, "locking_mode", "NORMAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "ledger pragmas applied");
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            competition,
            own_hotkey: own_hotkey.to_string(),
            path,
        })
    }

    #[must_use]
    pub fn competition(&self) -> Competition {
        self.competition
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panicking holder leaves the connection itself intact.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // === Outbox ===

    /// Insert or overwrite a finished game. Overwriting clears `synced_at`.
    pub fn record_game(&self, record: &ScoreRecord) -> LedgerResult<()> {
        let conn = self.lock();
        let h = &record.hotkeys;
        let s = &record.scores;
        conn.execute(
            "INSERT INTO scores (
                room_id, competition, rs, ro, bs, bo,
                score_rs, score_ro, score_bs, score_bo,
                winner, started_at, ended_at, reason, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL)
            ON CONFLICT(room_id) DO UPDATE SET
                competition = excluded.competition,
                rs = excluded.rs, ro = excluded.ro, bs = excluded.bs, bo = excluded.bo,
                score_rs = excluded.score_rs, score_ro = excluded.score_ro,
                score_bs = excluded.score_bs, score_bo = excluded.score_bo,
                winner = excluded.winner,
                started_at = excluded.started_at,
                ended_at = excluded.ended_at,
                reason = excluded.reason,
                synced_at = NULL",
            params![
                record.room_id,
                record.competition.as_str(),
                h[Seat::RED_SPYMASTER],
                h[Seat::RED_OPERATIVE],
                h[Seat::BLUE_SPYMASTER],
                h[Seat::BLUE_OPERATIVE],
                s[Seat::RED_SPYMASTER],
                s[Seat::RED_OPERATIVE],
                s[Seat::BLUE_SPYMASTER],
                s[Seat::BLUE_OPERATIVE],
                record.winner.map(Team::as_str),
                record.started_at,
                record.ended_at,
                record.reason.map(EndReason::as_str),
            ],
        )?;
        debug!(room_id = %record.room_id, "game recorded");
        Ok(())
    }

    /// Unsynced outbox rows, oldest first.
    pub fn pending(&self) -> LedgerResult<Vec<ScoreRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT room_id, competition, rs, ro, bs, bo,
                    score_rs, score_ro, score_bs, score_bo,
                    winner, started_at, ended_at, reason, synced_at
             FROM scores WHERE synced_at IS NULL ORDER BY ended_at ASC",
        )?;
        let rows = stmt.query_map([], read_outbox_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.decode()?);
        }
        Ok(records)
    }

    /// Outbox row for `room_id`.
    pub fn outbox_record(&self, room_id: &str) -> LedgerResult<Option<ScoreRecord>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT room_id, competition, rs, ro, bs, bo,
                        score_rs, score_ro, score_bs, score_bo,
                        winner, started_at, ended_at, reason, synced_at
                 FROM scores WHERE room_id = ?1",
                params![room_id],
                read_outbox_row,
            )
            .optional()?;
        row.map(OutboxRow::decode).transpose()
    }

    pub fn mark_synced(&self, room_id: &str, at: Timestamp) -> LedgerResult<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE scores SET synced_at = ?1 WHERE room_id = ?2",
            params![at, room_id],
        )?;
        Ok(())
    }

    // === Canonical mirror ===

    /// Apply one pulled page atomically and advance the cursor.
    ///
    /// Rows for other competitions are ignored. Fact rows skip empty
    /// hotkeys, the submitting validator's seats and this validator's own
    /// hotkey. Returns the number of rows applied.
    pub fn apply_page(&self, page: &SyncPage) -> LedgerResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut applied = 0;

        for row in &page.data {
            if row.competition != self.competition {
                debug!(room_id = %row.room_id, competition = %row.competition, "skipping row for other competition");
                continue;
            }
            let hotkey = |seat: Seat| row.seat(seat).hotkey.as_str();
            let score = |seat: Seat| row.seat(seat).score;

            tx.execute(
                "INSERT OR REPLACE INTO scores_all (
                    id, room_id, competition, validator, rs, ro, bs, bo,
                    score_rs, score_ro, score_bs, score_bo,
                    winner, reason, started_at, ended_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    row.id,
                    row.room_id,
                    row.competition.as_str(),
                    row.validator,
                    hotkey(Seat::RED_SPYMASTER),
                    hotkey(Seat::RED_OPERATIVE),
                    hotkey(Seat::BLUE_SPYMASTER),
                    hotkey(Seat::BLUE_OPERATIVE),
                    score(Seat::RED_SPYMASTER),
                    score(Seat::RED_OPERATIVE),
                    score(Seat::BLUE_SPYMASTER),
                    score(Seat::BLUE_OPERATIVE),
                    row.winner.map(Team::as_str),
                    row.reason.map(EndReason::as_str),
                    row.started_at,
                    row.ended_at,
                ],
            )?;

            tx.execute("DELETE FROM miner_records WHERE room_id = ?1", params![row.room_id])?;
            for seat in Seat::all() {
                let key = hotkey(seat);
                if key.is_empty() || key == row.validator || key == self.own_hotkey {
                    continue;
                }
                tx.execute(
                    "INSERT INTO miner_records (room_id, seat, hotkey, competition, score, ts)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        row.room_id,
                        seat.code(),
                        key,
                        row.competition.as_str(),
                        score(seat),
                        row.ended_at,
                    ],
                )?;
            }
            applied += 1;
        }

        if let Some(next) = page.next_cursor() {
            tx.execute(
                "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = MAX(value, excluded.value)",
                params![CURSOR_KEY, next],
            )?;
        }
        tx.commit()?;
        Ok(applied)
    }

    /// Pull cursor; 0 on a fresh ledger.
    pub fn cursor(&self) -> LedgerResult<i64> {
        let conn = self.lock();
        let value = conn
            .query_row(
                "SELECT value FROM sync_state WHERE key = ?1",
                params![CURSOR_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    /// Canonical rows mirrored so far.
    pub fn canonical_count(&self) -> LedgerResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM scores_all", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // === Window queries ===

    /// Per-hotkey count and score sum for `competition` in `[since, end)`.
    pub fn window_aggregates(
        &self,
        competition: Competition,
        since: Timestamp,
        end: Timestamp,
    ) -> LedgerResult<HashMap<String, WindowAggregate>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT hotkey, COUNT(*), COALESCE(SUM(score), 0.0)
             FROM miner_records
             WHERE competition = ?1 AND ts >= ?2 AND ts < ?3
             GROUP BY hotkey",
        )?;
        let rows = stmt.query_map(params![competition.as_str(), since, end], |row| {
            let hotkey: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let sum: f64 = row.get(2)?;
            Ok((
                hotkey,
                WindowAggregate {
                    count: count as u64,
                    sum,
                },
            ))
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Average score per hotkey for `competition` in `[since, end)`.
    pub fn window_average_scores_by_hotkey(
        &self,
        competition: Competition,
        since: Timestamp,
        end: Timestamp,
    ) -> LedgerResult<HashMap<String, f64>> {
        Ok(self
            .window_aggregates(competition, since, end)?
            .into_iter()
            .map(|(hotkey, agg)| (hotkey, agg.average()))
            .collect())
    }

    /// Games played per hotkey for `competition` in `[since, end)`.
    pub fn records_in_window(
        &self,
        competition: Competition,
        since: Timestamp,
        end: Timestamp,
    ) -> LedgerResult<HashMap<String, u64>> {
        Ok(self
            .window_aggregates(competition, since, end)?
            .into_iter()
            .map(|(hotkey, agg)| (hotkey, agg.count))
            .collect())
    }

    /// Canonical games for `competition` that ended in `[since, end)`.
    pub fn games_in_window(
        &self,
        competition: Competition,
        since: Timestamp,
        end: Timestamp,
    ) -> LedgerResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scores_all
             WHERE competition = ?1 AND ended_at >= ?2 AND ended_at < ?3",
            params![competition.as_str(), since, end],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Most recent game end in the canonical mirror. Outbox rows are not counted.
    pub fn latest_timestamp(&self) -> LedgerResult<Option<Timestamp>> {
        let conn = self.lock();
        let ts = conn.query_row("SELECT MAX(ended_at) FROM scores_all", [], |row| row.get(0))?;
        Ok(ts)
    }
}

struct OutboxRow {
    room_id: String,
    competition: String,
    hotkeys: [String; 4],
    scores: [f64; 4],
    winner: Option<String>,
    started_at: Timestamp,
    ended_at: Timestamp,
    reason: Option<String>,
    synced_at: Option<Timestamp>,
}

fn read_outbox_row(row: &Row<'_>) -> rusqlite::Result<OutboxRow> {
    Ok(OutboxRow {
        room_id: row.get(0)?,
        competition: row.get(1)?,
        hotkeys: [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?],
        scores: [row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?],
        winner: row.get(10)?,
        started_at: row.get(11)?,
        ended_at: row.get(12)?,
        reason: row.get(13)?,
        synced_at: row.get(14)?,
    })
}

impl OutboxRow {
    fn decode(self) -> LedgerResult<ScoreRecord> {
        let competition = Competition::parse(&self.competition).ok_or_else(|| {
            LedgerError::Corrupt(format!("unknown competition {:?}", self.competition))
        })?;
        let winner = match self.winner {
            Some(w) => Some(
                Team::parse(&w).ok_or_else(|| LedgerError::Corrupt(format!("unknown team {w:?}")))?,
            ),
            None => None,
        };
        let reason = match self.reason {
            Some(r) => Some(
                EndReason::parse(&r)
                    .ok_or_else(|| LedgerError::Corrupt(format!("unknown reason {r:?}")))?,
            ),
            None => None,
        };
        Ok(ScoreRecord {
            room_id: self.room_id,
            competition,
            hotkeys: SeatMap::from_array(self.hotkeys),
            scores: SeatMap::from_array(self.scores),
            winner,
            started_at: self.started_at,
            ended_at: self.ended_at,
            reason,
            synced_at: self.synced_at,
        })
    }
}
