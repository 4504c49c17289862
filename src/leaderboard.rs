use anyhow::Context;
use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

/// Best score recorded for a player
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub updated_at: DateTime<Local>,
}

/// Storage the game reports finished sessions to
pub trait LeaderboardClient {
    /// Keep `score` only if it beats the stored best for `name` (or none exists).
    /// Returns true if the stored best changed.
    fn submit_score(&mut self, name: &str, score: u32) -> anyhow::Result<bool>;

    /// Up to `n` entries, best first
    fn fetch_top(&self, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>>;
}

/// SQLite-backed leaderboard, one row per player name
#[derive(Debug)]
pub struct SqliteLeaderboard {
    conn: Connection,
}

impl SqliteLeaderboard {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                name TEXT PRIMARY KEY NOT NULL,
                score INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_leaderboard_score ON leaderboard(score DESC)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Stored best for a single player
    pub fn get(&self, name: &str) -> rusqlite::Result<Option<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT score FROM leaderboard WHERE name = ?1")?;
        let mut rows = stmt.query([name])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self) -> rusqlite::Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM leaderboard", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn upsert_if_greater(&self, name: &str, score: u32) -> rusqlite::Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO leaderboard (name, score, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                score = excluded.score,
                updated_at = excluded.updated_at
            WHERE excluded.score > leaderboard.score
            "#,
            params![name, score, Local::now().to_rfc3339()],
        )?;
        Ok(changed > 0)
    }

    fn top(&self, n: usize) -> rusqlite::Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, score, updated_at
            FROM leaderboard
            ORDER BY score DESC, updated_at ASC, name ASC
            LIMIT ?1
            "#,
        )?;

        let entry_iter = stmt.query_map([n as i64], |row| {
            let updated_str: String = row.get(2)?;
            let updated_at = DateTime::parse_from_rfc3339(&updated_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "updated_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(LeaderboardEntry {
                name: row.get(0)?,
                score: row.get(1)?,
                updated_at,
            })
        })?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        Ok(entries)
    }
}

impl LeaderboardClient for SqliteLeaderboard {
    fn submit_score(&mut self, name: &str, score: u32) -> anyhow::Result<bool> {
        self.upsert_if_greater(name, score)
            .with_context(|| format!("saving score {} for {}", score, name))
    }

    fn fetch_top(&self, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        self.top(n).context("reading leaderboard")
    }
}

/// Process-local leaderboard, gone when the program exits
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: HashMap<String, LeaderboardEntry>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaderboardClient for MemoryLeaderboard {
    fn submit_score(&mut self, name: &str, score: u32) -> anyhow::Result<bool> {
        match self.entries.get_mut(name) {
            Some(existing) if existing.score >= score => Ok(false),
            Some(existing) => {
                existing.score = score;
                existing.updated_at = Local::now();
                Ok(true)
            }
            None => {
                self.entries.insert(
                    name.to_string(),
                    LeaderboardEntry {
                        name: name.to_string(),
                        score,
                        updated_at: Local::now(),
                    },
                );
                Ok(true)
            }
        }
    }

    fn fetch_top(&self, n: usize) -> anyhow::Result<Vec<LeaderboardEntry>> {
        Ok(self
            .entries
            .values()
            .sorted_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then(a.updated_at.cmp(&b.updated_at))
                    .then(a.name.cmp(&b.name))
            })
            .take(n)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_db() -> SqliteLeaderboard {
        SqliteLeaderboard::open_in_memory().unwrap()
    }

    #[test]
    fn first_submit_creates_entry() {
        let mut db = create_test_db();
        assert!(db.submit_score("Ann", 7).unwrap());
        assert_eq!(db.get("Ann").unwrap(), Some(7));
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn lower_score_does_not_overwrite() {
        let mut db = create_test_db();
        db.submit_score("Ann", 10).unwrap();
        assert!(!db.submit_score("Ann", 4).unwrap());
        assert!(!db.submit_score("Ann", 10).unwrap());
        assert_eq!(db.get("Ann").unwrap(), Some(10));
    }

    #[test]
    fn higher_score_overwrites() {
        let mut db = create_test_db();
        db.submit_score("Ann", 10).unwrap();
        assert!(db.submit_score("Ann", 12).unwrap());
        assert_eq!(db.get("Ann").unwrap(), Some(12));
        assert_eq!(db.count().unwrap(), 1);
    }

    #[test]
    fn zero_score_is_recorded_for_new_player() {
        let mut db = create_test_db();
        assert!(db.submit_score("Zed", 0).unwrap());
        assert_eq!(db.get("Zed").unwrap(), Some(0));
    }

    #[test]
    fn fetch_top_orders_descending_and_limits() {
        let mut db = create_test_db();
        for (name, score) in [("a", 3), ("b", 9), ("c", 1), ("d", 7), ("e", 5), ("f", 8)] {
            db.submit_score(name, score).unwrap();
        }

        let top = db.fetch_top(5).unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "f", "d", "e", "a"]);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn fetch_top_on_empty_board() {
        let db = create_test_db();
        assert!(db.fetch_top(5).unwrap().is_empty());
    }

    #[test]
    fn scores_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("leaderboard.db");

        {
            let mut db = SqliteLeaderboard::open(&path).unwrap();
            db.submit_score("Ann", 21).unwrap();
        }

        let db = SqliteLeaderboard::open(&path).unwrap();
        let top = db.fetch_top(5).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Ann");
        assert_eq!(top[0].score, 21);
    }

    #[test]
    fn memory_board_keeps_max_per_name() {
        let mut board = MemoryLeaderboard::new();
        assert!(board.submit_score("Ann", 5).unwrap());
        assert!(!board.submit_score("Ann", 3).unwrap());
        assert!(board.submit_score("Ann", 8).unwrap());
        assert!(board.submit_score("Bo", 6).unwrap());

        let top = board.fetch_top(5).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].name.as_str(), top[0].score), ("Ann", 8));
        assert_eq!((top[1].name.as_str(), top[1].score), ("Bo", 6));
        assert_eq!(board.fetch_top(1).unwrap().len(), 1);
    }
}
