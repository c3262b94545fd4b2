// SQLite persistence for players and their statistics.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use spirit11_cricket::model::{Dataset, Player, PlayerStats, RawCounters, Role};
use spirit11_cricket::scoring::{reconcile, Reconciled};

/// Meta key holding the RFC 3339 time of the last feed import.
const LAST_INGESTED_KEY: &str = "last_ingested_at";

const PLAYER_COLUMNS: &str = "id, name, university, role, image, value, points";

const STATS_COLUMNS: &str = "player_id, matches, runs, balls_faced, innings_played, wickets,
     overs_bowled, runs_conceded, batting_strike_rate, batting_average,
     bowling_strike_rate, bowling_economy, catches, stumpings, highest_score,
     best_bowling, fifties, hundreds";

/// SQLite-backed store for the player roster.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at `path` and ensure the schema exists.
    /// `":memory:"` gives an ephemeral database for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id         TEXT PRIMARY KEY,
                position   INTEGER NOT NULL,
                name       TEXT NOT NULL,
                university TEXT NOT NULL,
                role       TEXT NOT NULL,
                image      TEXT,
                value      INTEGER NOT NULL,
                points     INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS player_stats (
                player_id           TEXT PRIMARY KEY REFERENCES players(id) ON DELETE CASCADE,
                matches             INTEGER NOT NULL,
                runs                INTEGER NOT NULL,
                balls_faced         INTEGER NOT NULL,
                innings_played      INTEGER NOT NULL,
                wickets             INTEGER NOT NULL,
                overs_bowled        REAL NOT NULL,
                runs_conceded       INTEGER NOT NULL,
                batting_strike_rate REAL NOT NULL,
                batting_average     REAL NOT NULL,
                bowling_strike_rate REAL NOT NULL,
                bowling_economy     REAL NOT NULL,
                catches             INTEGER NOT NULL,
                stumpings           INTEGER NOT NULL,
                highest_score       INTEGER NOT NULL,
                best_bowling        TEXT NOT NULL,
                fifties             INTEGER NOT NULL,
                hundreds            INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if another thread panicked while holding the lock.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    pub fn is_empty(&self) -> Result<bool> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
            .context("failed to count players")?;
        Ok(count == 0)
    }

    // ------------------------------------------------------------------
    // Bulk import / export
    // ------------------------------------------------------------------

    /// Replace the whole roster with `dataset` in one transaction and stamp
    /// the import time.
    pub fn replace_dataset(&self, dataset: &Dataset) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;

        tx.execute("DELETE FROM player_stats", [])
            .context("failed to clear player stats")?;
        tx.execute("DELETE FROM players", [])
            .context("failed to clear players")?;

        for (position, player) in dataset.players.iter().enumerate() {
            insert_player(&tx, player, position as i64)?;
        }
        for stats in &dataset.player_stats {
            insert_stats(&tx, stats)?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![LAST_INGESTED_KEY, Utc::now().to_rfc3339()],
        )
        .context("failed to record import time")?;

        tx.commit().context("failed to commit dataset import")?;
        Ok(())
    }

    /// Load every player and stats record, players in import order.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let conn = self.conn();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players ORDER BY position"
            ))
            .context("failed to prepare players query")?;
        let players = stmt
            .query_map([], player_from_row)
            .context("failed to query players")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read player row")?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {STATS_COLUMNS} FROM player_stats s
                 JOIN players p ON p.id = s.player_id
                 ORDER BY p.position"
            ))
            .context("failed to prepare player_stats query")?;
        let player_stats = stmt
            .query_map([], stats_from_row)
            .context("failed to query player stats")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read player stats row")?;

        Ok(Dataset {
            players,
            player_stats,
        })
    }

    pub fn last_ingested_at(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![LAST_INGESTED_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read import time")?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid import timestamp '{s}'"))
        })
        .transpose()
    }

    // ------------------------------------------------------------------
    // Single-record access
    // ------------------------------------------------------------------

    pub fn player(&self, id: &str) -> Result<Option<Player>> {
        self.conn()
            .query_row(
                &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1"),
                params![id],
                player_from_row,
            )
            .optional()
            .context("failed to load player")
    }

    pub fn stats_for(&self, player_id: &str) -> Result<Option<PlayerStats>> {
        self.conn()
            .query_row(
                &format!("SELECT {STATS_COLUMNS} FROM player_stats WHERE player_id = ?1"),
                params![player_id],
                stats_from_row,
            )
            .optional()
            .context("failed to load player stats")
    }

    /// Add a player with the next numeric id, deriving stats, points and
    /// value from `counters`.
    pub fn create_player(
        &self,
        name: &str,
        university: &str,
        role: Role,
        counters: RawCounters,
    ) -> Result<Player> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin create transaction")?;

        let (max_id, max_position): (Option<i64>, Option<i64>) = tx
            .query_row(
                "SELECT MAX(CAST(id AS INTEGER)), MAX(position) FROM players",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("failed to find next player id")?;
        let id = (max_id.unwrap_or(0) + 1).to_string();

        let reconciled = reconcile(PlayerStats::from_counters(id.clone(), counters));
        let player = Player {
            id,
            name: name.to_string(),
            university: university.to_string(),
            role,
            image: None,
            value: reconciled.value,
            points: reconciled.points,
        };

        insert_player(&tx, &player, max_position.map_or(0, |p| p + 1))?;
        insert_stats(&tx, &reconciled.stats)?;
        tx.commit().context("failed to commit new player")?;
        Ok(player)
    }

    /// Store edited stats. Derived rates, points and value are recomputed and
    /// written with the stats in one transaction, so no reader sees a stats
    /// row that disagrees with its player. Returns `None` for an unknown
    /// player.
    pub fn update_stats(&self, stats: PlayerStats) -> Result<Option<Reconciled>> {
        let reconciled = reconcile(stats);
        let s = &reconciled.stats;

        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin stats update")?;

        let updated = tx
            .execute(
                "UPDATE players SET points = ?2, value = ?3 WHERE id = ?1",
                params![s.player_id, reconciled.points, reconciled.value],
            )
            .context("failed to update player points")?;
        if updated == 0 {
            return Ok(None);
        }

        tx.execute(
            "DELETE FROM player_stats WHERE player_id = ?1",
            params![s.player_id],
        )
        .context("failed to replace player stats")?;
        insert_stats(&tx, s)?;

        tx.commit().context("failed to commit stats update")?;
        Ok(Some(reconciled))
    }

    /// Admin override of a player's value. Returns false for an unknown id.
    pub fn set_player_value(&self, id: &str, value: i64) -> Result<bool> {
        let updated = self
            .conn()
            .execute(
                "UPDATE players SET value = ?2 WHERE id = ?1",
                params![id, value],
            )
            .context("failed to override player value")?;
        Ok(updated == 1)
    }

    /// Update name, university and role. Points and value are untouched.
    pub fn update_profile(
        &self,
        id: &str,
        name: &str,
        university: &str,
        role: Role,
    ) -> Result<bool> {
        let updated = self
            .conn()
            .execute(
                "UPDATE players SET name = ?2, university = ?3, role = ?4 WHERE id = ?1",
                params![id, name, university, role.display_str()],
            )
            .context("failed to update player profile")?;
        Ok(updated == 1)
    }

    /// Delete a player and their stats. Returns false for an unknown id.
    pub fn delete_player(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin delete transaction")?;
        tx.execute("DELETE FROM player_stats WHERE player_id = ?1", params![id])
            .context("failed to delete player stats")?;
        let deleted = tx
            .execute("DELETE FROM players WHERE id = ?1", params![id])
            .context("failed to delete player")?;
        tx.commit().context("failed to commit player delete")?;
        Ok(deleted == 1)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn insert_player(tx: &Transaction<'_>, player: &Player, position: i64) -> Result<()> {
    tx.execute(
        "INSERT INTO players (id, position, name, university, role, image, value, points)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            player.id,
            position,
            player.name,
            player.university,
            player.role.display_str(),
            player.image,
            player.value,
            player.points,
        ],
    )
    .with_context(|| format!("failed to insert player {}", player.id))?;
    Ok(())
}

fn insert_stats(tx: &Transaction<'_>, s: &PlayerStats) -> Result<()> {
    tx.execute(
        &format!(
            "INSERT INTO player_stats ({STATS_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            s.player_id,
            s.matches,
            s.runs,
            s.balls_faced,
            s.innings_played,
            s.wickets,
            s.overs_bowled,
            s.runs_conceded,
            s.batting_strike_rate,
            s.batting_average,
            s.bowling_strike_rate,
            s.bowling_economy,
            s.catches,
            s.stumpings,
            s.highest_score,
            s.best_bowling,
            s.fifties,
            s.hundreds,
        ],
    )
    .with_context(|| format!("failed to insert stats for player {}", s.player_id))?;
    Ok(())
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let role_str: String = row.get(3)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            anyhow!("unknown role '{role_str}'").into(),
        )
    })?;
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        university: row.get(2)?,
        role,
        image: row.get(4)?,
        value: row.get(5)?,
        points: row.get(6)?,
    })
}

fn stats_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerStats> {
    Ok(PlayerStats {
        player_id: row.get(0)?,
        matches: row.get(1)?,
        runs: row.get(2)?,
        balls_faced: row.get(3)?,
        innings_played: row.get(4)?,
        wickets: row.get(5)?,
        overs_bowled: row.get(6)?,
        runs_conceded: row.get(7)?,
        batting_strike_rate: row.get(8)?,
        batting_average: row.get(9)?,
        bowling_strike_rate: row.get(10)?,
        bowling_economy: row.get(11)?,
        catches: row.get(12)?,
        stumpings: row.get(13)?,
        highest_score: row.get(14)?,
        best_bowling: row.get(15)?,
        fifties: row.get(16)?,
        hundreds: row.get(17)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use spirit11_cricket::ingest::parse_feed;
    use spirit11_cricket::scoring::{compute_value, is_reconciled};

    const FEED: &str = "\
Name,University,Category,Total Runs,Balls Faced,Innings Played,Wickets,Overs Bowled,Runs Conceded
Kasun Perera,Colombo,Batsman,450,350,10,0,0,0
Nuwan Silva,Moratuwa,Bowler,20,30,5,10,20.0,150
Dilan Fernando,Colombo,All-Rounder,310,260,9,14,30.2,210";

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn seeded_db() -> Database {
        let db = test_db();
        db.replace_dataset(&parse_feed(FEED)).unwrap();
        db
    }

    #[test]
    fn new_database_is_empty() {
        let db = test_db();
        assert!(db.is_empty().unwrap());
        assert!(db.load_dataset().unwrap().is_empty());
        assert!(db.last_ingested_at().unwrap().is_none());
    }

    #[test]
    fn dataset_roundtrip() {
        let dataset = parse_feed(FEED);
        let db = test_db();
        db.replace_dataset(&dataset).unwrap();

        assert!(!db.is_empty().unwrap());
        assert_eq!(db.load_dataset().unwrap(), dataset);
        assert!(db.last_ingested_at().unwrap().is_some());
    }

    #[test]
    fn replace_dataset_discards_previous_roster() {
        let db = seeded_db();
        let smaller = parse_feed(
            "Name,University,Category,Total Runs,Balls Faced,Innings Played,Wickets,Overs Bowled,Runs Conceded\n\
             Solo,Kelaniya,Bowler,0,0,1,1,2.0,12",
        );
        db.replace_dataset(&smaller).unwrap();
        let loaded = db.load_dataset().unwrap();
        assert_eq!(loaded.players.len(), 1);
        assert_eq!(loaded.players[0].name, "Solo");
        assert!(db.player("2").unwrap().is_none());
    }

    #[test]
    fn update_stats_reconciles_pair_atomically() {
        let db = seeded_db();
        let mut stats = db.stats_for("1").unwrap().unwrap();
        stats.wickets = 2;
        stats.overs_bowled = 4.0;
        stats.runs_conceded = 24;
        // Stale rates go in; fresh ones must come out.
        stats.bowling_strike_rate = 123.0;

        let reconciled = db.update_stats(stats).unwrap().expect("player exists");
        assert_eq!(reconciled.points, 127);

        let stored_stats = db.stats_for("1").unwrap().unwrap();
        assert!(is_reconciled(&stored_stats));
        assert!((stored_stats.bowling_strike_rate - 12.0).abs() < f64::EPSILON);

        let player = db.player("1").unwrap().unwrap();
        assert_eq!(player.points, 127);
        assert_eq!(player.value, compute_value(127));
    }

    #[test]
    fn update_stats_for_unknown_player() {
        let db = seeded_db();
        let stats = PlayerStats::from_counters("99", RawCounters::default());
        assert!(db.update_stats(stats).unwrap().is_none());
        assert!(db.stats_for("99").unwrap().is_none());
    }

    #[test]
    fn value_override_survives_until_next_stats_update() {
        let db = seeded_db();
        assert!(db.set_player_value("2", 2_000_000).unwrap());
        assert_eq!(db.player("2").unwrap().unwrap().value, 2_000_000);

        let stats = db.stats_for("2").unwrap().unwrap();
        let reconciled = db.update_stats(stats).unwrap().unwrap();
        assert_eq!(db.player("2").unwrap().unwrap().value, reconciled.value);
        assert!(!db.set_player_value("42", 1).unwrap());
    }

    #[test]
    fn create_player_takes_next_id() {
        let db = seeded_db();
        let player = db
            .create_player(
                "Sahan Wickramasinghe",
                "Sri Jayewardenepura",
                Role::AllRounder,
                RawCounters {
                    runs: 100,
                    balls_faced: 80,
                    innings_played: 4,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(player.id, "4");
        // SR 125 -> 25, avg 25 -> 20
        assert_eq!(player.points, 45);

        let loaded = db.load_dataset().unwrap();
        assert_eq!(loaded.players.last().unwrap().id, "4");
        assert_eq!(loaded.player_stats.last().unwrap().player_id, "4");
    }

    #[test]
    fn update_profile_keeps_scores() {
        let db = seeded_db();
        let before = db.player("3").unwrap().unwrap();
        assert!(db
            .update_profile("3", "Dilan Fernando", "Moratuwa", Role::Bowler)
            .unwrap());
        let after = db.player("3").unwrap().unwrap();
        assert_eq!(after.university, "Moratuwa");
        assert_eq!(after.role, Role::Bowler);
        assert_eq!(after.points, before.points);
        assert_eq!(after.value, before.value);
    }

    #[test]
    fn delete_player_removes_stats() {
        let db = seeded_db();
        assert!(db.delete_player("2").unwrap());
        assert!(db.player("2").unwrap().is_none());
        assert!(db.stats_for("2").unwrap().is_none());
        assert!(!db.delete_player("2").unwrap());

        let loaded = db.load_dataset().unwrap();
        assert_eq!(loaded.players.len(), 2);
        assert_eq!(loaded.player_stats.len(), 2);
    }
}
