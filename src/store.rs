//! SQLite match store: one table per (sport, day) partition plus a metadata
//! table used for enumeration and retention sweeps.

use crate::engine::predictor::MatchHistory;
use crate::feed::types::{DataSource, MatchRecord, MatchStatus, SportStats};
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub submitted: usize,
    pub inserted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionInfo {
    pub name: String,
    pub sport: String,
    pub day: NaiveDate,
    pub last_updated: String,
    pub record_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub partitions: usize,
    pub total_records: u64,
    pub sports: Vec<String>,
    pub oldest: Option<NaiveDate>,
    pub newest: Option<NaiveDate>,
}

pub struct MatchStore {
    conn: Connection,
}

/// Partition table name: `{sport}_{YYYY_MM_DD}` with the sport reduced to `[a-z0-9_]`.
pub fn partition_name(sport: &str, day: NaiveDate) -> String {
    let sport: String = sport
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}_{}", sport, day.format("%Y_%m_%d"))
}

impl MatchStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db directory {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("enable WAL")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS partition_metadata (
                partition_name TEXT PRIMARY KEY,
                sport TEXT NOT NULL,
                date_created TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                record_count INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_partition_sport_date
                ON partition_metadata (sport, date_created);
            "#,
        )
        .context("create metadata schema")?;
        Ok(Self { conn })
    }

    fn ensure_partition(&self, sport: &str, day: NaiveDate) -> Result<String> {
        let table = partition_name(sport, day);
        self.conn
            .execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{t}" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    match_id TEXT NOT NULL UNIQUE,
                    timestamp TEXT DEFAULT CURRENT_TIMESTAMP,
                    sport TEXT NOT NULL,
                    home_team TEXT NOT NULL,
                    away_team TEXT NOT NULL,
                    tournament TEXT NOT NULL,
                    start_time INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    period INTEGER NOT NULL,
                    score TEXT NOT NULL,
                    odds_home REAL,
                    odds_away REAL,
                    odds_draw REAL,
                    odds_total_over REAL,
                    odds_total_under REAL,
                    total_title TEXT,
                    odds_handicap_home REAL,
                    odds_handicap_away REAL,
                    handicap_title TEXT,
                    event_count INTEGER NOT NULL,
                    home_team_id INTEGER,
                    away_team_id INTEGER,
                    stoppage_time INTEGER NOT NULL,
                    half_time INTEGER NOT NULL,
                    stats_json TEXT,
                    data_source TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS "idx_{t}_teams" ON "{t}" (home_team, away_team);
                CREATE INDEX IF NOT EXISTS "idx_{t}_status" ON "{t}" (status);
                "#,
                t = table
            ))
            .with_context(|| format!("create partition {}", table))?;

        self.conn
            .execute(
                "INSERT OR IGNORE INTO partition_metadata
                 (partition_name, sport, date_created, last_updated, record_count)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![table, sport, day.format(DAY_FORMAT).to_string(), Utc::now().to_rfc3339()],
            )
            .context("register partition")?;
        Ok(table)
    }

    fn refresh_metadata(&self, table: &str) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    r#"UPDATE partition_metadata
                       SET last_updated = ?1, record_count = (SELECT COUNT(*) FROM "{}")
                       WHERE partition_name = ?2"#,
                    table
                ),
                params![Utc::now().to_rfc3339(), table],
            )
            .context("update partition metadata")?;
        Ok(())
    }

    fn insert_into(conn: &Connection, table: &str, rec: &MatchRecord) -> Result<()> {
        let stats_json = match &rec.stats {
            SportStats::None => None,
            stats => Some(serde_json::to_string(stats).context("encode sport stats")?),
        };
        conn.execute(
            &format!(
                r#"INSERT OR REPLACE INTO "{}" (
                    match_id, sport, home_team, away_team, tournament, start_time, status,
                    period, score, odds_home, odds_away, odds_draw, odds_total_over,
                    odds_total_under, total_title, odds_handicap_home, odds_handicap_away,
                    handicap_title, event_count, home_team_id, away_team_id, stoppage_time,
                    half_time, stats_json, data_source
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                          ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)"#,
                table
            ),
            params![
                rec.match_id,
                rec.sport,
                rec.home_team,
                rec.away_team,
                rec.tournament,
                rec.start_time,
                rec.status.as_str(),
                i64::from(rec.period),
                rec.score,
                rec.odds_home,
                rec.odds_away,
                rec.odds_draw,
                rec.odds_total_over,
                rec.odds_total_under,
                rec.total_title,
                rec.odds_handicap_home,
                rec.odds_handicap_away,
                rec.handicap_title,
                i64::from(rec.event_count),
                rec.home_team_id,
                rec.away_team_id,
                rec.stoppage_time,
                rec.half_time,
                stats_json,
                rec.data_source.as_str(),
            ],
        )
        .with_context(|| format!("upsert match {} into {}", rec.match_id, table))?;
        Ok(())
    }

    /// Insert or replace one record by `match_id` within the partition.
    pub fn upsert(&self, sport: &str, day: NaiveDate, rec: &MatchRecord) -> Result<()> {
        let table = self.ensure_partition(sport, day)?;
        Self::insert_into(&self.conn, &table, rec)?;
        self.refresh_metadata(&table)
    }

    /// Upsert a batch in one transaction. A failing record is logged and
    /// counted; the rest of the batch still lands.
    pub fn upsert_batch(&mut self, sport: &str, day: NaiveDate, recs: &[MatchRecord]) -> Result<BatchOutcome> {
        let table = self.ensure_partition(sport, day)?;
        let mut outcome = BatchOutcome {
            submitted: recs.len(),
            ..Default::default()
        };

        let tx = self.conn.transaction().context("begin upsert transaction")?;
        for rec in recs {
            match Self::insert_into(&tx, &table, rec) {
                Ok(()) => outcome.inserted += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(sport, match_id = %rec.match_id, error = %e, "store write failed");
                }
            }
        }
        tx.commit().context("commit upsert transaction")?;
        self.refresh_metadata(&table)?;
        Ok(outcome)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |_| Ok(()),
            )
            .optional()
            .context("look up partition table")?;
        Ok(found.is_some())
    }

    /// All records of one partition, in insertion order. A missing partition is empty.
    pub fn query(&self, sport: &str, day: NaiveDate) -> Result<Vec<MatchRecord>> {
        let table = partition_name(sport, day);
        if !self.table_exists(&table)? {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare(&format!(
                r#"SELECT
                    match_id, sport, home_team, away_team, tournament, start_time, status,
                    period, score, odds_home, odds_away, odds_draw, odds_total_over,
                    odds_total_under, total_title, odds_handicap_home, odds_handicap_away,
                    handicap_title, event_count, home_team_id, away_team_id, stoppage_time,
                    half_time, stats_json, data_source
                FROM "{}" ORDER BY id ASC"#,
                table
            ))
            .context("prepare partition query")?;
        let rows = stmt
            .query_map([], decode_row)
            .with_context(|| format!("query partition {}", table))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode match row")?);
        }
        Ok(out)
    }

    /// Records from `today` and the `days - 1` partitions before it.
    pub fn query_window(&self, sport: &str, today: NaiveDate, days: u32) -> Result<Vec<MatchRecord>> {
        let mut out = Vec::new();
        for back in 0..days {
            let Some(day) = today.checked_sub_days(Days::new(u64::from(back))) else {
                break;
            };
            out.extend(self.query(sport, day)?);
        }
        Ok(out)
    }

    pub fn query_recent(&self, sport: &str, days: u32) -> Result<Vec<MatchRecord>> {
        self.query_window(sport, Local::now().date_naive(), days)
    }

    pub fn partitions(&self) -> Result<Vec<PartitionInfo>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT partition_name, sport, date_created, last_updated, record_count
                 FROM partition_metadata ORDER BY date_created, partition_name",
            )
            .context("prepare partition listing")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .context("list partitions")?;

        let mut out = Vec::new();
        for row in rows {
            let (name, sport, day, last_updated, count) = row.context("decode partition row")?;
            let day = NaiveDate::parse_from_str(&day, DAY_FORMAT)
                .with_context(|| format!("bad partition date {} for {}", day, name))?;
            out.push(PartitionInfo {
                name,
                sport,
                day,
                last_updated,
                record_count: u64::try_from(count).unwrap_or(0),
            });
        }
        Ok(out)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let partitions = self.partitions()?;
        let mut sports: Vec<String> = partitions.iter().map(|p| p.sport.clone()).collect();
        sports.sort();
        sports.dedup();
        Ok(StoreStats {
            partitions: partitions.len(),
            total_records: partitions.iter().map(|p| p.record_count).sum(),
            sports,
            oldest: partitions.iter().map(|p| p.day).min(),
            newest: partitions.iter().map(|p| p.day).max(),
        })
    }

    /// Drop whole partitions whose day is more than `retention_days` before `today`.
    pub fn drop_partitions_older_than(&mut self, retention_days: u32, today: NaiveDate) -> Result<Vec<String>> {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(retention_days))) else {
            return Ok(Vec::new());
        };
        let stale: Vec<String> = self
            .partitions()?
            .into_iter()
            .filter(|p| p.day < cutoff)
            .map(|p| p.name)
            .collect();

        let tx = self.conn.transaction().context("begin retention transaction")?;
        for name in &stale {
            tx.execute_batch(&format!(r#"DROP TABLE IF EXISTS "{}""#, name))
                .with_context(|| format!("drop partition {}", name))?;
            tx.execute(
                "DELETE FROM partition_metadata WHERE partition_name = ?1",
                params![name],
            )
            .context("delete partition metadata")?;
        }
        tx.commit().context("commit retention transaction")?;

        if !stale.is_empty() {
            tracing::info!(dropped = stale.len(), %cutoff, "retention sweep dropped partitions");
        }
        Ok(stale)
    }
}

impl MatchHistory for MatchStore {
    fn recent_matches(&self, sport: &str, days: u32) -> Result<Vec<MatchRecord>> {
        self.query_recent(sport, days)
    }
}

fn decode_row(row: &Row<'_>) -> rusqlite::Result<MatchRecord> {
    let status: String = row.get(6)?;
    let period: i64 = row.get(7)?;
    let event_count: i64 = row.get(18)?;
    let stats_json: Option<String> = row.get(23)?;
    let source: String = row.get(24)?;

    Ok(MatchRecord {
        match_id: row.get(0)?,
        sport: row.get(1)?,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        tournament: row.get(4)?,
        start_time: row.get(5)?,
        status: MatchStatus::parse(&status),
        period: u8::try_from(period).unwrap_or(1),
        score: row.get(8)?,
        odds_home: row.get(9)?,
        odds_away: row.get(10)?,
        odds_draw: row.get(11)?,
        odds_total_over: row.get(12)?,
        odds_total_under: row.get(13)?,
        total_title: row.get(14)?,
        odds_handicap_home: row.get(15)?,
        odds_handicap_away: row.get(16)?,
        handicap_title: row.get(17)?,
        event_count: u32::try_from(event_count).unwrap_or(0),
        home_team_id: row.get(19)?,
        away_team_id: row.get(20)?,
        stoppage_time: row.get(21)?,
        half_time: row.get(22)?,
        stats: stats_json
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default(),
        data_source: DataSource::parse(&source).unwrap_or(DataSource::Both),
    })
}
