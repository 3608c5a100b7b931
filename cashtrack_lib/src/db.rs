//! SQLite storage for retailers and cashback rate history.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::StoreError;
use crate::records::{CashbackObservation, Retailer};
use crate::store::{CashbackStore, RetailerStore};

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

pub struct Db {
    conn: Connection,
}

/// Most recent observation for one retailer on one website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestRateRow {
    pub retailer_id: String,
    /// `None` when the observation was stored but its retailer write failed.
    pub retailer_name: Option<String>,
    pub website_name: String,
    pub cashback_rate: String,
    pub is_up_to: bool,
    pub observed_at: DateTime<Utc>,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing and dry runs).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn retailer(&self, retailer_id: &str) -> Result<Option<Retailer>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT retailer_id, retailer_name, website_aliases, created_at, updated_at
                 FROM retailers WHERE retailer_id = ?1",
                params![retailer_id],
                RetailerRow::from_row,
            )
            .optional()?;
        row.map(RetailerRow::into_retailer).transpose()
    }

    /// Inserts a retailer. An existing row keeps its name and `created_at`;
    /// the incoming aliases are merged into the stored map.
    pub fn upsert_retailer_record(&self, retailer: &Retailer) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO retailers (retailer_id, retailer_name, website_aliases, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(retailer_id) DO UPDATE SET
               website_aliases = json_patch(retailers.website_aliases, excluded.website_aliases),
               updated_at = excluded.updated_at",
            params![
                retailer.retailer_id,
                retailer.retailer_name,
                serde_json::to_string(&retailer.website_aliases)?,
                format_ts(&retailer.created_at),
                format_ts(&retailer.updated_at)
            ],
        )?;
        Ok(())
    }

    /// Extends the stored alias map inside one transaction. Returns `false`
    /// when the retailer does not exist.
    pub fn merge_retailer_aliases(
        &mut self,
        retailer_id: &str,
        aliases: &BTreeMap<String, String>,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                "SELECT website_aliases FROM retailers WHERE retailer_id = ?1",
                params![retailer_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(false);
        };

        let mut merged: BTreeMap<String, String> = serde_json::from_str(&current)?;
        merged.extend(aliases.iter().map(|(k, v)| (k.clone(), v.clone())));

        tx.execute(
            "UPDATE retailers SET website_aliases = ?2, updated_at = ?3 WHERE retailer_id = ?1",
            params![
                retailer_id,
                serde_json::to_string(&merged)?,
                format_ts(&updated_at)
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    pub fn insert_observation(&self, obs: &CashbackObservation) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO cashback_rates (
               retailer_website_key,
               retailer_id,
               website_name,
               cashback_rate,
               is_up_to,
               observed_at,
               created_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                obs.retailer_website_key,
                obs.retailer_id,
                obs.website_name,
                obs.cashback_rate,
                obs.is_up_to,
                format_ts(&obs.observed_at),
                format_ts(&obs.created_at)
            ],
        )?;
        Ok(())
    }

    /// Retailers ordered by name, optionally filtered by a name substring.
    pub fn list_retailers(&self, search: Option<&str>) -> Result<Vec<Retailer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT retailer_id, retailer_name, website_aliases, created_at, updated_at
             FROM retailers
             WHERE ?1 IS NULL OR retailer_name LIKE ?1 ESCAPE '\\'
             ORDER BY retailer_name COLLATE NOCASE, retailer_id",
        )?;
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));
        let rows = stmt
            .query_map(params![pattern], RetailerRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RetailerRow::into_retailer).collect()
    }

    /// Retailers whose id matches exactly or whose name matches ignoring case.
    pub fn find_retailers(&self, name_or_id: &str) -> Result<Vec<Retailer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT retailer_id, retailer_name, website_aliases, created_at, updated_at
             FROM retailers
             WHERE retailer_id = ?1 OR retailer_name = ?1 COLLATE NOCASE
             ORDER BY retailer_name COLLATE NOCASE",
        )?;
        let rows = stmt
            .query_map(params![name_or_id.trim()], RetailerRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RetailerRow::into_retailer).collect()
    }

    /// Observation history for a retailer, newest first.
    pub fn rate_history(
        &self,
        retailer_id: &str,
        website: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<CashbackObservation>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT retailer_website_key, retailer_id, website_name, cashback_rate, is_up_to,
                    observed_at, created_at
             FROM cashback_rates
             WHERE retailer_id = ?1 AND (?2 IS NULL OR website_name = ?2)
             ORDER BY observed_at DESC, obs_id DESC
             LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(
                params![retailer_id, website, limit.unwrap_or(-1)],
                ObservationRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ObservationRow::into_observation).collect()
    }

    /// Latest observation per retailer and website.
    pub fn latest_rates(&self, website: Option<&str>) -> Result<Vec<LatestRateRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.retailer_id, r.retailer_name, c.website_name, c.cashback_rate,
                    c.is_up_to, c.observed_at
             FROM cashback_rates c
             JOIN (
               SELECT retailer_website_key, MAX(obs_id) AS obs_id
               FROM cashback_rates
               GROUP BY retailer_website_key
             ) latest ON latest.obs_id = c.obs_id
             LEFT JOIN retailers r ON r.retailer_id = c.retailer_id
             WHERE ?1 IS NULL OR c.website_name = ?1
             ORDER BY COALESCE(r.retailer_name, c.retailer_id) COLLATE NOCASE, c.website_name",
        )?;
        let rows = stmt
            .query_map(params![website], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(retailer_id, retailer_name, website_name, cashback_rate, is_up_to, observed_at)|
                 -> Result<LatestRateRow, DbError> {
                    Ok(LatestRateRow {
                        retailer_id,
                        retailer_name,
                        website_name,
                        cashback_rate,
                        is_up_to,
                        observed_at: parse_ts(&observed_at)?,
                    })
                },
            )
            .collect()
    }

    pub fn retailer_count(&self) -> Result<i64, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM retailers", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn observation_count(&self) -> Result<i64, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM cashback_rates", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl RetailerStore for Db {
    fn get_retailer(&self, retailer_id: &str) -> Result<Option<Retailer>, StoreError> {
        Ok(self.retailer(retailer_id)?)
    }

    fn put_retailer(&mut self, retailer: &Retailer) -> Result<(), StoreError> {
        Ok(self.upsert_retailer_record(retailer)?)
    }

    fn merge_aliases(
        &mut self,
        retailer_id: &str,
        aliases: &BTreeMap<String, String>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.merge_retailer_aliases(retailer_id, aliases, updated_at)? {
            Ok(())
        } else {
            Err(StoreError::NotFound(retailer_id.to_string()))
        }
    }
}

impl CashbackStore for Db {
    fn append_rate(&mut self, observation: &CashbackObservation) -> Result<(), StoreError> {
        Ok(self.insert_observation(observation)?)
    }
}

struct RetailerRow {
    retailer_id: String,
    retailer_name: String,
    website_aliases: String,
    created_at: String,
    updated_at: String,
}

impl RetailerRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            retailer_id: row.get(0)?,
            retailer_name: row.get(1)?,
            website_aliases: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_retailer(self) -> Result<Retailer, DbError> {
        Ok(Retailer {
            retailer_id: self.retailer_id,
            retailer_name: self.retailer_name,
            website_aliases: serde_json::from_str(&self.website_aliases)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

struct ObservationRow {
    retailer_website_key: String,
    retailer_id: String,
    website_name: String,
    cashback_rate: String,
    is_up_to: bool,
    observed_at: String,
    created_at: String,
}

impl ObservationRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            retailer_website_key: row.get(0)?,
            retailer_id: row.get(1)?,
            website_name: row.get(2)?,
            cashback_rate: row.get(3)?,
            is_up_to: row.get(4)?,
            observed_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_observation(self) -> Result<CashbackObservation, DbError> {
        Ok(CashbackObservation {
            retailer_website_key: self.retailer_website_key,
            retailer_id: self.retailer_id,
            website_name: self.website_name,
            cashback_rate: self.cashback_rate,
            is_up_to: self.is_up_to,
            observed_at: parse_ts(&self.observed_at)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// Escapes `LIKE` wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DbError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
