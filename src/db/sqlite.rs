//! SQLite storage, one row per (user, day, exercise[, set])

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, warn};

use super::{CompletionStore, PerformanceRecord, PerformanceStore, SetKey, StoreError};

/// Database wrapper scoped to one user
pub struct Database {
    conn: Connection,
    user_id: String,
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Decode the JSON columns of a performance row
fn decode_record(
    weights: &str,
    reps: &str,
    notes: String,
) -> Result<PerformanceRecord, serde_json::Error> {
    Ok(PerformanceRecord {
        weights: serde_json::from_str(weights)?,
        reps: serde_json::from_str(reps)?,
        notes,
    })
}

impl Database {
    /// Open or create database
    pub fn open(path: &str, user_id: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening database {}", path))?;
        let db = Self {
            conn,
            user_id: user_id.to_string(),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory(user_id: &str) -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            user_id: user_id.to_string(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS performance (
                user_id TEXT NOT NULL,
                workout_date TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                weights TEXT NOT NULL,
                reps TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, workout_date, exercise_name)
            );
            CREATE TABLE IF NOT EXISTS workout_progress (
                user_id TEXT NOT NULL,
                workout_date TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                set_index INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                PRIMARY KEY (user_id, workout_date, exercise_name, set_index)
            );",
        )?;
        Ok(())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Re-scope the connection to another user
    pub fn set_user(&mut self, user_id: &str) {
        if self.user_id != user_id {
            debug!("database scope: {} -> {}", self.user_id, user_id);
            self.user_id = user_id.to_string();
        }
    }
}

impl PerformanceStore for Database {
    fn get_performance(
        &self,
        date: NaiveDate,
        exercise: &str,
    ) -> Result<Option<PerformanceRecord>, StoreError> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT weights, reps, notes FROM performance
                 WHERE user_id = ?1 AND workout_date = ?2 AND exercise_name = ?3",
                params![self.user_id, date.to_string(), exercise],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(weights, reps, notes)| {
            decode_record(&weights, &reps, notes).map_err(|e| StoreError::Corrupt {
                date,
                exercise: exercise.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    fn put_performance(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        record: &PerformanceRecord,
    ) -> Result<(), StoreError> {
        let corrupt = |e: serde_json::Error| StoreError::Corrupt {
            date,
            exercise: exercise.to_string(),
            reason: e.to_string(),
        };
        let weights = serde_json::to_string(&record.weights).map_err(corrupt)?;
        let reps = serde_json::to_string(&record.reps).map_err(corrupt)?;

        self.conn.execute(
            "INSERT INTO performance (user_id, workout_date, exercise_name, weights, reps, notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (user_id, workout_date, exercise_name) DO UPDATE SET
                weights = excluded.weights,
                reps = excluded.reps,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                self.user_id,
                date.to_string(),
                exercise,
                weights,
                reps,
                record.notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_performance(&mut self, date: NaiveDate, exercise: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM performance WHERE user_id = ?1 AND workout_date = ?2 AND exercise_name = ?3",
            params![self.user_id, date.to_string(), exercise],
        )?;
        Ok(())
    }

    fn find_performance(
        &self,
        exercise: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, PerformanceRecord)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT workout_date, weights, reps, notes FROM performance
             WHERE user_id = ?1 AND exercise_name = ?2 AND workout_date BETWEEN ?3 AND ?4
             ORDER BY workout_date ASC",
        )?;

        let rows = stmt
            .query_map(
                params![self.user_id, exercise, from.to_string(), to.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        // Malformed rows are skipped: history is best-effort
        let records = rows
            .into_iter()
            .filter_map(|(date, weights, reps, notes)| {
                let Some(day) = parse_date(&date) else {
                    warn!(%exercise, "skipping record with bad date {:?}", date);
                    return None;
                };
                match decode_record(&weights, &reps, notes) {
                    Ok(record) => Some((day, record)),
                    Err(e) => {
                        warn!(%exercise, date = %day, "skipping malformed record: {}", e);
                        None
                    }
                }
            })
            .collect();

        Ok(records)
    }
}

impl CompletionStore for Database {
    fn completed_sets(&self, date: NaiveDate) -> Result<BTreeSet<SetKey>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_name, set_index FROM workout_progress
             WHERE user_id = ?1 AND workout_date = ?2",
        )?;

        let keys = stmt
            .query_map(params![self.user_id, date.to_string()], |row| {
                Ok(SetKey {
                    exercise: row.get(0)?,
                    set_index: row.get(1)?,
                })
            })?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(keys)
    }

    fn mark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO workout_progress (user_id, workout_date, exercise_name, set_index, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, workout_date, exercise_name, set_index) DO UPDATE SET
                completed_at = excluded.completed_at",
            params![
                self.user_id,
                date.to_string(),
                exercise,
                set_index,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn unmark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM workout_progress
             WHERE user_id = ?1 AND workout_date = ?2 AND exercise_name = ?3 AND set_index = ?4",
            params![self.user_id, date.to_string(), exercise, set_index],
        )?;
        Ok(())
    }

    fn completed_dates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT workout_date FROM workout_progress
             WHERE user_id = ?1 AND workout_date BETWEEN ?2 AND ?3",
        )?;

        let dates = stmt
            .query_map(params![self.user_id, from.to_string(), to.to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dates.iter().filter_map(|d| parse_date(d)).collect())
    }
}
