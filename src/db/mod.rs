//! Storage - per-day performance records and set completion flags

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::Database;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt record for {exercise} on {date}: {reason}")]
    Corrupt {
        date: NaiveDate,
        exercise: String,
        reason: String,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Actual weight/reps per set plus free-form notes for one exercise on one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub weights: Vec<Option<f64>>,
    pub reps: Vec<Option<u32>>,
    #[serde(default)]
    pub notes: String,
}

impl PerformanceRecord {
    pub fn weight(&self, set: usize) -> Option<f64> {
        self.weights.get(set).copied().flatten()
    }

    pub fn reps(&self, set: usize) -> Option<u32> {
        self.reps.get(set).copied().flatten()
    }

    pub fn set_weight(&mut self, set: usize, weight: Option<f64>) {
        if self.weights.len() <= set {
            self.weights.resize(set + 1, None);
        }
        self.weights[set] = weight;
    }

    pub fn set_reps(&mut self, set: usize, reps: Option<u32>) {
        if self.reps.len() <= set {
            self.reps.resize(set + 1, None);
        }
        self.reps[set] = reps;
    }

    /// Sets with both a weight and a rep count
    pub fn logged_sets(&self) -> impl Iterator<Item = (f64, u32)> + '_ {
        self.weights
            .iter()
            .zip(&self.reps)
            .filter_map(|(w, r)| Some(((*w)?, (*r)?)))
    }

    /// Heaviest weight logged in any set
    pub fn top_weight(&self) -> Option<f64> {
        self.weights.iter().flatten().copied().reduce(f64::max)
    }

    /// Sum of weight x reps over logged sets
    pub fn volume(&self) -> f64 {
        self.logged_sets().map(|(w, r)| w * f64::from(r)).sum()
    }
}

/// Completion flag key within one day
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SetKey {
    pub exercise: String,
    pub set_index: u32,
}

impl SetKey {
    pub fn new(exercise: &str, set_index: u32) -> Self {
        Self {
            exercise: exercise.to_string(),
            set_index,
        }
    }
}

/// Performance records keyed by (date, exercise)
pub trait PerformanceStore {
    fn get_performance(
        &self,
        date: NaiveDate,
        exercise: &str,
    ) -> Result<Option<PerformanceRecord>, StoreError>;

    /// Insert or replace
    fn put_performance(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        record: &PerformanceRecord,
    ) -> Result<(), StoreError>;

    fn delete_performance(&mut self, date: NaiveDate, exercise: &str) -> Result<(), StoreError>;

    /// Records for one exercise in `from..=to`, oldest first
    fn find_performance(
        &self,
        exercise: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, PerformanceRecord)>, StoreError>;
}

/// Set completion flags keyed by (date, exercise, set index)
pub trait CompletionStore {
    fn completed_sets(&self, date: NaiveDate) -> Result<BTreeSet<SetKey>, StoreError>;

    fn mark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError>;

    fn unmark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError>;

    /// Days in `from..=to` with at least one completed set
    fn completed_dates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError>;
}

/// Both halves of the storage contract
pub trait TrainingStore: PerformanceStore + CompletionStore {}

impl<T: PerformanceStore + CompletionStore> TrainingStore for T {}
