//! Ephemeral store for demo mode

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::{CompletionStore, PerformanceRecord, PerformanceStore, SetKey, StoreError};

/// In-memory store; everything is lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    performance: BTreeMap<(NaiveDate, String), PerformanceRecord>,
    completions: BTreeSet<(NaiveDate, SetKey)>,
}

impl PerformanceStore for MemoryStore {
    fn get_performance(
        &self,
        date: NaiveDate,
        exercise: &str,
    ) -> Result<Option<PerformanceRecord>, StoreError> {
        Ok(self.performance.get(&(date, exercise.to_string())).cloned())
    }

    fn put_performance(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        record: &PerformanceRecord,
    ) -> Result<(), StoreError> {
        self.performance.insert((date, exercise.to_string()), record.clone());
        Ok(())
    }

    fn delete_performance(&mut self, date: NaiveDate, exercise: &str) -> Result<(), StoreError> {
        self.performance.remove(&(date, exercise.to_string()));
        Ok(())
    }

    fn find_performance(
        &self,
        exercise: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, PerformanceRecord)>, StoreError> {
        Ok(self
            .performance
            .iter()
            .filter(|((date, name), _)| name == exercise && *date >= from && *date <= to)
            .map(|((date, _), record)| (*date, record.clone()))
            .collect())
    }
}

impl CompletionStore for MemoryStore {
    fn completed_sets(&self, date: NaiveDate) -> Result<BTreeSet<SetKey>, StoreError> {
        Ok(self
            .completions
            .iter()
            .filter(|(d, _)| *d == date)
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn mark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError> {
        self.completions.insert((date, SetKey::new(exercise, set_index)));
        Ok(())
    }

    fn unmark_set(
        &mut self,
        date: NaiveDate,
        exercise: &str,
        set_index: u32,
    ) -> Result<(), StoreError> {
        self.completions.remove(&(date, SetKey::new(exercise, set_index)));
        Ok(())
    }

    fn completed_dates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        Ok(self
            .completions
            .iter()
            .map(|(date, _)| *date)
            .filter(|date| *date >= from && *date <= to)
            .collect())
    }
}
