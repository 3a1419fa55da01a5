//! Workout session - one user's view of one training day
//!
//! Holds the day's plan, set completion flags and logged performance.
//! Persistence failures are logged and swallowed: the in-memory state
//! stays authoritative for the rest of the session.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{Duration, Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{
    CompletionStore, MemoryStore, PerformanceRecord, PerformanceStore, SetKey, StoreError,
    TrainingStore,
};
use crate::engine::{DayPlan, Prescription, Program};
use crate::exercises::{Load, Reps, round_quarter};
use crate::timer::RestTimer;

/// Who the session belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    /// Nothing durable, backed by an in-memory store
    Demo,
}

impl Identity {
    /// A missing or blank user id falls back to demo mode
    pub fn resolve(user: Option<&str>, demo: bool) -> Self {
        if demo {
            return Identity::Demo;
        }
        match user.map(str::trim) {
            Some(id) if !id.is_empty() => Identity::User(id.to_string()),
            Some(_) => {
                warn!("blank user id, running in demo mode");
                Identity::Demo
            }
            None => Identity::Demo,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Identity::Demo)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Demo => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "{}", id),
            Identity::Demo => write!(f, "demo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Actual set compared with the prescription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    Up,
    Down,
    Equal,
}

impl Performance {
    pub fn symbol(&self) -> &'static str {
        match self {
            Performance::Up => "↑",
            Performance::Down => "↓",
            Performance::Equal => "=",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("{0} is not on the plan for this day")]
    UnknownExercise(String),
    #[error("{exercise} has {sets} sets, no set {set}")]
    SetOutOfRange { exercise: String, set: u32, sets: u32 },
    #[error("{0} has no numeric weight")]
    NotWeighted(String),
}

/// Record prefilled with the prescription: numeric weight and reps for every set
pub fn prefilled_record(prescription: &Prescription) -> PerformanceRecord {
    let sets = prescription.sets as usize;
    PerformanceRecord {
        weights: vec![prescription.weight.kg(); sets],
        reps: vec![prescription.reps.count(); sets],
        notes: String::new(),
    }
}

/// Store one set's actual weight/reps and mark it done.
/// Existing values for the other sets are kept.
pub fn log_set<S>(
    store: &mut S,
    date: NaiveDate,
    prescription: &Prescription,
    set: u32,
    weight: f64,
    reps: u32,
) -> Result<PerformanceRecord, StoreError>
where
    S: TrainingStore + ?Sized,
{
    let mut record = store
        .get_performance(date, &prescription.exercise)?
        .unwrap_or_else(|| prefilled_record(prescription));
    record.set_weight(set as usize, Some(round_quarter(weight.max(0.0))));
    record.set_reps(set as usize, Some(reps));
    store.put_performance(date, &prescription.exercise, &record)?;
    store.mark_set(date, &prescription.exercise, set)?;
    Ok(record)
}

pub struct WorkoutSession {
    program: Program,
    store: Box<dyn TrainingStore>,
    identity: Identity,
    date: NaiveDate,
    plan: DayPlan,
    completed: BTreeSet<SetKey>,
    records: HashMap<String, PerformanceRecord>,
    timer: RestTimer,
}

impl WorkoutSession {
    pub fn new(
        program: Program,
        store: Box<dyn TrainingStore>,
        identity: Identity,
        date: NaiveDate,
    ) -> Self {
        let plan = program.plan_day(date, &*store);
        let mut session = Self {
            program,
            store,
            identity,
            date,
            plan,
            completed: BTreeSet::new(),
            records: HashMap::new(),
            timer: RestTimer::new(),
        };
        session.load_state();
        session
    }

    /// Session over a fresh in-memory store
    pub fn demo(program: Program, date: NaiveDate) -> Self {
        Self::new(program, Box::new(MemoryStore::default()), Identity::Demo, date)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn store(&self) -> &dyn TrainingStore {
        &*self.store
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn plan(&self) -> &DayPlan {
        &self.plan
    }

    pub fn timer(&self) -> &RestTimer {
        &self.timer
    }

    /// Advance the rest timer by one second
    pub fn tick(&mut self) -> bool {
        self.timer.tick()
    }

    /// Recompute the plan and reload flags and records for the current date
    fn load_day(&mut self) {
        self.plan = self.program.plan_day(self.date, &*self.store);
        self.timer.cancel();
        self.load_state();
    }

    /// Completion flags and records for the current plan
    fn load_state(&mut self) {
        self.completed = match self.store.completed_sets(self.date) {
            Ok(sets) => sets,
            Err(e) => {
                warn!(date = %self.date, "could not load completed sets: {}", e);
                BTreeSet::new()
            }
        };

        self.records.clear();
        let names: Vec<String> = self.prescriptions().map(|p| p.exercise.clone()).collect();
        for name in names {
            match self.store.get_performance(self.date, &name) {
                Ok(Some(record)) => {
                    self.records.insert(name, record);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(date = %self.date, exercise = %name, "could not load performance: {}", e)
                }
            }
        }
        debug!(date = %self.date, completed = self.completed.len(), "loaded day");
    }

    fn prescriptions(&self) -> impl Iterator<Item = &Prescription> {
        self.plan
            .exercises
            .iter()
            .chain(self.plan.cardio.as_ref().map(|c| &c.prescription))
    }

    /// Move one training day back or forward, skipping rest days
    pub fn navigate(&mut self, direction: Direction) {
        let step = match direction {
            Direction::Previous => Duration::days(-1),
            Direction::Next => Duration::days(1),
        };

        let mut date = self.date + step;
        for _ in 0..7 {
            if !self.program.workout_for(date).is_rest_day() {
                break;
            }
            date += step;
        }
        // A week of rest days: just move one day
        if self.program.workout_for(date).is_rest_day() {
            date = self.date + step;
        }
        self.go_to(date);
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.date = date;
        self.load_day();
    }

    pub fn today(&mut self) {
        self.go_to(Local::now().date_naive());
    }

    fn prescription(&self, exercise: &str, set: u32) -> Result<&Prescription, SessionError> {
        let prescription = self
            .plan
            .prescription(exercise)
            .ok_or_else(|| SessionError::UnknownExercise(exercise.to_string()))?;
        if set >= prescription.sets {
            return Err(SessionError::SetOutOfRange {
                exercise: exercise.to_string(),
                set: set + 1,
                sets: prescription.sets,
            });
        }
        Ok(prescription)
    }

    pub fn is_completed(&self, exercise: &str, set: u32) -> bool {
        self.completed.contains(&SetKey::new(exercise, set))
    }

    /// (done, total) over every prescribed set of the day
    pub fn progress(&self) -> (usize, usize) {
        let total: u32 = self.prescriptions().map(|p| p.sets).sum();
        let done = self
            .prescriptions()
            .map(|p| (0..p.sets).filter(|&set| self.is_completed(&p.exercise, set)).count())
            .sum();
        (done, total as usize)
    }

    /// Flip a set's completion flag; returns the new state
    pub fn toggle_set(&mut self, exercise: &str, set: u32) -> Result<bool, SessionError> {
        let done = !self.is_completed(exercise, set);
        self.set_completed(exercise, set, done)?;
        Ok(done)
    }

    /// Mark or unmark a set. Completing a set starts the rest timer.
    pub fn set_completed(
        &mut self,
        exercise: &str,
        set: u32,
        done: bool,
    ) -> Result<(), SessionError> {
        let rest = self.prescription(exercise, set)?.rest;
        let key = SetKey::new(exercise, set);

        let result = if done {
            self.completed.insert(key);
            self.timer.start(rest.seconds());
            self.store.mark_set(self.date, exercise, set)
        } else {
            self.completed.remove(&key);
            self.store.unmark_set(self.date, exercise, set)
        };

        if let Err(e) = result {
            warn!(date = %self.date, %exercise, set, "could not save set completion: {}", e);
        }
        Ok(())
    }

    /// Clear the day's flags in memory; stored flags are untouched
    pub fn reset_sets(&mut self) {
        info!(date = %self.date, "reset {} completed sets", self.completed.len());
        self.completed.clear();
        self.timer.cancel();
    }

    /// Logged record for an exercise on the current day
    pub fn record(&self, exercise: &str) -> Option<&PerformanceRecord> {
        self.records.get(exercise)
    }

    /// Change a record through `edit`, creating it from the prescription first
    fn edit_record<F>(
        &mut self,
        exercise: &str,
        set: u32,
        edit: F,
    ) -> Result<PerformanceRecord, SessionError>
    where
        F: FnOnce(&mut PerformanceRecord),
    {
        let prescription = self.prescription(exercise, set)?;
        let prefilled = prefilled_record(prescription);
        let record = self
            .records
            .entry(exercise.to_string())
            .or_insert(prefilled);
        edit(record);
        let record = record.clone();

        if let Err(e) = self.store.put_performance(self.date, exercise, &record) {
            warn!(date = %self.date, %exercise, set, "could not save performance: {}", e);
        }
        Ok(record)
    }

    /// Actual weight += delta, rounded to 0.25 kg, never below zero
    pub fn nudge_weight(
        &mut self,
        exercise: &str,
        set: u32,
        delta: f64,
    ) -> Result<f64, SessionError> {
        if !self.prescription(exercise, set)?.weight.is_numeric() {
            return Err(SessionError::NotWeighted(exercise.to_string()));
        }
        let record = self.edit_record(exercise, set, |record| {
            let current = record.weight(set as usize).unwrap_or(0.0);
            record.set_weight(set as usize, Some(round_quarter((current + delta).max(0.0))));
        })?;
        Ok(record.weight(set as usize).unwrap_or(0.0))
    }

    /// Actual reps += delta, never below zero
    pub fn nudge_reps(
        &mut self,
        exercise: &str,
        set: u32,
        delta: i32,
    ) -> Result<u32, SessionError> {
        let record = self.edit_record(exercise, set, |record| {
            let current = i64::from(record.reps(set as usize).unwrap_or(0));
            let reps = (current + i64::from(delta)).max(0) as u32;
            record.set_reps(set as usize, Some(reps));
        })?;
        Ok(record.reps(set as usize).unwrap_or(0))
    }

    pub fn record_set(
        &mut self,
        exercise: &str,
        set: u32,
        weight: f64,
        reps: u32,
    ) -> Result<(), SessionError> {
        self.edit_record(exercise, set, |record| {
            record.set_weight(set as usize, Some(round_quarter(weight.max(0.0))));
            record.set_reps(set as usize, Some(reps));
        })?;
        Ok(())
    }

    pub fn set_notes(&mut self, exercise: &str, notes: &str) -> Result<(), SessionError> {
        self.edit_record(exercise, 0, |record| record.notes = notes.trim().to_string())?;
        Ok(())
    }

    /// Compare a logged set with its prescription: weight first, then reps.
    /// `None` for marker loads or when no weight was logged.
    pub fn performance_indicator(&self, exercise: &str, set: u32) -> Option<Performance> {
        let prescription = self.prescription(exercise, set).ok()?;
        let Load::Kg(expected) = prescription.weight else {
            return None;
        };
        let record = self.records.get(exercise)?;
        let actual = record.weight(set as usize)?;

        if actual > expected {
            return Some(Performance::Up);
        }
        if actual < expected {
            return Some(Performance::Down);
        }
        let reps_diff = match (record.reps(set as usize), prescription.reps) {
            (Some(actual), Reps::Count(expected)) => i64::from(actual) - i64::from(expected),
            _ => 0,
        };
        Some(match reps_diff {
            d if d > 0 => Performance::Up,
            d if d < 0 => Performance::Down,
            _ => Performance::Equal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn program() -> Program {
        Program::builtin(date(8, 19))
    }

    /// Tuesday of week 3: overload week for the arms day
    fn session() -> WorkoutSession {
        WorkoutSession::demo(program(), date(9, 2))
    }

    struct OfflineStore;

    fn offline() -> StoreError {
        StoreError::Unavailable("offline".to_string())
    }

    impl PerformanceStore for OfflineStore {
        fn get_performance(
            &self,
            _: NaiveDate,
            _: &str,
        ) -> Result<Option<PerformanceRecord>, StoreError> {
            Err(offline())
        }
        fn put_performance(
            &mut self,
            _: NaiveDate,
            _: &str,
            _: &PerformanceRecord,
        ) -> Result<(), StoreError> {
            Err(offline())
        }
        fn delete_performance(&mut self, _: NaiveDate, _: &str) -> Result<(), StoreError> {
            Err(offline())
        }
        fn find_performance(
            &self,
            _: &str,
            _: NaiveDate,
            _: NaiveDate,
        ) -> Result<Vec<(NaiveDate, PerformanceRecord)>, StoreError> {
            Err(offline())
        }
    }

    impl CompletionStore for OfflineStore {
        fn completed_sets(&self, _: NaiveDate) -> Result<BTreeSet<SetKey>, StoreError> {
            Err(offline())
        }
        fn mark_set(&mut self, _: NaiveDate, _: &str, _: u32) -> Result<(), StoreError> {
            Err(offline())
        }
        fn unmark_set(&mut self, _: NaiveDate, _: &str, _: u32) -> Result<(), StoreError> {
            Err(offline())
        }
        fn completed_dates(
            &self,
            _: NaiveDate,
            _: NaiveDate,
        ) -> Result<BTreeSet<NaiveDate>, StoreError> {
            Err(offline())
        }
    }

    #[test]
    fn test_identity_resolution() {
        assert_eq!(Identity::resolve(Some("felix"), false), Identity::User("felix".to_string()));
        assert_eq!(Identity::resolve(Some("  "), false), Identity::Demo);
        assert_eq!(Identity::resolve(None, false), Identity::Demo);
        assert_eq!(Identity::resolve(Some("felix"), true), Identity::Demo);
        assert_eq!(Identity::User("felix".to_string()).user_id(), Some("felix"));
    }

    #[test]
    fn test_toggle_persists_and_starts_timer() {
        let mut s = session();
        assert!(s.toggle_set("Barbell Shoulder Press", 0).unwrap());
        assert!(s.is_completed("Barbell Shoulder Press", 0));
        assert!(s.timer().is_running());
        let stored = s.store().completed_sets(date(9, 2)).unwrap();
        assert!(stored.contains(&SetKey::new("Barbell Shoulder Press", 0)));

        assert!(!s.toggle_set("Barbell Shoulder Press", 0).unwrap());
        assert!(s.store().completed_sets(date(9, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_rejects_unknown_and_out_of_range() {
        let mut s = session();
        assert_eq!(
            s.toggle_set("Bench Press", 0),
            Err(SessionError::UnknownExercise("Bench Press".to_string()))
        );
        let sets = s.plan().prescription("Barbell Shoulder Press").unwrap().sets;
        assert!(matches!(
            s.toggle_set("Barbell Shoulder Press", sets),
            Err(SessionError::SetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_navigation_skips_rest_day() {
        // Saturday 2025-08-30 -> Monday 2025-09-01
        let mut s = WorkoutSession::demo(program(), date(8, 30));
        let first = s.plan().exercises[0].exercise.clone();
        s.toggle_set(&first, 0).unwrap();
        s.navigate(Direction::Next);
        assert_eq!(s.date(), date(9, 1));
        assert_eq!(s.progress().0, 0);
        assert!(!s.timer().is_running());

        s.navigate(Direction::Previous);
        assert_eq!(s.date(), date(8, 30));
        // Flags come back from the store
        assert_eq!(s.progress().0, 1);
    }

    #[test]
    fn test_progress_ignores_sets_off_the_plan() {
        let mut store = MemoryStore::default();
        store.mark_set(date(9, 2), "Overhead Cable Extension", 0).unwrap();
        // Not on the arms day, and past the last set
        store.mark_set(date(9, 2), "Bench Press", 0).unwrap();
        store.mark_set(date(9, 2), "Overhead Cable Extension", 9).unwrap();

        let s = WorkoutSession::new(
            program(),
            Box::new(store),
            Identity::User("felix".to_string()),
            date(9, 2),
        );
        let (done, total) = s.progress();
        assert_eq!(done, 1);
        assert!(done <= total);
    }

    #[test]
    fn test_reset_only_clears_memory() {
        let mut s = session();
        s.toggle_set("Overhead Cable Extension", 1).unwrap();
        s.reset_sets();
        assert_eq!(s.progress().0, 0);
        assert_eq!(s.store().completed_sets(date(9, 2)).unwrap().len(), 1);
    }

    #[test]
    fn test_nudge_weight_prefills_and_rounds() {
        let mut s = session();
        let prescription = s.plan().prescription("Overhead Cable Extension").unwrap();
        let prescribed = prescription.weight.kg().unwrap();
        let weight = s.nudge_weight("Overhead Cable Extension", 1, 0.3).unwrap();
        assert_eq!(weight, round_quarter(prescribed + 0.3));

        let record = s.record("Overhead Cable Extension").unwrap();
        assert_eq!(record.weight(0), Some(prescribed));
        assert_eq!(record.weight(1), Some(weight));
        let stored = s.store().get_performance(date(9, 2), "Overhead Cable Extension").unwrap();
        assert_eq!(stored.as_ref(), Some(record));
    }

    #[test]
    fn test_nudges_floor_at_zero() {
        let mut s = session();
        assert_eq!(s.nudge_weight("Barbell Curls", 0, -500.0).unwrap(), 0.0);
        assert_eq!(s.nudge_reps("Barbell Curls", 0, -100).unwrap(), 0);
        assert_eq!(s.nudge_reps("Barbell Curls", 0, 2).unwrap(), 2);
    }

    #[test]
    fn test_nudge_weight_on_bodyweight() {
        let mut s = session();
        assert_eq!(
            s.nudge_weight("Diamond Push-ups", 0, 1.0),
            Err(SessionError::NotWeighted("Diamond Push-ups".to_string()))
        );
    }

    #[test]
    fn test_performance_indicator() {
        let mut s = session();
        let p = s.plan().prescription("Barbell Curls").unwrap().clone();
        let kg = p.weight.kg().unwrap();
        let reps = p.reps.count().unwrap();
        assert_eq!(s.performance_indicator("Barbell Curls", 0), None);

        s.record_set("Barbell Curls", 0, kg + 2.5, reps - 2).unwrap();
        assert_eq!(s.performance_indicator("Barbell Curls", 0), Some(Performance::Up));
        s.record_set("Barbell Curls", 0, kg, reps - 1).unwrap();
        assert_eq!(s.performance_indicator("Barbell Curls", 0), Some(Performance::Down));
        s.record_set("Barbell Curls", 0, kg, reps).unwrap();
        assert_eq!(s.performance_indicator("Barbell Curls", 0), Some(Performance::Equal));
        assert_eq!(s.performance_indicator("Diamond Push-ups", 0), None);
    }

    #[test]
    fn test_notes_are_trimmed() {
        let mut s = session();
        s.set_notes("Barbell Curls", "  grip slipped  ").unwrap();
        assert_eq!(s.record("Barbell Curls").unwrap().notes, "grip slipped");
    }

    #[test]
    fn test_offline_store_keeps_memory_state() {
        let mut s = WorkoutSession::new(
            program(),
            Box::new(OfflineStore),
            Identity::User("felix".to_string()),
            date(9, 2),
        );
        assert!(!s.plan().is_rest_day());
        assert!(s.toggle_set("Barbell Curls", 0).unwrap());
        assert!(s.is_completed("Barbell Curls", 0));
        s.record_set("Barbell Curls", 0, 30.0, 10).unwrap();
        assert_eq!(s.record("Barbell Curls").unwrap().weight(0), Some(30.0));
    }

    #[test]
    fn test_log_set_keeps_other_sets() {
        let program = program();
        let mut store = MemoryStore::default();
        let plan = program.plan_day(date(9, 2), &store);
        let p = plan.prescription("Overhead Cable Extension").unwrap();

        log_set(&mut store, date(9, 2), p, 1, 31.1, 9).unwrap();
        let record = log_set(&mut store, date(9, 2), p, 0, 30.0, 10).unwrap();

        assert_eq!(record.weight(1), Some(31.0));
        assert_eq!(record.reps(1), Some(9));
        assert_eq!(record.weight(0), Some(30.0));
        assert_eq!(store.completed_sets(date(9, 2)).unwrap().len(), 2);
    }
}
