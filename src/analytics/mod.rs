//! Analytics - expected vs actual progression, program statistics, trends

mod trend;

pub use trend::{Trend, TrendPredictor};

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::db::{CompletionStore, PerformanceStore, StoreError};
use crate::engine::clock::PROGRAM_WEEKS;
use crate::engine::{Phase, Program};
use crate::exercises::{Exercise, KEY_EXERCISES, Load, Reps};

/// One week of the expected-vs-actual chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPoint {
    pub week: u32,
    pub date: NaiveDate,
    pub expected_weight: Load,
    pub expected_reps: Reps,
    pub expected_sets: u32,
    pub expected_volume: Option<f64>,
    /// Mean weight over logged sets that week
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<f64>,
    pub actual_volume: Option<f64>,
}

/// Running sums of logged sets within one week
#[derive(Default)]
struct Actuals {
    sets: u32,
    weight: f64,
    reps: f64,
    volume: f64,
}

/// Furthest week a projection reaches; later weeks are dropped
pub const MAX_WEEK: u32 = PROGRAM_WEEKS * 2;

/// Weeks shown by default: from the start to four weeks past the current one
pub fn default_horizon(program: &Program, today: NaiveDate) -> RangeInclusive<u32> {
    let current = program.clock().week(today);
    1..=(current + 4).min(PROGRAM_WEEKS)
}

/// Replay the prescription at the start of each week and pair it with what was logged.
///
/// Expected values include auto-regulation from the history the store held
/// before that week.
pub fn project<S>(
    program: &Program,
    exercise: &Exercise,
    weeks: RangeInclusive<u32>,
    store: &S,
) -> Result<Vec<WeekPoint>, StoreError>
where
    S: PerformanceStore + ?Sized,
{
    let weeks = *weeks.start()..=(*weeks.end()).min(MAX_WEEK);
    if weeks.is_empty() {
        return Ok(Vec::new());
    }
    let clock = program.clock();
    let from = clock.week_start(*weeks.start());
    let last = clock.week_start(*weeks.end());
    let to = last.checked_add_days(Days::new(6)).unwrap_or(last);

    let mut actuals: BTreeMap<u32, Actuals> = BTreeMap::new();
    for (date, record) in store.find_performance(&exercise.name, from, to)? {
        let week = actuals.entry(clock.week(date)).or_default();
        for (weight, reps) in record.logged_sets() {
            week.sets += 1;
            week.weight += weight;
            week.reps += f64::from(reps);
            week.volume += weight * f64::from(reps);
        }
    }

    let points = weeks
        .map(|week| {
            let date = clock.week_start(week);
            let expected = program.prescribe(exercise, date, store);
            let actual = actuals.get(&week).filter(|a| a.sets > 0);
            let sets = actual.map(|a| f64::from(a.sets));

            WeekPoint {
                week,
                date,
                expected_weight: expected.weight,
                expected_reps: expected.reps,
                expected_sets: expected.sets,
                expected_volume: expected.volume(),
                actual_weight: actual.zip(sets).map(|(a, n)| a.weight / n),
                actual_reps: actual.zip(sets).map(|(a, n)| a.reps / n),
                actual_volume: actual.map(|a| a.volume),
            }
        })
        .collect();

    Ok(points)
}

/// Heaviest-weight trend for an exercise from the program start to `today`
pub fn trend<S>(
    program: &Program,
    exercise: &Exercise,
    today: NaiveDate,
    store: &S,
) -> Result<Option<TrendPredictor>, StoreError>
where
    S: PerformanceStore + ?Sized,
{
    let history = store.find_performance(&exercise.name, program.clock().start(), today)?;
    Ok(TrendPredictor::train(&history))
}

/// Exercises the progress view tracks by default
pub fn key_exercises(program: &Program) -> Vec<&Exercise> {
    KEY_EXERCISES
        .iter()
        .filter_map(|name| program.catalog().get(name))
        .collect()
}

pub const MILESTONES: &[(u32, &str)] = &[
    (4, "First Month Complete"),
    (13, "Phase 1 Complete"),
    (26, "Halfway Point"),
    (52, "Program Complete"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub name: &'static str,
    pub week: u32,
    pub reached: bool,
    pub weeks_remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramStats {
    pub weeks_passed: u32,
    /// Days with at least one completed set
    pub workouts_done: usize,
    pub total_workouts: usize,
    /// Percent, capped at 100
    pub completion_rate: u32,
    pub phase: Phase,
    pub milestones: Vec<Milestone>,
}

impl ProgramStats {
    pub fn compute<S>(program: &Program, today: NaiveDate, store: &S) -> Result<Self, StoreError>
    where
        S: CompletionStore + ?Sized,
    {
        let position = program.clock().position(today);
        let weeks_passed = position.week;
        let workouts_done = store.completed_dates(program.clock().start(), today)?.len();
        let total_workouts = program.schedule().training_days() * PROGRAM_WEEKS as usize;

        let completion_rate = if total_workouts == 0 {
            0
        } else {
            ((workouts_done as f64 / total_workouts as f64) * 100.0).round().min(100.0) as u32
        };

        let milestones = MILESTONES
            .iter()
            .map(|&(week, name)| Milestone {
                name,
                week,
                reached: weeks_passed >= week,
                weeks_remaining: week.saturating_sub(weeks_passed),
            })
            .collect();

        Ok(Self {
            weeks_passed,
            workouts_done,
            total_workouts,
            completion_rate,
            phase: position.phase,
            milestones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, PerformanceRecord};
    use pretty_assertions::assert_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn program() -> Program {
        Program::builtin(date(8, 19))
    }

    fn record(sets: &[(f64, u32)]) -> PerformanceRecord {
        PerformanceRecord {
            weights: sets.iter().map(|(w, _)| Some(*w)).collect(),
            reps: sets.iter().map(|(_, r)| Some(*r)).collect(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_default_horizon() {
        let program = program();
        assert_eq!(default_horizon(&program, date(8, 19)), 1..=5);
        assert_eq!(default_horizon(&program, date(9, 16)), 1..=9);
        assert_eq!(default_horizon(&program, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()), 1..=52);
    }

    #[test]
    fn test_project_without_history_follows_calendar() {
        let program = program();
        let bench = program.catalog().get("Bench Press").unwrap();
        let points = project(&program, bench, 1..=5, &MemoryStore::default()).unwrap();

        let weights: Vec<_> = points.iter().map(|p| p.expected_weight).collect();
        assert_eq!(
            weights,
            vec![Load::Kg(55.0), Load::Kg(55.0), Load::Kg(57.5), Load::Kg(44.0), Load::Kg(60.0)]
        );
        assert!(points.iter().all(|p| p.actual_weight.is_none()));
        assert_eq!(points[1].expected_reps, Reps::Count(9));
    }

    #[test]
    fn test_project_averages_actuals_per_week() {
        let program = program();
        let bench = program.catalog().get("Bench Press").unwrap();
        let mut store = MemoryStore::default();
        // week 2 runs Tuesday 08-26 to Monday 09-01
        store
            .put_performance(date(8, 26), "Bench Press", &record(&[(55.0, 9), (55.0, 7)]))
            .unwrap();
        store.put_performance(date(8, 28), "Bench Press", &record(&[(57.5, 8)])).unwrap();

        let points = project(&program, bench, 1..=3, &store).unwrap();
        assert_eq!(points[0].actual_weight, None);

        let week2 = &points[1];
        assert_eq!(week2.week, 2);
        assert_eq!(week2.actual_weight, Some((55.0 + 55.0 + 57.5) / 3.0));
        assert_eq!(week2.actual_reps, Some(8.0));
        assert_eq!(week2.actual_volume, Some(55.0 * 9.0 + 55.0 * 7.0 + 57.5 * 8.0));
        // Week 3 overload (57.5) nudged by the week-2 sets: (+1.25 - 1.25 + 1.25) / 3
        assert_eq!(points[2].expected_weight, Load::Kg(58.0));
    }

    #[test]
    fn test_project_stops_at_max_week() {
        let program = program();
        let bench = program.catalog().get("Bench Press").unwrap();
        let store = MemoryStore::default();

        let points = project(&program, bench, 20_000_000..=20_000_000, &store).unwrap();
        assert!(points.is_empty());

        let points = project(&program, bench, 100..=u32::MAX, &store).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points.last().map(|p| p.week), Some(MAX_WEEK));
    }

    #[test]
    fn test_program_stats() {
        let program = program();
        let mut store = MemoryStore::default();
        store.mark_set(date(8, 19), "Bench Press", 0).unwrap();
        store.mark_set(date(8, 19), "Bench Press", 1).unwrap();
        store.mark_set(date(8, 20), "Leg Press", 0).unwrap();

        let stats = ProgramStats::compute(&program, date(9, 16), &store).unwrap();
        assert_eq!(stats.weeks_passed, 5);
        assert_eq!(stats.workouts_done, 2);
        assert_eq!(stats.total_workouts, 6 * 52);
        assert_eq!(stats.completion_rate, 1);
        assert_eq!(stats.phase, Phase::Adaptation);
        assert_eq!(
            stats.milestones[0],
            Milestone { name: "First Month Complete", week: 4, reached: true, weeks_remaining: 0 }
        );
        assert_eq!(stats.milestones[1].weeks_remaining, 8);
        assert!(!stats.milestones[3].reached);
    }

    #[test]
    fn test_key_exercises_exist() {
        let program = program();
        let names: Vec<_> = key_exercises(&program).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), KEY_EXERCISES.len());
        assert!(names.contains(&"Bench Press"));
    }
}
