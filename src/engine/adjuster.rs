//! Auto-regulation: nudge the prescribed weight from recently logged sets

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::progression::Prescription;
use crate::db::{PerformanceRecord, PerformanceStore, StoreError};
use crate::exercises::{Exercise, ExerciseType, Load, Reps, round_quarter};

/// How far back to look for logged sessions
pub const LOOKBACK_DAYS: i64 = 28;

/// Most recent logged sessions that feed the adjustment
pub const MAX_HISTORY_SESSIONS: usize = 3;

/// Bound on the averaged adjustment (kg, either direction)
pub const MAX_ADJUSTMENT: f64 = 5.0;

/// Per-set contributions for one exercise type
#[derive(Debug, Clone, Copy, PartialEq)]
struct Steps {
    /// reps < 75% of target
    missed: f64,
    /// target reps hit at or above target weight
    beaten: f64,
    /// reps < 90% of target
    short: f64,
}

impl Steps {
    fn for_kind(kind: ExerciseType) -> Option<Self> {
        match kind {
            ExerciseType::Compound => Some(Steps {
                missed: -2.5,
                beaten: 1.25,
                short: -1.25,
            }),
            ExerciseType::Isolation => Some(Steps {
                missed: -1.25,
                beaten: 0.625,
                short: -0.625,
            }),
            ExerciseType::Bodyweight | ExerciseType::Cardio => None,
        }
    }

    fn score(
        &self,
        actual_weight: f64,
        actual_reps: f64,
        target_weight: f64,
        target_reps: f64,
    ) -> f64 {
        if actual_reps < 0.75 * target_reps {
            self.missed
        } else if actual_reps >= target_reps && actual_weight >= target_weight {
            self.beaten
        } else if actual_reps < 0.9 * target_reps {
            self.short
        } else {
            0.0
        }
    }
}

/// Sets carrying both a usable weight and a rep count
fn usable_sets(record: &PerformanceRecord) -> impl Iterator<Item = (f64, u32)> + '_ {
    record
        .logged_sets()
        .filter(|(weight, _)| weight.is_finite() && *weight >= 0.0)
}

/// Average per-set contribution, clamped; `None` when no set was usable
fn average_adjustment(
    history: &[PerformanceRecord],
    steps: Steps,
    target_weight: f64,
    target_reps: u32,
) -> Option<f64> {
    let target_reps = f64::from(target_reps);
    let (total, count) = history
        .iter()
        .flat_map(usable_sets)
        .map(|(w, r)| steps.score(w, f64::from(r), target_weight, target_reps))
        .fold((0.0, 0u32), |(total, count), delta| (total + delta, count + 1));

    if count == 0 {
        return None;
    }
    Some((total / f64::from(count)).clamp(-MAX_ADJUSTMENT, MAX_ADJUSTMENT))
}

/// Apply the bounded history adjustment on top of a base prescription.
///
/// Targets are the exercise's base weight and reps, not the date's
/// prescription. Marker loads, bodyweight and cardio exercises, and
/// exercises without a numeric rep target come back unchanged.
pub fn adjust(
    base: &Prescription,
    exercise: &Exercise,
    history: &[PerformanceRecord],
) -> Prescription {
    let mut result = base.clone();
    result.adjustment = 0.0;
    result.is_adjusted = false;

    if history.is_empty() {
        return result;
    }
    let (Load::Kg(prescribed), Load::Kg(target_weight), Reps::Count(target_reps)) =
        (base.weight, exercise.base_weight, exercise.base_reps)
    else {
        return result;
    };
    let Some(steps) = Steps::for_kind(exercise.kind) else {
        return result;
    };
    let Some(delta) = average_adjustment(history, steps, target_weight, target_reps) else {
        return result;
    };

    result.weight = Load::Kg(round_quarter((prescribed + delta).max(0.0)));
    result.adjustment = delta;
    result.is_adjusted = delta != 0.0;
    if result.is_adjusted {
        debug!(exercise = %exercise.name, delta, "auto-regulated weight");
    }
    result
}

/// The most recent logged records for `exercise` strictly before `date`
/// within the lookback window, oldest first.
pub fn recent_history<S>(
    store: &S,
    exercise: &str,
    date: NaiveDate,
) -> Result<Vec<PerformanceRecord>, StoreError>
where
    S: PerformanceStore + ?Sized,
{
    let from = date - Duration::days(LOOKBACK_DAYS);
    let to = date - Duration::days(1);
    let logged: Vec<PerformanceRecord> = store
        .find_performance(exercise, from, to)?
        .into_iter()
        .map(|(_, record)| record)
        .filter(|record| usable_sets(record).next().is_some())
        .collect();

    let skip = logged.len().saturating_sub(MAX_HISTORY_SESSIONS);
    Ok(logged.into_iter().skip(skip).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::engine::clock::ProgramClock;
    use crate::engine::progression::compute_base_prescription;
    use crate::exercises::{MuscleGroup, Rest};
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exercise(kind: ExerciseType, weight: Load, reps: Reps) -> Exercise {
        Exercise {
            name: "Bench Press".to_string(),
            group: MuscleGroup::Chest,
            base_weight: weight,
            base_reps: reps,
            base_sets: 2,
            tempo: "5-5".to_string(),
            rest: Rest::Seconds(120),
            kind,
            is_accessory: false,
        }
    }

    fn bench() -> Exercise {
        exercise(ExerciseType::Compound, Load::Kg(40.0), Reps::Count(8))
    }

    fn base_for(ex: &Exercise) -> Prescription {
        let clock = ProgramClock::new(date(2025, 8, 19));
        compute_base_prescription(ex, &clock, date(2025, 8, 19))
    }

    fn record(sets: &[(f64, u32)]) -> PerformanceRecord {
        PerformanceRecord {
            weights: sets.iter().map(|(w, _)| Some(*w)).collect(),
            reps: sets.iter().map(|(_, r)| Some(*r)).collect(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_empty_history_is_identity() {
        let ex = bench();
        let base = base_for(&ex);
        let adjusted = adjust(&base, &ex, &[]);
        assert_eq!(adjusted, base);
        assert!(!adjusted.is_adjusted);
    }

    #[rstest]
    // 5 < 6 (75% of 8)
    #[case(40.0, 5, 37.5)]
    // hit 8 reps at 40
    #[case(45.0, 8, 41.25)]
    // 7 < 7.2 (90% of 8)
    #[case(40.0, 7, 38.75)]
    // 8 reps at a lighter weight: no change
    #[case(35.0, 8, 40.0)]
    fn test_single_set_compound(#[case] weight: f64, #[case] reps: u32, #[case] expected: f64) {
        let ex = bench();
        let adjusted = adjust(&base_for(&ex), &ex, &[record(&[(weight, reps)])]);
        assert_eq!(adjusted.weight, Load::Kg(expected));
        assert_eq!(adjusted.is_adjusted, expected != 40.0);
    }

    #[test]
    fn test_isolation_uses_half_steps() {
        let ex = exercise(ExerciseType::Isolation, Load::Kg(20.0), Reps::Count(12));
        let adjusted = adjust(&base_for(&ex), &ex, &[record(&[(20.0, 12), (20.0, 12)])]);
        assert_eq!(adjusted.adjustment, 0.625);
        // 20.625 rounds to the nearest quarter
        assert_eq!(adjusted.weight, Load::Kg(20.75));
    }

    #[test]
    fn test_average_over_usable_sets() {
        let ex = bench();
        let mut partial = record(&[(40.0, 8), (40.0, 5)]);
        partial.weights.push(None);
        partial.reps.push(Some(8));
        partial.weights.push(Some(40.0));
        let adjusted = adjust(&base_for(&ex), &ex, &[partial]);
        // (+1.25 - 2.5) / 2
        assert_eq!(adjusted.adjustment, -0.625);
        assert_eq!(adjusted.weight, Load::Kg(39.5));
    }

    #[test]
    fn test_adjustment_is_clamped() {
        let steep = Steps { missed: -8.0, beaten: 6.0, short: -7.0 };
        let misses = vec![record(&[(40.0, 0); 5]); 3];
        assert_eq!(average_adjustment(&misses, steep, 40.0, 8), Some(-MAX_ADJUSTMENT));
        let wins = vec![record(&[(50.0, 10)])];
        assert_eq!(average_adjustment(&wins, steep, 40.0, 8), Some(MAX_ADJUSTMENT));

        let ex = bench();
        let adjusted = adjust(&base_for(&ex), &ex, &misses);
        assert_eq!(adjusted.adjustment, -2.5);
        assert_eq!(adjusted.weight, Load::Kg(37.5));
    }

    #[test]
    fn test_weight_never_negative() {
        let ex = exercise(ExerciseType::Compound, Load::Kg(1.0), Reps::Count(8));
        let adjusted = adjust(&base_for(&ex), &ex, &[record(&[(1.0, 1)])]);
        assert_eq!(adjusted.weight, Load::Kg(0.0));
        assert!(adjusted.is_adjusted);
    }

    #[test]
    fn test_markers_bypass_adjustment() {
        let push_ups = exercise(ExerciseType::Bodyweight, Load::Bodyweight, Reps::ToFailure);
        let base = base_for(&push_ups);
        let adjusted = adjust(&base, &push_ups, &[record(&[(0.0, 3)])]);
        assert_eq!(adjusted, base);

        let twists = exercise(ExerciseType::Isolation, Load::Kg(10.0), Reps::Timed(30));
        let base = base_for(&twists);
        assert_eq!(adjust(&base, &twists, &[record(&[(10.0, 1)])]), base);
    }

    #[test]
    fn test_no_usable_sets_is_unadjusted() {
        let ex = bench();
        let base = base_for(&ex);
        let notes_only = PerformanceRecord {
            weights: vec![None, Some(40.0)],
            reps: vec![Some(8), None],
            notes: "swapped for machine".to_string(),
        };
        let adjusted = adjust(&base, &ex, &[notes_only]);
        assert_eq!(adjusted.weight, base.weight);
        assert!(!adjusted.is_adjusted);
    }

    #[test]
    fn test_malformed_weights_are_ignored() {
        let ex = bench();
        let adjusted = adjust(&base_for(&ex), &ex, &[record(&[(f64::NAN, 2), (-3.0, 2)])]);
        assert!(!adjusted.is_adjusted);
    }

    #[test]
    fn test_recent_history_window() {
        let mut store = MemoryStore::default();
        let today = date(2025, 10, 1);
        let logged = [
            (date(2025, 9, 1), 1),  // outside 28 days
            (date(2025, 9, 10), 2),
            (date(2025, 9, 15), 3),
            (date(2025, 9, 20), 4),
            (date(2025, 9, 25), 5),
            (date(2025, 10, 1), 6), // same day, excluded
        ];
        for (day, reps) in logged {
            store.put_performance(day, "Bench Press", &record(&[(40.0, reps)])).unwrap();
        }
        store
            .put_performance(date(2025, 9, 28), "Bench Press", &PerformanceRecord::default())
            .unwrap();
        store.put_performance(date(2025, 9, 26), "Lat Pulldown", &record(&[(40.0, 9)])).unwrap();

        let history = recent_history(&store, "Bench Press", today).unwrap();
        let reps: Vec<_> = history.iter().map(|r| r.reps[0]).collect();
        assert_eq!(reps, vec![Some(3), Some(4), Some(5)]);
    }
}
