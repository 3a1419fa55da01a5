//! Calendar-driven progression: base prescription for an exercise on a date

use chrono::NaiveDate;
use serde::Serialize;

use super::clock::{Phase, ProgramClock};
use crate::exercises::{Exercise, ExerciseType, Load, MuscleGroup, Reps, Rest, round_quarter};

/// Deload week keeps 80% of the cycle's baseline weight
pub const DELOAD_FACTOR: f64 = 0.8;

/// What to lift for one exercise on one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prescription {
    pub exercise: String,
    pub group: MuscleGroup,
    pub weight: Load,
    pub reps: Reps,
    pub sets: u32,
    pub tempo: String,
    pub rest: Rest,
    pub phase: Phase,
    pub week: u32,
    pub week_in_cycle: u32,
    /// Weight delta applied from recent performance (kg)
    pub adjustment: f64,
    pub is_adjusted: bool,
}

impl Prescription {
    /// Whether the phase-based extra set is in effect
    pub fn has_bonus_set(&self, exercise: &Exercise) -> bool {
        self.sets > exercise.base_sets
    }

    /// weight x reps x sets, when both weight and reps are numeric
    pub fn volume(&self) -> Option<f64> {
        let weight = self.weight.kg()?;
        let reps = self.reps.count()?;
        Some(weight * f64::from(reps) * f64::from(self.sets))
    }
}

fn earns_bonus_set(exercise: &Exercise, phase: Phase) -> bool {
    phase >= Phase::Intensity && exercise.kind == ExerciseType::Isolation && exercise.is_accessory
}

/// Base prescription before any auto-regulation.
///
/// Numeric weight gets the monthly increment, then the cycle week decides:
/// week 2 adds a rep, week 3 adds the overload step, week 4 deloads the
/// baseline to 80% with reps at base. Marker loads and reps pass through.
pub fn compute_base_prescription(
    exercise: &Exercise,
    clock: &ProgramClock,
    date: NaiveDate,
) -> Prescription {
    let pos = clock.position(date);

    let weight = match exercise.base_weight {
        Load::Kg(base) => {
            let monthly = f64::from(pos.months_passed()) * exercise.kind.monthly_increment();
            let baseline = round_quarter(base + monthly);
            let kg = match pos.week_in_cycle {
                3 => baseline + exercise.kind.overload_step(),
                4 => baseline * DELOAD_FACTOR,
                _ => baseline,
            };
            Load::Kg(round_quarter(kg))
        }
        marker => marker,
    };

    let reps = match exercise.base_reps {
        Reps::Count(n) if pos.week_in_cycle == 2 => Reps::Count(n + 1),
        other => other,
    };

    let mut sets = exercise.base_sets;
    if earns_bonus_set(exercise, pos.phase) {
        sets += 1;
    }

    Prescription {
        exercise: exercise.name.clone(),
        group: exercise.group,
        weight,
        reps,
        sets,
        tempo: exercise.tempo.clone(),
        rest: exercise.rest,
        phase: pos.phase,
        week: pos.week,
        week_in_cycle: pos.week_in_cycle,
        adjustment: 0.0,
        is_adjusted: false,
    }
}
