//! Periodization engine
//!
//! - Program clock (week, cycle week, phase)
//! - Calendar progression of weight/reps/sets
//! - Auto-regulation from recently logged performance
//! - Day resolution through the weekly schedule

pub mod adjuster;
pub mod clock;
pub mod progression;

pub use adjuster::{adjust, recent_history};
pub use clock::{Phase, ProgramClock, ProgramPosition};
pub use progression::{Prescription, compute_base_prescription};

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::warn;

use crate::db::PerformanceStore;
use crate::exercises::{Catalog, CatalogError, Exercise, MuscleGroup};
use crate::schedule::Schedule;

/// Catalog, schedule and clock, built once at startup and passed around
#[derive(Debug, Clone)]
pub struct Program {
    catalog: Catalog,
    schedule: Schedule,
    clock: ProgramClock,
}

/// Exercises the schedule assigns to a date
#[derive(Debug, Clone)]
pub struct Workout<'a> {
    pub weekday: Weekday,
    pub groups: Vec<MuscleGroup>,
    pub exercises: Vec<&'a Exercise>,
    pub cardio: Option<(&'a Exercise, &'a str)>,
}

impl Workout<'_> {
    pub fn is_rest_day(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn is_cardio_day(&self) -> bool {
        self.cardio.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardioPlan {
    pub prescription: Prescription,
    pub protocol: String,
}

/// Everything needed to show one day of training
#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub position: ProgramPosition,
    pub groups: Vec<MuscleGroup>,
    pub exercises: Vec<Prescription>,
    pub cardio: Option<CardioPlan>,
}

impl DayPlan {
    pub fn is_rest_day(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn is_cardio_day(&self) -> bool {
        self.cardio.is_some()
    }

    /// "CHEST & BACK", or "REST DAY"
    pub fn label(&self) -> String {
        if self.is_rest_day() {
            return "REST DAY".to_string();
        }
        self.groups
            .iter()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(" & ")
    }

    pub fn prescription(&self, exercise: &str) -> Option<&Prescription> {
        self.exercises
            .iter()
            .chain(self.cardio.as_ref().map(|c| &c.prescription))
            .find(|p| p.exercise == exercise)
    }
}

impl Program {
    pub fn new(
        catalog: Catalog,
        schedule: Schedule,
        clock: ProgramClock,
    ) -> Result<Self, CatalogError> {
        schedule.validate(&catalog)?;
        Ok(Self { catalog, schedule, clock })
    }

    pub fn builtin(start: NaiveDate) -> Self {
        Self {
            catalog: Catalog::builtin(),
            schedule: Schedule::builtin(),
            clock: ProgramClock::new(start),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn clock(&self) -> &ProgramClock {
        &self.clock
    }

    /// Resolve the schedule for a date; rest days carry no exercises and no cardio
    pub fn workout_for(&self, date: NaiveDate) -> Workout<'_> {
        let weekday = date.weekday();
        let Some(day) = self.schedule.day(weekday) else {
            return Workout {
                weekday,
                groups: Vec::new(),
                exercises: Vec::new(),
                cardio: None,
            };
        };

        let exercises = day
            .groups
            .iter()
            .flat_map(|group| self.catalog.in_group(*group))
            .collect();
        let cardio = day.cardio.as_ref().and_then(|session| {
            self.catalog
                .get(&session.exercise)
                .map(|exercise| (exercise, session.protocol.as_str()))
        });

        Workout {
            weekday,
            groups: day.groups.clone(),
            exercises,
            cardio,
        }
    }

    /// Base prescription plus auto-regulation from the store's history.
    /// A failing store degrades to the unadjusted prescription.
    pub fn prescribe<S>(&self, exercise: &Exercise, date: NaiveDate, store: &S) -> Prescription
    where
        S: PerformanceStore + ?Sized,
    {
        let base = compute_base_prescription(exercise, &self.clock, date);
        match recent_history(store, &exercise.name, date) {
            Ok(history) => adjust(&base, exercise, &history),
            Err(e) => {
                warn!(
                    exercise = %exercise.name,
                    %date,
                    "history unavailable, using base prescription: {}", e
                );
                base
            }
        }
    }

    pub fn plan_day<S>(&self, date: NaiveDate, store: &S) -> DayPlan
    where
        S: PerformanceStore + ?Sized,
    {
        let workout = self.workout_for(date);
        let exercises = workout
            .exercises
            .iter()
            .map(|exercise| self.prescribe(exercise, date, store))
            .collect();
        let cardio = workout.cardio.map(|(exercise, protocol)| CardioPlan {
            prescription: self.prescribe(exercise, date, store),
            protocol: protocol.to_string(),
        });

        DayPlan {
            date,
            position: self.clock.position(date),
            groups: workout.groups,
            exercises,
            cardio,
        }
    }
}
