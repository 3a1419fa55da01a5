//! Weekly split - which muscle groups are trained on which weekday

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::exercises::{Catalog, CatalogError, MuscleGroup};

/// Cardio finisher appended to a training day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardioSession {
    /// Catalog name of the cardio exercise
    pub exercise: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub groups: Vec<MuscleGroup>,
    #[serde(default)]
    pub cardio: Option<CardioSession>,
}

/// Weekday -> ordered muscle groups; a missing or empty day is a rest day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    days: HashMap<Weekday, ScheduleDay>,
}

fn day(groups: &[MuscleGroup], cardio: &str, protocol: &str) -> ScheduleDay {
    ScheduleDay {
        groups: groups.to_vec(),
        cardio: Some(CardioSession {
            exercise: cardio.to_string(),
            protocol: protocol.to_string(),
        }),
    }
}

impl Schedule {
    pub fn new(days: HashMap<Weekday, ScheduleDay>) -> Self {
        Self { days }
    }

    /// Six-day push/pull/legs style split with Sunday off
    pub fn builtin() -> Self {
        use MuscleGroup::*;

        let chest_back = [Chest, Back];
        let arms = [Shoulders, Biceps, Triceps];
        let legs_core = [Legs, Core];

        let rowing = ("Rowing Machine", "1 min hard / 2 min moderate");
        let bike = ("Bike Intervals", "30 sec sprint / 90 sec easy");
        let walk = ("Incline Walk", "5% grade, 4.5 km/h");

        let days = HashMap::from([
            (Weekday::Mon, day(&chest_back, rowing.0, rowing.1)),
            (Weekday::Tue, day(&arms, bike.0, bike.1)),
            (Weekday::Wed, day(&legs_core, walk.0, walk.1)),
            (Weekday::Thu, day(&chest_back, rowing.0, rowing.1)),
            (Weekday::Fri, day(&arms, bike.0, bike.1)),
            (Weekday::Sat, day(&legs_core, walk.0, walk.1)),
        ]);
        Self { days }
    }

    pub fn day(&self, weekday: Weekday) -> Option<&ScheduleDay> {
        self.days.get(&weekday).filter(|d| !d.groups.is_empty())
    }

    pub fn is_rest_day(&self, weekday: Weekday) -> bool {
        self.day(weekday).is_none()
    }

    /// Number of training days in one week
    pub fn training_days(&self) -> usize {
        self.days.values().filter(|d| !d.groups.is_empty()).count()
    }

    /// Check every referenced group and cardio exercise exists in the catalog
    pub fn validate(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        for day in self.days.values() {
            if let Some(group) = day.groups.iter().find(|g| !catalog.has_group(**g)) {
                return Err(CatalogError::EmptyGroup(*group));
            }
            if let Some(cardio) = &day.cardio
                && catalog.get(&cardio.exercise).is_none()
            {
                return Err(CatalogError::UnknownExercise(cardio.exercise.clone()));
            }
        }
        Ok(())
    }
}
