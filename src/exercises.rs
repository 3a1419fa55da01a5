//! Exercise definitions - the built-in catalog and its value types

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Round a weight to the nearest 0.25 kg plate step
pub fn round_quarter(weight: f64) -> f64 {
    (weight * 4.0).round() / 4.0
}

/// Muscle groups the weekly split is built from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum MuscleGroup {
    Shoulders,
    Biceps,
    Triceps,
    Chest,
    Back,
    Legs,
    Core,
    Cardio,
}

impl MuscleGroup {
    pub fn label(&self) -> &'static str {
        match self {
            MuscleGroup::Shoulders => "SHOULDERS",
            MuscleGroup::Biceps => "BICEPS",
            MuscleGroup::Triceps => "TRICEPS",
            MuscleGroup::Chest => "CHEST",
            MuscleGroup::Back => "BACK",
            MuscleGroup::Legs => "LEGS",
            MuscleGroup::Core => "CORE",
            MuscleGroup::Cardio => "CARDIO",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Legs,
            MuscleGroup::Core,
            MuscleGroup::Cardio,
        ]
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Compound,
    Isolation,
    Bodyweight,
    Cardio,
}

impl ExerciseType {
    /// Weight added per completed 4-week month
    pub fn monthly_increment(&self) -> f64 {
        match self {
            ExerciseType::Compound => 5.0,
            ExerciseType::Isolation => 2.5,
            ExerciseType::Bodyweight | ExerciseType::Cardio => 0.0,
        }
    }

    /// Weight added in the overload week (cycle week 3)
    pub fn overload_step(&self) -> f64 {
        match self {
            ExerciseType::Compound => 2.5,
            ExerciseType::Isolation => 1.25,
            ExerciseType::Bodyweight | ExerciseType::Cardio => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseType::Compound => "compound",
            ExerciseType::Isolation => "isolation",
            ExerciseType::Bodyweight => "bodyweight",
            ExerciseType::Cardio => "cardio",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid load {0:?} (expected kilograms, \"BW\" or \"N/A\")")]
    Load(String),
    #[error("invalid reps {0:?} (expected a count, \"FAIL\" or a duration like \"30s\")")]
    Reps(String),
    #[error("invalid rest {0:?} (expected one of 0s, 30s, 60s, 90s, 2min, 3min, END)")]
    Rest(String),
}

/// Raw JSON shape of the numeric-or-marker catalog fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Marker {
    Number(f64),
    Text(String),
}

/// Parse "30s" / "20min" into seconds
fn parse_duration(s: &str) -> Option<u32> {
    if let Some(mins) = s.strip_suffix("min") {
        mins.trim().parse::<u32>().ok().map(|m| m * 60)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u32>().ok()
    } else {
        None
    }
}

/// Prescribed load: kilograms, or a marker that opts out of weight arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Marker", into = "Marker")]
pub enum Load {
    Kg(f64),
    Bodyweight,
    NotApplicable,
}

impl Load {
    pub fn kg(&self) -> Option<f64> {
        match self {
            Load::Kg(kg) => Some(*kg),
            Load::Bodyweight | Load::NotApplicable => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Load::Kg(_))
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Load::Kg(kg) => write!(f, "{}kg", kg),
            Load::Bodyweight => f.write_str("BW"),
            Load::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl FromStr for Load {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BW" => Ok(Load::Bodyweight),
            "N/A" => Ok(Load::NotApplicable),
            other => {
                let number = other.strip_suffix("kg").unwrap_or(other);
                match number.trim().parse::<f64>() {
                    Ok(kg) if kg.is_finite() && kg >= 0.0 => Ok(Load::Kg(kg)),
                    _ => Err(ParseError::Load(s.to_string())),
                }
            }
        }
    }
}

impl TryFrom<Marker> for Load {
    type Error = ParseError;

    fn try_from(marker: Marker) -> Result<Self, Self::Error> {
        match marker {
            Marker::Number(kg) if kg.is_finite() && kg >= 0.0 => Ok(Load::Kg(kg)),
            Marker::Number(kg) => Err(ParseError::Load(kg.to_string())),
            Marker::Text(text) => text.parse(),
        }
    }
}

impl From<Load> for Marker {
    fn from(load: Load) -> Self {
        match load {
            Load::Kg(kg) => Marker::Number(kg),
            other => Marker::Text(other.to_string()),
        }
    }
}

/// Prescribed repetitions: a count, to failure, or a timed hold/interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Marker", into = "Marker")]
pub enum Reps {
    Count(u32),
    ToFailure,
    Timed(u32),
}

impl Reps {
    pub fn count(&self) -> Option<u32> {
        match self {
            Reps::Count(n) => Some(*n),
            Reps::ToFailure | Reps::Timed(_) => None,
        }
    }
}

impl fmt::Display for Reps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reps::Count(n) => write!(f, "{}", n),
            Reps::ToFailure => f.write_str("FAIL"),
            Reps::Timed(secs) if *secs >= 60 && secs % 60 == 0 => write!(f, "{}min", secs / 60),
            Reps::Timed(secs) => write!(f, "{}s", secs),
        }
    }
}

impl FromStr for Reps {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "FAIL" {
            return Ok(Reps::ToFailure);
        }
        if let Ok(n) = trimmed.parse::<u32>() {
            return Ok(Reps::Count(n));
        }
        parse_duration(trimmed)
            .map(Reps::Timed)
            .ok_or_else(|| ParseError::Reps(s.to_string()))
    }
}

impl TryFrom<Marker> for Reps {
    type Error = ParseError;

    fn try_from(marker: Marker) -> Result<Self, Self::Error> {
        match marker {
            Marker::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
                Ok(Reps::Count(n as u32))
            }
            Marker::Number(n) => Err(ParseError::Reps(n.to_string())),
            Marker::Text(text) => text.parse(),
        }
    }
}

impl From<Reps> for Marker {
    fn from(reps: Reps) -> Self {
        match reps {
            Reps::Count(n) => Marker::Number(f64::from(n)),
            other => Marker::Text(other.to_string()),
        }
    }
}

/// Rest intervals the program uses, in seconds
const REST_TOKENS: &[u32] = &[0, 30, 60, 90, 120, 180];

/// Rest after a set; `End` marks the last exercise of a superset/finisher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rest {
    Seconds(u32),
    End,
}

impl Rest {
    /// Countdown length for the rest timer
    pub fn seconds(&self) -> u32 {
        match self {
            Rest::Seconds(secs) => *secs,
            Rest::End => 0,
        }
    }
}

impl fmt::Display for Rest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rest::End => f.write_str("END"),
            Rest::Seconds(secs) if *secs >= 120 && secs % 60 == 0 => write!(f, "{}min", secs / 60),
            Rest::Seconds(secs) => write!(f, "{}s", secs),
        }
    }
}

impl FromStr for Rest {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "END" {
            return Ok(Rest::End);
        }
        match parse_duration(trimmed) {
            Some(secs) if REST_TOKENS.contains(&secs) => Ok(Rest::Seconds(secs)),
            _ => Err(ParseError::Rest(s.to_string())),
        }
    }
}

impl TryFrom<String> for Rest {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rest> for String {
    fn from(rest: Rest) -> Self {
        rest.to_string()
    }
}

/// Exercise definition, immutable once the catalog is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub group: MuscleGroup,
    pub base_weight: Load,
    pub base_reps: Reps,
    pub base_sets: u32,
    pub tempo: String,
    pub rest: Rest,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    /// Small-muscle accessory work that earns an extra set from phase 2
    #[serde(default)]
    pub is_accessory: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate exercise name: {0}")]
    DuplicateName(String),
    #[error("{0}: base sets must be at least 1")]
    ZeroSets(String),
    #[error("{0}: only isolation exercises can be accessory movements")]
    AccessoryNotIsolation(String),
    #[error("schedule uses {0} but the catalog has no exercises in it")]
    EmptyGroup(MuscleGroup),
    #[error("schedule references unknown exercise: {0}")]
    UnknownExercise(String),
}

/// Built-in table row; converted into an owned `Exercise`
struct ExerciseDef {
    name: &'static str,
    group: MuscleGroup,
    base_weight: Load,
    base_reps: Reps,
    base_sets: u32,
    tempo: &'static str,
    rest: Rest,
    kind: ExerciseType,
    is_accessory: bool,
}

impl From<&ExerciseDef> for Exercise {
    fn from(def: &ExerciseDef) -> Self {
        Exercise {
            name: def.name.to_string(),
            group: def.group,
            base_weight: def.base_weight,
            base_reps: def.base_reps,
            base_sets: def.base_sets,
            tempo: def.tempo.to_string(),
            rest: def.rest,
            kind: def.kind,
            is_accessory: def.is_accessory,
        }
    }
}

/// The 12-month program's exercise table
const BUILTIN_EXERCISES: &[ExerciseDef] = &[
    // Shoulders
    ExerciseDef {
        name: "DB Lateral Raises",
        group: MuscleGroup::Shoulders,
        base_weight: Load::Kg(7.5),
        base_reps: Reps::Count(15),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Barbell Shoulder Press",
        group: MuscleGroup::Shoulders,
        base_weight: Load::Kg(40.0),
        base_reps: Reps::Count(8),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    // Biceps
    ExerciseDef {
        name: "Cable Hammer Curls",
        group: MuscleGroup::Biceps,
        base_weight: Load::Kg(20.0),
        base_reps: Reps::Count(12),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: true,
    },
    ExerciseDef {
        name: "Barbell Curls",
        group: MuscleGroup::Biceps,
        base_weight: Load::Kg(27.5),
        base_reps: Reps::Count(8),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "21s (Biceps)",
        group: MuscleGroup::Biceps,
        base_weight: Load::Kg(15.0),
        base_reps: Reps::Count(21),
        base_sets: 1,
        tempo: "7-7-7",
        rest: Rest::Seconds(90),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    // Triceps
    ExerciseDef {
        name: "Overhead Cable Extension",
        group: MuscleGroup::Triceps,
        base_weight: Load::Kg(25.0),
        base_reps: Reps::Count(12),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: true,
    },
    ExerciseDef {
        name: "Triceps Pressdown",
        group: MuscleGroup::Triceps,
        base_weight: Load::Kg(32.5),
        base_reps: Reps::Count(8),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Diamond Push-ups",
        group: MuscleGroup::Triceps,
        base_weight: Load::Bodyweight,
        base_reps: Reps::ToFailure,
        base_sets: 1,
        tempo: "2-2",
        rest: Rest::End,
        kind: ExerciseType::Bodyweight,
        is_accessory: false,
    },
    // Chest
    ExerciseDef {
        name: "Cable Flies",
        group: MuscleGroup::Chest,
        base_weight: Load::Kg(15.0),
        base_reps: Reps::Count(15),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Bench Press",
        group: MuscleGroup::Chest,
        base_weight: Load::Kg(55.0),
        base_reps: Reps::Count(8),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Incline DB Press",
        group: MuscleGroup::Chest,
        base_weight: Load::Kg(20.0),
        base_reps: Reps::Count(10),
        base_sets: 2,
        tempo: "4-4",
        rest: Rest::Seconds(90),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Dips",
        group: MuscleGroup::Chest,
        base_weight: Load::Bodyweight,
        base_reps: Reps::Count(10),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(90),
        kind: ExerciseType::Bodyweight,
        is_accessory: false,
    },
    // Back
    ExerciseDef {
        name: "Straight-Arm Pulldowns",
        group: MuscleGroup::Back,
        base_weight: Load::Kg(25.0),
        base_reps: Reps::Count(15),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Lat Pulldown",
        group: MuscleGroup::Back,
        base_weight: Load::Kg(42.5),
        base_reps: Reps::Count(8),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Bent-Over Row",
        group: MuscleGroup::Back,
        base_weight: Load::Kg(40.0),
        base_reps: Reps::Count(10),
        base_sets: 2,
        tempo: "4-4",
        rest: Rest::Seconds(90),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    // Legs
    ExerciseDef {
        name: "Leg Extensions",
        group: MuscleGroup::Legs,
        base_weight: Load::Kg(30.0),
        base_reps: Reps::Count(15),
        base_sets: 2,
        tempo: "3-3",
        rest: Rest::Seconds(30),
        kind: ExerciseType::Isolation,
        is_accessory: true,
    },
    ExerciseDef {
        name: "Leg Press",
        group: MuscleGroup::Legs,
        base_weight: Load::Kg(65.0),
        base_reps: Reps::Count(10),
        base_sets: 1,
        tempo: "5-5",
        rest: Rest::Seconds(180),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Lying Leg Curls",
        group: MuscleGroup::Legs,
        base_weight: Load::Kg(25.0),
        base_reps: Reps::Count(12),
        base_sets: 3,
        tempo: "3-3",
        rest: Rest::Seconds(90),
        kind: ExerciseType::Isolation,
        is_accessory: true,
    },
    ExerciseDef {
        name: "Romanian Deadlifts",
        group: MuscleGroup::Legs,
        base_weight: Load::Kg(50.0),
        base_reps: Reps::Count(10),
        base_sets: 2,
        tempo: "5-5",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Compound,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Standing Calf Raises",
        group: MuscleGroup::Legs,
        base_weight: Load::Kg(40.0),
        base_reps: Reps::Count(20),
        base_sets: 3,
        tempo: "2-2",
        rest: Rest::Seconds(60),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    // Core
    ExerciseDef {
        name: "Plank",
        group: MuscleGroup::Core,
        base_weight: Load::Bodyweight,
        base_reps: Reps::Timed(30),
        base_sets: 2,
        tempo: "HOLD",
        rest: Rest::Seconds(120),
        kind: ExerciseType::Bodyweight,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Russian Twists",
        group: MuscleGroup::Core,
        base_weight: Load::Kg(10.0),
        base_reps: Reps::Timed(30),
        base_sets: 2,
        tempo: "FAST",
        rest: Rest::Seconds(0),
        kind: ExerciseType::Isolation,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Leg Raises",
        group: MuscleGroup::Core,
        base_weight: Load::Bodyweight,
        base_reps: Reps::Timed(30),
        base_sets: 2,
        tempo: "SLOW",
        rest: Rest::Seconds(0),
        kind: ExerciseType::Bodyweight,
        is_accessory: false,
    },
    // Cardio finishers
    ExerciseDef {
        name: "Rowing Machine",
        group: MuscleGroup::Cardio,
        base_weight: Load::NotApplicable,
        base_reps: Reps::Timed(15 * 60),
        base_sets: 1,
        tempo: "HIIT",
        rest: Rest::End,
        kind: ExerciseType::Cardio,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Bike Intervals",
        group: MuscleGroup::Cardio,
        base_weight: Load::NotApplicable,
        base_reps: Reps::Timed(10 * 60),
        base_sets: 1,
        tempo: "HIIT",
        rest: Rest::End,
        kind: ExerciseType::Cardio,
        is_accessory: false,
    },
    ExerciseDef {
        name: "Incline Walk",
        group: MuscleGroup::Cardio,
        base_weight: Load::NotApplicable,
        base_reps: Reps::Timed(20 * 60),
        base_sets: 1,
        tempo: "STEADY",
        rest: Rest::End,
        kind: ExerciseType::Cardio,
        is_accessory: false,
    },
];

/// Exercises shown first in the progress view
pub const KEY_EXERCISES: &[&str] = &[
    "Barbell Curls",
    "Barbell Shoulder Press",
    "Bench Press",
    "Lat Pulldown",
    "Leg Press",
    "Triceps Pressdown",
];

/// Validated, immutable set of exercises; names are unique lookup keys
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    exercises: Vec<Exercise>,
}

impl Catalog {
    pub fn new(exercises: Vec<Exercise>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for exercise in &exercises {
            if !seen.insert(exercise.name.as_str()) {
                return Err(CatalogError::DuplicateName(exercise.name.clone()));
            }
            if exercise.base_sets == 0 {
                return Err(CatalogError::ZeroSets(exercise.name.clone()));
            }
            if exercise.is_accessory && exercise.kind != ExerciseType::Isolation {
                return Err(CatalogError::AccessoryNotIsolation(exercise.name.clone()));
            }
        }
        Ok(Self { exercises })
    }

    pub fn builtin() -> Self {
        Self {
            exercises: BUILTIN_EXERCISES.iter().map(Exercise::from).collect(),
        }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Exact name lookup
    pub fn get(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Lookup for user input: exact, then case-insensitive, then unique substring
    pub fn find(&self, query: &str) -> Option<&Exercise> {
        if let Some(exercise) = self.get(query) {
            return Some(exercise);
        }
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(exercise) = self.exercises.iter().find(|e| e.name.to_lowercase() == needle) {
            return Some(exercise);
        }
        let mut matches = self
            .exercises
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle));
        match (matches.next(), matches.next()) {
            (Some(exercise), None) => Some(exercise),
            _ => None,
        }
    }

    /// Exercises of one group in catalog order
    pub fn in_group(&self, group: MuscleGroup) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.group == group)
    }

    pub fn has_group(&self, group: MuscleGroup) -> bool {
        self.exercises.iter().any(|e| e.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn exercise(name: &str, kind: ExerciseType) -> Exercise {
        Exercise {
            name: name.to_string(),
            group: MuscleGroup::Biceps,
            base_weight: Load::Kg(20.0),
            base_reps: Reps::Count(10),
            base_sets: 2,
            tempo: "3-3".to_string(),
            rest: Rest::Seconds(30),
            kind,
            is_accessory: false,
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = Catalog::builtin();
        let validated = Catalog::new(builtin.exercises().to_vec()).unwrap();
        assert_eq!(validated, builtin);
        assert_eq!(builtin.exercises().len(), 26);
    }

    #[test]
    fn test_builtin_accessories_are_isolation() {
        let catalog = Catalog::builtin();
        let accessories: Vec<_> = catalog
            .exercises()
            .iter()
            .filter(|e| e.is_accessory)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(
            accessories,
            ["Cable Hammer Curls", "Overhead Cable Extension", "Leg Extensions", "Lying Leg Curls"]
        );
    }

    #[test]
    fn test_key_exercises_exist() {
        let catalog = Catalog::builtin();
        for name in KEY_EXERCISES {
            assert!(catalog.get(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = Catalog::new(vec![
            exercise("Curl", ExerciseType::Isolation),
            exercise("Curl", ExerciseType::Compound),
        ]);
        assert_eq!(result, Err(CatalogError::DuplicateName("Curl".to_string())));
    }

    #[test]
    fn test_zero_sets_rejected() {
        let mut ex = exercise("Curl", ExerciseType::Isolation);
        ex.base_sets = 0;
        assert_eq!(Catalog::new(vec![ex]), Err(CatalogError::ZeroSets("Curl".to_string())));
    }

    #[test]
    fn test_accessory_must_be_isolation() {
        let mut ex = exercise("Press", ExerciseType::Compound);
        ex.is_accessory = true;
        assert_eq!(
            Catalog::new(vec![ex]),
            Err(CatalogError::AccessoryNotIsolation("Press".to_string()))
        );
    }

    #[test]
    fn test_find_case_insensitive_and_substring() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find("bench press").unwrap().name, "Bench Press");
        assert_eq!(catalog.find("hammer").unwrap().name, "Cable Hammer Curls");
        // "curl" matches several exercises
        assert!(catalog.find("curl").is_none());
        assert!(catalog.find("").is_none());
    }

    #[rstest]
    #[case("30s", Rest::Seconds(30))]
    #[case("60s", Rest::Seconds(60))]
    #[case("90s", Rest::Seconds(90))]
    #[case("2min", Rest::Seconds(120))]
    #[case("3min", Rest::Seconds(180))]
    #[case("0s", Rest::Seconds(0))]
    #[case("END", Rest::End)]
    fn test_rest_tokens(#[case] token: &str, #[case] expected: Rest) {
        let rest: Rest = token.parse().unwrap();
        assert_eq!(rest, expected);
        assert_eq!(rest.to_string(), token);
    }

    #[test]
    fn test_rest_outside_closed_set() {
        assert_eq!("45s".parse::<Rest>(), Err(ParseError::Rest("45s".to_string())));
        assert!("soon".parse::<Rest>().is_err());
        assert_eq!(Rest::End.seconds(), 0);
    }

    #[test]
    fn test_load_and_reps_markers() {
        assert_eq!("BW".parse::<Load>(), Ok(Load::Bodyweight));
        assert_eq!("N/A".parse::<Load>(), Ok(Load::NotApplicable));
        assert_eq!("42.5".parse::<Load>(), Ok(Load::Kg(42.5)));
        assert!("-5".parse::<Load>().is_err());
        assert_eq!(Load::Kg(42.5).to_string(), "42.5kg");
        assert_eq!(Load::Kg(40.0).to_string(), "40kg");

        assert_eq!("FAIL".parse::<Reps>(), Ok(Reps::ToFailure));
        assert_eq!("30s".parse::<Reps>(), Ok(Reps::Timed(30)));
        assert_eq!("20min".parse::<Reps>(), Ok(Reps::Timed(1200)));
        assert_eq!("8".parse::<Reps>(), Ok(Reps::Count(8)));
        assert_eq!(Reps::Timed(1200).to_string(), "20min");
    }

    #[test]
    fn test_exercise_json_shape() {
        let json = r#"{
            "name": "Plank",
            "group": "CORE",
            "base_weight": "BW",
            "base_reps": "30s",
            "base_sets": 2,
            "tempo": "HOLD",
            "rest": "2min",
            "type": "bodyweight"
        }"#;
        let plank: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(plank.base_weight, Load::Bodyweight);
        assert_eq!(plank.base_reps, Reps::Timed(30));
        assert_eq!(plank.rest, Rest::Seconds(120));
        assert!(!plank.is_accessory);

        let value = serde_json::to_value(&plank).unwrap();
        assert_eq!(value["base_weight"], "BW");
        assert_eq!(value["rest"], "2min");
    }

    #[test]
    fn test_round_quarter() {
        assert_eq!(round_quarter(34.0), 34.0);
        assert_eq!(round_quarter(6.8), 6.75);
        assert_eq!(round_quarter(12.126), 12.25);
    }
}
