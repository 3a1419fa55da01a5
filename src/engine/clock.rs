//! Program calendar: week number, 4-week cycle position and training phase

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Length of the periodized program
pub const PROGRAM_WEEKS: u32 = 52;

/// Weeks per phase block
pub const PHASE_WEEKS: u32 = 13;

/// Weeks per baseline / +rep / +weight / deload cycle
pub const CYCLE_WEEKS: u32 = 4;

/// Training emphasis of a 13-week block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Adaptation,
    Intensity,
    ArmSpecialization,
    Peak,
}

impl Phase {
    /// Weeks past the program end stay in the last phase
    pub fn for_week(week: u32) -> Self {
        match (week.max(1) - 1) / PHASE_WEEKS {
            0 => Phase::Adaptation,
            1 => Phase::Intensity,
            2 => Phase::ArmSpecialization,
            _ => Phase::Peak,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Phase::Adaptation => 1,
            Phase::Intensity => 2,
            Phase::ArmSpecialization => 3,
            Phase::Peak => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Adaptation => "Adaptation & Volume Build",
            Phase::Intensity => "Intensity Escalation",
            Phase::ArmSpecialization => "Arm Specialization",
            Phase::Peak => "Peak & Refine",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.number(), self.name())
    }
}

/// Where a date falls in the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramPosition {
    /// 1-indexed program week
    pub week: u32,
    /// 1..=4
    pub week_in_cycle: u32,
    pub phase: Phase,
}

impl ProgramPosition {
    pub fn for_week(week: u32) -> Self {
        let week = week.max(1);
        Self {
            week,
            week_in_cycle: (week - 1) % CYCLE_WEEKS + 1,
            phase: Phase::for_week(week),
        }
    }

    /// Completed 4-week months; all weeks of one cycle share the same value
    pub fn months_passed(&self) -> u32 {
        (self.week - 1) / CYCLE_WEEKS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramClock {
    start: NaiveDate,
}

impl ProgramClock {
    pub fn new(start: NaiveDate) -> Self {
        Self { start }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Program week of `date`; dates before the start count as week 1
    pub fn week(&self, date: NaiveDate) -> u32 {
        let days = (date - self.start).num_days();
        if days < 0 {
            return 1;
        }
        u32::try_from(days / 7).map_or(u32::MAX, |w| w.saturating_add(1))
    }

    pub fn position(&self, date: NaiveDate) -> ProgramPosition {
        ProgramPosition::for_week(self.week(date))
    }

    /// First calendar day of a program week
    pub fn week_start(&self, week: u32) -> NaiveDate {
        let offset = u64::from(week.max(1) - 1) * 7;
        self.start
            .checked_add_days(Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> ProgramClock {
        ProgramClock::new(date(2025, 8, 19))
    }

    #[rstest]
    #[case(date(2025, 8, 19), 1, 1)]
    #[case(date(2025, 8, 25), 1, 1)]
    #[case(date(2025, 8, 26), 2, 2)]
    #[case(date(2025, 9, 2), 3, 3)]
    #[case(date(2025, 9, 9), 4, 4)]
    #[case(date(2025, 9, 16), 5, 1)]
    fn test_week_and_cycle(#[case] day: NaiveDate, #[case] week: u32, #[case] cycle: u32) {
        let pos = clock().position(day);
        assert_eq!(pos.week, week);
        assert_eq!(pos.week_in_cycle, cycle);
    }

    #[test]
    fn test_before_start_is_week_one() {
        let pos = clock().position(date(2025, 8, 1));
        assert_eq!(pos.week, 1);
        assert_eq!(pos.week_in_cycle, 1);
        assert_eq!(pos.phase, Phase::Adaptation);
    }

    #[rstest]
    #[case(1, Phase::Adaptation)]
    #[case(13, Phase::Adaptation)]
    #[case(14, Phase::Intensity)]
    #[case(26, Phase::Intensity)]
    #[case(27, Phase::ArmSpecialization)]
    #[case(40, Phase::Peak)]
    #[case(52, Phase::Peak)]
    #[case(80, Phase::Peak)]
    fn test_phase_boundaries(#[case] week: u32, #[case] phase: Phase) {
        assert_eq!(Phase::for_week(week), phase);
    }

    #[test]
    fn test_months_passed_shared_within_cycle() {
        let months: Vec<u32> = (1..=9)
            .map(|w| ProgramPosition::for_week(w).months_passed())
            .collect();
        assert_eq!(months, vec![0, 0, 0, 0, 1, 1, 1, 1, 2]);
    }

    #[test]
    fn test_week_start_round_trips() {
        let clock = clock();
        assert_eq!(clock.week_start(1), date(2025, 8, 19));
        assert_eq!(clock.week_start(3), date(2025, 9, 2));
        for week in [1, 7, 52] {
            assert_eq!(clock.week(clock.week_start(week)), week);
        }
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Intensity.to_string(), "Phase 2: Intensity Escalation");
    }
}
