//! Rest countdown between sets, advanced by an external 1 s tick

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestTimer {
    remaining: u32,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the countdown; zero seconds leaves the timer stopped
    pub fn start(&mut self, secs: u32) {
        self.remaining = secs;
    }

    /// Advance one second. Returns true when this tick finished the countdown.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.remaining > 0
    }
}

/// "m:ss"
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_countdown_stops_at_zero() {
        let mut timer = RestTimer::new();
        timer.start(2);
        assert!(timer.is_running());
        assert!(!timer.tick());
        assert_eq!(timer.remaining(), 1);
        assert!(timer.tick());
        assert!(!timer.is_running());
        assert!(!timer.tick());
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_zero_start_is_noop() {
        let mut timer = RestTimer::new();
        timer.start(0);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_restart_and_cancel() {
        let mut timer = RestTimer::new();
        timer.start(90);
        timer.tick();
        timer.start(120);
        assert_eq!(timer.remaining(), 120);
        timer.cancel();
        assert!(!timer.is_running());
    }

    #[rstest]
    #[case(0, "0:00")]
    #[case(59, "0:59")]
    #[case(90, "1:30")]
    #[case(180, "3:00")]
    fn test_format_clock(#[case] secs: u32, #[case] expected: &str) {
        assert_eq!(format_clock(secs), expected);
    }
}
