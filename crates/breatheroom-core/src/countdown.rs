//! Session countdown and progress math.

use serde::{Deserialize, Serialize};

/// Whole-second countdown for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    length_secs: u32,
    time_left_secs: u32,
}

impl Countdown {
    pub fn new(length_secs: u32) -> Self {
        let length_secs = length_secs.max(1);
        Self {
            length_secs,
            time_left_secs: length_secs,
        }
    }

    pub fn length_secs(&self) -> u32 {
        self.length_secs
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    /// Seconds counted down so far.
    pub fn elapsed_secs(&self) -> u32 {
        self.length_secs - self.time_left_secs
    }

    pub fn is_finished(&self) -> bool {
        self.time_left_secs == 0
    }

    /// Count down one second. Returns the new remaining time.
    pub fn tick(&mut self) -> u32 {
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.time_left_secs
    }

    pub fn reset(&mut self) {
        self.time_left_secs = self.length_secs;
    }

    /// 0.0 .. 1.0 elapsed fraction.
    pub fn fraction(&self) -> f64 {
        self.elapsed_secs() as f64 / self.length_secs as f64
    }

    /// Elapsed percentage, rounded to the nearest whole percent.
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }

    /// Remaining time as `M:SS`.
    pub fn clock_text(&self) -> String {
        format_clock(self.time_left_secs)
    }
}

/// Format seconds as `M:SS` (minutes unpadded).
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_full() {
        let c = Countdown::new(300);
        assert_eq!(c.time_left_secs(), 300);
        assert_eq!(c.percent(), 0);
        assert_eq!(c.clock_text(), "5:00");
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(284), "4:44");
        assert_eq!(format_clock(61), "1:01");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn tick_saturates_at_zero() {
        let mut c = Countdown::new(2);
        assert_eq!(c.tick(), 1);
        assert_eq!(c.tick(), 0);
        assert!(c.is_finished());
        assert_eq!(c.tick(), 0);
        assert_eq!(c.percent(), 100);
    }

    #[test]
    fn reset_restores_length() {
        let mut c = Countdown::new(300);
        for _ in 0..42 {
            c.tick();
        }
        assert_eq!(c.elapsed_secs(), 42);
        c.reset();
        assert_eq!(c.time_left_secs(), 300);
    }

    proptest! {
        #[test]
        fn percent_matches_rounded_fraction(t in 0u32..=300) {
            let mut c = Countdown::new(300);
            for _ in 0..(300 - t) {
                c.tick();
            }
            let expected = ((300 - t) as f64 / 300.0 * 100.0).round() as u32;
            prop_assert_eq!(c.time_left_secs(), t);
            prop_assert_eq!(c.percent(), expected);
        }
    }
}
