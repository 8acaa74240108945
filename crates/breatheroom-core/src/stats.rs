//! Session statistics: totals and day streaks.
//!
//! The record is stored as JSON under [`STATS_KEY`] with camelCase field
//! names. Missing fields fall back to zero/null, and a record that cannot be
//! read or parsed at all is treated as "no history".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::LocalStore;

/// Storage key of the persisted record.
pub const STATS_KEY: &str = "meditationStats";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    pub total_sessions: u32,
    pub total_minutes: u32,
    pub longest_streak: u32,
    pub current_streak: u32,
    /// Calendar day of the last completed or stopped session.
    pub last_session: Option<NaiveDate>,
}

/// How a recorded session affected the current streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First session ever recorded.
    Started,
    /// Session on the day after the previous one.
    Extended,
    /// Another session on the same day.
    Unchanged,
    /// Gap of two or more days.
    Broken,
}

impl SessionStats {
    /// Account for one finished session on `today`.
    pub fn record_session(&mut self, today: NaiveDate, minutes: u32) -> StreakChange {
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.total_minutes = self.total_minutes.saturating_add(minutes);

        let change = match self.last_session {
            None => {
                self.current_streak = 1;
                StreakChange::Started
            }
            Some(last) => match day_gap(last, today) {
                0 => StreakChange::Unchanged,
                1 => {
                    self.current_streak = self.current_streak.saturating_add(1);
                    StreakChange::Extended
                }
                _ => {
                    self.current_streak = 1;
                    StreakChange::Broken
                }
            },
        };

        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_session = Some(today);
        change
    }

    /// Restore `longest_streak >= current_streak` on records edited by hand.
    pub fn normalized(mut self) -> Self {
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self
    }

    /// Load from `store`, degrading to an empty record on any failure.
    pub fn load<S: LocalStore + ?Sized>(store: &S) -> Self {
        let raw = match store.get_item(STATS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stats, starting fresh");
                return Self::default();
            }
        };
        match serde_json::from_str::<SessionStats>(&raw) {
            Ok(stats) => stats.normalized(),
            Err(e) => {
                tracing::warn!(error = %e, "stored stats are malformed, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save<S: LocalStore + ?Sized>(&self, store: &S) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set_item(STATS_KEY, &json)?;
        tracing::info!(
            total_sessions = self.total_sessions,
            current_streak = self.current_streak,
            "stats saved"
        );
        Ok(())
    }
}

/// Absolute number of calendar days between two dates.
pub fn day_gap(a: NaiveDate, b: NaiveDate) -> u64 {
    (b - a).num_days().unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn with_streak(last: &str, current: u32, longest: u32) -> SessionStats {
        SessionStats {
            total_sessions: 10,
            total_minutes: 50,
            longest_streak: longest,
            current_streak: current,
            last_session: Some(day(last)),
        }
    }

    #[test]
    fn first_session_starts_streak() {
        let mut stats = SessionStats::default();
        let change = stats.record_session(day("2024-03-01"), 5);
        assert_eq!(change, StreakChange::Started);
        assert_eq!(
            stats,
            SessionStats {
                total_sessions: 1,
                total_minutes: 5,
                longest_streak: 1,
                current_streak: 1,
                last_session: Some(day("2024-03-01")),
            }
        );
    }

    #[test]
    fn next_day_extends_streak() {
        let mut stats = with_streak("2024-03-01", 3, 3);
        assert_eq!(stats.record_session(day("2024-03-02"), 5), StreakChange::Extended);
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.longest_streak, 4);
    }

    #[test]
    fn same_day_keeps_streak() {
        let mut stats = with_streak("2024-03-01", 3, 7);
        assert_eq!(stats.record_session(day("2024-03-01"), 5), StreakChange::Unchanged);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 7);
        assert_eq!(stats.total_sessions, 11);
        assert_eq!(stats.total_minutes, 55);
    }

    #[test]
    fn gap_breaks_streak_but_keeps_longest() {
        let mut stats = with_streak("2024-03-01", 6, 6);
        assert_eq!(stats.record_session(day("2024-03-03"), 5), StreakChange::Broken);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 6);
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let mut stats = with_streak("2024-02-29", 2, 2);
        stats.record_session(day("2024-03-01"), 5);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn json_uses_storage_field_names() {
        let stats = with_streak("2024-03-01", 2, 4);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalSessions": 10,
                "totalMinutes": 50,
                "longestStreak": 4,
                "currentStreak": 2,
                "lastSession": "2024-03-01",
            })
        );
    }

    #[test]
    fn missing_and_unknown_fields_default() {
        let stats: SessionStats =
            serde_json::from_str(r#"{"totalSessions": 3, "theme": "dark"}"#).unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_minutes, 0);
        assert_eq!(stats.last_session, None);
    }

    #[test]
    fn load_degrades_on_garbage() {
        let store = MemoryStore::new();
        store.set_item(STATS_KEY, "{not json").unwrap();
        assert_eq!(SessionStats::load(&store), SessionStats::default());
    }

    #[test]
    fn load_repairs_longest_streak() {
        let store = MemoryStore::new();
        store
            .set_item(STATS_KEY, r#"{"currentStreak": 5, "longestStreak": 2}"#)
            .unwrap();
        assert_eq!(SessionStats::load(&store).longest_streak, 5);
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new();
        let mut stats = SessionStats::default();
        stats.record_session(day("2024-03-01"), 5);
        stats.save(&store).unwrap();
        assert_eq!(SessionStats::load(&store), stats);
    }

    proptest! {
        #[test]
        fn streak_rules_hold(k in 1u32..500, extra in 0u32..500, gap in 0i64..60) {
            let last = day("2024-01-01");
            let mut stats = SessionStats {
                total_sessions: 1,
                total_minutes: 5,
                longest_streak: k + extra,
                current_streak: k,
                last_session: Some(last),
            };
            stats.record_session(last + chrono::Duration::days(gap), 5);

            let expected = match gap {
                0 => k,
                1 => k + 1,
                _ => 1,
            };
            prop_assert_eq!(stats.current_streak, expected);
            prop_assert_eq!(stats.longest_streak, (k + extra).max(expected));
            prop_assert!(stats.longest_streak >= stats.current_streak);
            prop_assert_eq!(stats.total_sessions, 2);
            prop_assert_eq!(stats.total_minutes, 10);
        }
    }
}
