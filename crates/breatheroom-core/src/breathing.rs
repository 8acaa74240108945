//! Breathing narrator.
//!
//! A breathing cycle is four equal phases: in, hold, out, hold. The narrator
//! never schedules anything. The active phase is computed from the number of
//! unpaused seconds since the cycle origin, and the controller asks for it
//! after every tick.

use serde::{Deserialize, Serialize};

use crate::audio::AudioCue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathPhase {
    Inhale,
    /// Hold with full lungs.
    HoldFull,
    Exhale,
    /// Hold with empty lungs.
    HoldEmpty,
}

impl BreathPhase {
    pub const CYCLE: [BreathPhase; 4] = [
        BreathPhase::Inhale,
        BreathPhase::HoldFull,
        BreathPhase::Exhale,
        BreathPhase::HoldEmpty,
    ];

    /// Narration shown while this phase is active.
    pub fn narration(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breathe In...",
            BreathPhase::HoldFull | BreathPhase::HoldEmpty => "Hold...",
            BreathPhase::Exhale => "Breathe Out...",
        }
    }

    /// Audio cue played on entering this phase. Holds are silent.
    pub fn cue(&self) -> Option<AudioCue> {
        match self {
            BreathPhase::Inhale => Some(AudioCue::BreatheIn),
            BreathPhase::Exhale => Some(AudioCue::BreatheOut),
            BreathPhase::HoldFull | BreathPhase::HoldEmpty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathingPattern {
    /// Length of each of the four phases in seconds.
    pub phase_secs: u32,
}

impl BreathingPattern {
    pub fn new(phase_secs: u32) -> Self {
        Self {
            phase_secs: phase_secs.max(1),
        }
    }

    pub fn cycle_secs(&self) -> u32 {
        self.phase_secs.saturating_mul(BreathPhase::CYCLE.len() as u32)
    }

    /// Phase active `secs_into_cycle` seconds after a cycle origin.
    /// Values past the cycle length wrap into the next cycle.
    pub fn phase_at(&self, secs_into_cycle: u32) -> BreathPhase {
        let within = secs_into_cycle % self.cycle_secs();
        BreathPhase::CYCLE[(within / self.phase_secs) as usize]
    }
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Tracks the current cycle origin and the last phase announced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathNarrator {
    pattern: BreathingPattern,
    /// Unpaused session second at which the current cycle began.
    origin_secs: u32,
    current: Option<BreathPhase>,
}

impl BreathNarrator {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            origin_secs: 0,
            current: None,
        }
    }

    pub fn pattern(&self) -> BreathingPattern {
        self.pattern
    }

    pub fn current(&self) -> Option<BreathPhase> {
        self.current
    }

    /// Start a fresh cycle at `elapsed_secs` and return its first phase.
    pub fn begin_cycle(&mut self, elapsed_secs: u32) -> BreathPhase {
        self.origin_secs = elapsed_secs;
        self.current = Some(BreathPhase::Inhale);
        BreathPhase::Inhale
    }

    /// Recompute the phase for `elapsed_secs`.
    ///
    /// Returns the new phase when it differs from the last one announced.
    /// Does nothing while no cycle is active.
    pub fn advance(&mut self, elapsed_secs: u32) -> Option<BreathPhase> {
        let current = self.current?;
        let into = elapsed_secs.saturating_sub(self.origin_secs);
        let phase = self.pattern.phase_at(into);
        if phase == current {
            return None;
        }
        tracing::debug!(?phase, into, "breathing phase changed");
        self.current = Some(phase);
        Some(phase)
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.origin_secs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cycle_is_sixteen_seconds() {
        assert_eq!(BreathingPattern::default().cycle_secs(), 16);
    }

    #[test]
    fn phase_boundaries() {
        let p = BreathingPattern::default();
        assert_eq!(p.phase_at(0), BreathPhase::Inhale);
        assert_eq!(p.phase_at(3), BreathPhase::Inhale);
        assert_eq!(p.phase_at(4), BreathPhase::HoldFull);
        assert_eq!(p.phase_at(8), BreathPhase::Exhale);
        assert_eq!(p.phase_at(12), BreathPhase::HoldEmpty);
        assert_eq!(p.phase_at(15), BreathPhase::HoldEmpty);
        assert_eq!(p.phase_at(16), BreathPhase::Inhale);
        assert_eq!(p.phase_at(36), BreathPhase::HoldFull);
    }

    #[test]
    fn one_cycle_sequence_four_seconds_each() {
        let mut narrator = BreathNarrator::new(BreathingPattern::default());
        let mut seen = vec![(0, narrator.begin_cycle(0))];
        for sec in 1..16 {
            if let Some(phase) = narrator.advance(sec) {
                seen.push((sec, phase));
            }
        }
        assert_eq!(
            seen,
            vec![
                (0, BreathPhase::Inhale),
                (4, BreathPhase::HoldFull),
                (8, BreathPhase::Exhale),
                (12, BreathPhase::HoldEmpty),
            ]
        );
        let labels: Vec<_> = seen.iter().map(|(_, p)| p.narration()).collect();
        assert_eq!(labels, ["Breathe In...", "Hold...", "Breathe Out...", "Hold..."]);
    }

    #[test]
    fn cues_only_on_breathing_phases() {
        assert_eq!(BreathPhase::Inhale.cue(), Some(AudioCue::BreatheIn));
        assert_eq!(BreathPhase::Exhale.cue(), Some(AudioCue::BreatheOut));
        assert_eq!(BreathPhase::HoldFull.cue(), None);
        assert_eq!(BreathPhase::HoldEmpty.cue(), None);
    }

    #[test]
    fn cycle_origin_offsets_phase() {
        let mut narrator = BreathNarrator::new(BreathingPattern::default());
        narrator.begin_cycle(10);
        assert_eq!(narrator.advance(13), None);
        assert_eq!(narrator.advance(14), Some(BreathPhase::HoldFull));
    }

    #[test]
    fn inactive_narrator_stays_silent() {
        let mut narrator = BreathNarrator::new(BreathingPattern::default());
        assert_eq!(narrator.advance(4), None);
        narrator.begin_cycle(0);
        narrator.clear();
        assert_eq!(narrator.advance(8), None);
        assert_eq!(narrator.current(), None);
    }
}
