use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audio::AudioCue;
use crate::breathing::BreathPhase;
use crate::session::SessionStatus;
use crate::stats::{SessionStats, StreakChange};

/// Every state change in the system produces an Event.
/// Hosts render them; the audio deck and stats bookkeeping consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        length_secs: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: Uuid,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: Uuid,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    /// One second counted down.
    Tick {
        time_left_secs: u32,
        timer_text: String,
        progress_percent: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        phase: BreathPhase,
        narration: String,
        at: DateTime<Utc>,
    },
    AudioCue {
        cue: AudioCue,
        at: DateTime<Utc>,
    },
    /// Stop every channel and rewind it.
    AudioStopped {
        at: DateTime<Utc>,
    },
    QuoteShown {
        quote: String,
        fade_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero.
    SessionCompleted {
        session_id: Uuid,
        minutes: u32,
        at: DateTime<Utc>,
    },
    /// Session ended early by the user.
    SessionStopped {
        session_id: Uuid,
        minutes: u32,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    StatsUpdated {
        stats: SessionStats,
        streak: StreakChange,
        at: DateTime<Utc>,
    },
    GalleryRevealed {
        visible_ratio: f64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionStatus,
        time_left_secs: u32,
        timer_text: String,
        progress_percent: u32,
        narration: String,
        phase: Option<BreathPhase>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Minutes credited when this event ends a session.
    pub fn finished_minutes(&self) -> Option<u32> {
        match self {
            Event::SessionCompleted { minutes, .. } | Event::SessionStopped { minutes, .. } => {
                Some(*minutes)
            }
            _ => None,
        }
    }
}
