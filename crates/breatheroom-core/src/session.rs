//! Session controller.
//!
//! A tick-driven state machine. It does not use internal threads or timers;
//! the host calls `tick()` once per elapsed second (or `catch_up()` with the
//! current wall clock) and renders the returned events.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running <-> Paused -> Stopped
//! ```
//!
//! Breathing phases are derived from elapsed unpaused seconds, so pausing
//! freezes both the countdown and the narration without anything to cancel.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionController::new(SessionSettings::default());
//! session.start()?;
//! // Once per second:
//! for event in session.tick() { render(&event); }
//! ```

use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::breathing::{BreathNarrator, BreathPhase, BreathingPattern};
use crate::countdown::Countdown;
use crate::error::SessionError;
use crate::events::Event;
use crate::quotes;

pub const IDLE_NARRATION: &str = "Click Start to begin";
pub const PAUSED_NARRATION: &str = "Meditation Paused";
pub const COMPLETE_NARRATION: &str = "Meditation Complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Stopped => "stopped",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Tunables for one controller, usually built from [`crate::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub length_secs: u32,
    pub phase_secs: u32,
    pub quote_every_secs: u32,
    pub quote_fade_ms: u64,
}

impl SessionSettings {
    /// Minutes credited to the stats for one session.
    pub fn credited_minutes(&self) -> u32 {
        self.length_secs / 60
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            length_secs: 300,
            phase_secs: 4,
            quote_every_secs: 5,
            quote_fade_ms: 1000,
        }
    }
}

/// Plain view of the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub running: bool,
    pub paused: bool,
    pub time_left_secs: u32,
}

/// Everything a host needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayModel {
    pub button_label: String,
    pub stop_enabled: bool,
    pub timer_text: String,
    pub narration: String,
    pub progress_percent: u32,
    pub quote: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionController {
    settings: SessionSettings,
    status: SessionStatus,
    countdown: Countdown,
    narrator: BreathNarrator,
    session_id: Option<Uuid>,
    narration: String,
    #[serde(default)]
    quote: Option<String>,
    /// Wall-clock time (ms since epoch) of the last counted second.
    /// Only set while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

impl SessionController {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            status: SessionStatus::Stopped,
            countdown: Countdown::new(settings.length_secs),
            narrator: BreathNarrator::new(BreathingPattern::new(settings.phase_secs)),
            session_id: None,
            narration: IDLE_NARRATION.to_string(),
            quote: None,
            last_tick_epoch_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status != SessionStatus::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn time_left_secs(&self) -> u32 {
        self.countdown.time_left_secs()
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn phase(&self) -> Option<BreathPhase> {
        self.narrator.current()
    }

    pub fn quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }

    pub fn last_tick_epoch_ms(&self) -> Option<u64> {
        self.last_tick_epoch_ms
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            running: self.is_running(),
            paused: self.is_paused(),
            time_left_secs: self.time_left_secs(),
        }
    }

    pub fn display(&self) -> DisplayModel {
        let button_label = match self.status {
            SessionStatus::Stopped => "Start Meditation",
            SessionStatus::Running => "Pause Meditation",
            SessionStatus::Paused => "Resume Meditation",
        };
        DisplayModel {
            button_label: button_label.to_string(),
            stop_enabled: self.is_running(),
            timer_text: self.countdown.clock_text(),
            narration: self.narration.clone(),
            progress_percent: self.countdown.percent(),
            quote: self.quote.clone(),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.status,
            time_left_secs: self.time_left_secs(),
            timer_text: self.countdown.clock_text(),
            progress_percent: self.countdown.percent(),
            narration: self.narration.clone(),
            phase: self.phase(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Vec<Event>, SessionError> {
        if self.status != SessionStatus::Stopped {
            return Err(self.reject("start"));
        }
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.status = SessionStatus::Running;
        self.last_tick_epoch_ms = Some(now_ms());
        tracing::info!(%session_id, length_secs = self.countdown.length_secs(), "session started");

        let mut events = vec![Event::SessionStarted {
            session_id,
            length_secs: self.countdown.length_secs(),
            at: Utc::now(),
        }];
        self.begin_breathing(&mut events);
        Ok(events)
    }

    pub fn pause(&mut self) -> Result<Vec<Event>, SessionError> {
        if self.status != SessionStatus::Running {
            return Err(self.reject("pause"));
        }
        self.status = SessionStatus::Paused;
        self.last_tick_epoch_ms = None;
        self.narration = PAUSED_NARRATION.to_string();
        let session_id = self.current_id();
        tracing::info!(%session_id, time_left_secs = self.time_left_secs(), "session paused");

        Ok(vec![
            Event::SessionPaused {
                session_id,
                time_left_secs: self.time_left_secs(),
                at: Utc::now(),
            },
            Event::AudioStopped { at: Utc::now() },
        ])
    }

    pub fn resume(&mut self) -> Result<Vec<Event>, SessionError> {
        if self.status != SessionStatus::Paused {
            return Err(self.reject("resume"));
        }
        self.status = SessionStatus::Running;
        self.last_tick_epoch_ms = Some(now_ms());
        let session_id = self.current_id();
        tracing::info!(%session_id, time_left_secs = self.time_left_secs(), "session resumed");

        let mut events = vec![Event::SessionResumed {
            session_id,
            time_left_secs: self.time_left_secs(),
            at: Utc::now(),
        }];
        self.begin_breathing(&mut events);
        Ok(events)
    }

    /// The single start/pause/resume button.
    pub fn toggle(&mut self) -> Result<Vec<Event>, SessionError> {
        match self.status {
            SessionStatus::Stopped => self.start(),
            SessionStatus::Running => self.pause(),
            SessionStatus::Paused => self.resume(),
        }
    }

    /// End the session early. The session still counts toward stats.
    pub fn stop(&mut self) -> Result<Vec<Event>, SessionError> {
        if self.status == SessionStatus::Stopped {
            return Err(self.reject("stop"));
        }
        let session_id = self.current_id();
        let time_left_secs = self.time_left_secs();
        tracing::info!(%session_id, time_left_secs, "session stopped");

        self.reset(IDLE_NARRATION);
        Ok(vec![
            Event::AudioStopped { at: Utc::now() },
            Event::SessionStopped {
                session_id,
                minutes: self.settings.credited_minutes(),
                time_left_secs,
                at: Utc::now(),
            },
        ])
    }

    /// Count one second using the thread-local RNG for quotes.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_with(&mut rand::thread_rng())
    }

    /// Count one second. Does nothing unless running and unpaused.
    pub fn tick_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Event> {
        if self.status != SessionStatus::Running {
            return Vec::new();
        }
        if let Some(last) = self.last_tick_epoch_ms.as_mut() {
            *last = last.saturating_add(1000);
        }

        let time_left_secs = self.countdown.tick();
        let mut events = vec![Event::Tick {
            time_left_secs,
            timer_text: self.countdown.clock_text(),
            progress_percent: self.countdown.percent(),
            at: Utc::now(),
        }];

        if quotes::is_quote_second(time_left_secs, self.settings.quote_every_secs) {
            let quote = quotes::pick(rng).to_string();
            self.quote = Some(quote.clone());
            events.push(Event::QuoteShown {
                quote,
                fade_ms: self.settings.quote_fade_ms,
                at: Utc::now(),
            });
        }

        if self.countdown.is_finished() {
            let session_id = self.current_id();
            tracing::info!(%session_id, "session complete");
            self.reset(COMPLETE_NARRATION);
            events.push(Event::AudioStopped { at: Utc::now() });
            events.push(Event::SessionCompleted {
                session_id,
                minutes: self.settings.credited_minutes(),
                at: Utc::now(),
            });
            return events;
        }

        if let Some(phase) = self.narrator.advance(self.countdown.elapsed_secs()) {
            self.announce(phase, &mut events);
        }
        events
    }

    /// Apply every whole second elapsed between the last counted second and
    /// `now_epoch_ms`. Lets a persisted controller continue after a restart.
    pub fn catch_up(&mut self, now_epoch_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        while self.status == SessionStatus::Running {
            let Some(last) = self.last_tick_epoch_ms else {
                break;
            };
            if now_epoch_ms.saturating_sub(last) < 1000 {
                break;
            }
            events.extend(self.tick());
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_breathing(&mut self, events: &mut Vec<Event>) {
        let phase = self.narrator.begin_cycle(self.countdown.elapsed_secs());
        self.announce(phase, events);
    }

    fn announce(&mut self, phase: BreathPhase, events: &mut Vec<Event>) {
        self.narration = phase.narration().to_string();
        events.push(Event::PhaseChanged {
            phase,
            narration: self.narration.clone(),
            at: Utc::now(),
        });
        if let Some(cue) = phase.cue() {
            events.push(Event::AudioCue { cue, at: Utc::now() });
        }
    }

    fn reset(&mut self, narration: &str) {
        self.status = SessionStatus::Stopped;
        self.countdown.reset();
        self.narrator.clear();
        self.session_id = None;
        self.last_tick_epoch_ms = None;
        self.narration = narration.to_string();
    }

    fn current_id(&self) -> Uuid {
        self.session_id.unwrap_or_else(Uuid::nil)
    }

    fn reject(&self, command: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            command,
            status: self.status,
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
