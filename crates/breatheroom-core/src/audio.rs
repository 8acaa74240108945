//! Breathing audio cues.
//!
//! The session controller only emits [`Event::AudioCue`] and
//! [`Event::AudioStopped`]. Hosts feed those events to an [`AudioDeck`],
//! which keeps one channel per cue and hands playback to a [`CuePlayer`]
//! backend. Playback failures are logged and swallowed.

use serde::{Deserialize, Serialize};

use crate::error::AudioError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    BreatheIn,
    BreatheOut,
}

impl AudioCue {
    pub fn default_clip(&self) -> &'static str {
        match self {
            AudioCue::BreatheIn => "breathe-in-87397.mp3",
            AudioCue::BreatheOut => "breath-out-242642.mp3",
        }
    }
}

/// Playback backend supplied by the host.
pub trait CuePlayer {
    /// Start playing `clip` for `cue` from its current position.
    fn play(&mut self, cue: AudioCue, clip: &str) -> Result<(), AudioError>;

    /// Halt playback of `cue`.
    fn stop(&mut self, _cue: AudioCue) {}
}

/// Backend that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self, _cue: AudioCue, _clip: &str) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Playback state of one clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub clip: String,
    pub playing: bool,
    pub position_ms: u64,
    /// Clip length when known; playback ends on its own after this.
    pub duration_ms: Option<u64>,
}

impl Channel {
    fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            playing: false,
            position_ms: 0,
            duration_ms: None,
        }
    }
}

/// Two independent cue channels driven by session events.
pub struct AudioDeck {
    inhale: Channel,
    exhale: Channel,
    enabled: bool,
    player: Box<dyn CuePlayer>,
}

impl AudioDeck {
    pub fn new(player: Box<dyn CuePlayer>) -> Self {
        Self {
            inhale: Channel::new(AudioCue::BreatheIn.default_clip()),
            exhale: Channel::new(AudioCue::BreatheOut.default_clip()),
            enabled: true,
            player,
        }
    }

    pub fn with_clips(mut self, inhale: impl Into<String>, exhale: impl Into<String>) -> Self {
        self.inhale.clip = inhale.into();
        self.exhale.clip = exhale.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn channel(&self, cue: AudioCue) -> &Channel {
        match cue {
            AudioCue::BreatheIn => &self.inhale,
            AudioCue::BreatheOut => &self.exhale,
        }
    }

    fn channel_mut(&mut self, cue: AudioCue) -> &mut Channel {
        match cue {
            AudioCue::BreatheIn => &mut self.inhale,
            AudioCue::BreatheOut => &mut self.exhale,
        }
    }

    /// React to a session event. Non-audio events are ignored.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::AudioCue { cue, .. } => self.play(*cue),
            Event::AudioStopped { .. } => self.stop_all(),
            _ => {}
        }
    }

    /// Fire-and-forget playback of `cue`.
    ///
    /// A channel with a known clip length that is still playing keeps going.
    /// Without a known length the deck cannot tell when the clip ended, so
    /// every cue rewinds and re-triggers it.
    pub fn play(&mut self, cue: AudioCue) {
        if !self.enabled {
            return;
        }
        let channel = self.channel(cue);
        if channel.playing && channel.duration_ms.is_some() {
            return;
        }
        let clip = channel.clip.clone();
        let result = if clip.trim().is_empty() {
            Err(AudioError::Unplayable(format!("{cue:?} has no clip")))
        } else {
            self.player.play(cue, &clip)
        };
        match result {
            Ok(()) => {
                let channel = self.channel_mut(cue);
                let ended = channel.duration_ms.is_some_and(|d| channel.position_ms >= d);
                if ended || channel.duration_ms.is_none() {
                    channel.position_ms = 0;
                }
                channel.playing = true;
            }
            Err(e) => tracing::warn!(?cue, error = %e, "audio cue failed"),
        }
    }

    /// Stop both channels and rewind them to the start.
    pub fn stop_all(&mut self) {
        for cue in [AudioCue::BreatheIn, AudioCue::BreatheOut] {
            if self.channel(cue).playing {
                self.player.stop(cue);
            }
            let channel = self.channel_mut(cue);
            channel.playing = false;
            channel.position_ms = 0;
        }
    }

    /// Move playing channels forward by `elapsed_ms`.
    pub fn advance(&mut self, elapsed_ms: u64) {
        for channel in [&mut self.inhale, &mut self.exhale] {
            if !channel.playing {
                continue;
            }
            channel.position_ms = channel.position_ms.saturating_add(elapsed_ms);
            if let Some(duration) = channel.duration_ms {
                if channel.position_ms >= duration {
                    channel.playing = false;
                    channel.position_ms = duration;
                }
            }
        }
    }

    pub fn set_duration(&mut self, cue: AudioCue, duration_ms: u64) {
        self.channel_mut(cue).duration_ms = Some(duration_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        played: Vec<(AudioCue, String)>,
        stopped: Vec<AudioCue>,
    }

    struct RecordingPlayer {
        log: Rc<RefCell<Log>>,
        fail: bool,
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&mut self, cue: AudioCue, clip: &str) -> Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::DeviceUnavailable("blocked".into()));
            }
            self.log.borrow_mut().played.push((cue, clip.to_string()));
            Ok(())
        }

        fn stop(&mut self, cue: AudioCue) {
            self.log.borrow_mut().stopped.push(cue);
        }
    }

    fn deck(fail: bool) -> (AudioDeck, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let player = RecordingPlayer {
            log: Rc::clone(&log),
            fail,
        };
        (AudioDeck::new(Box::new(player)), log)
    }

    #[test]
    fn cue_event_plays_matching_clip() {
        let (mut deck, log) = deck(false);
        deck.apply(&Event::AudioCue {
            cue: AudioCue::BreatheOut,
            at: Utc::now(),
        });
        assert!(deck.channel(AudioCue::BreatheOut).playing);
        assert!(!deck.channel(AudioCue::BreatheIn).playing);
        assert_eq!(
            log.borrow().played,
            vec![(AudioCue::BreatheOut, "breath-out-242642.mp3".to_string())]
        );
    }

    #[test]
    fn stop_rewinds_both_channels() {
        let (mut deck, log) = deck(false);
        deck.play(AudioCue::BreatheIn);
        deck.play(AudioCue::BreatheOut);
        deck.advance(1500);
        assert_eq!(deck.channel(AudioCue::BreatheIn).position_ms, 1500);

        deck.apply(&Event::AudioStopped { at: Utc::now() });
        for cue in [AudioCue::BreatheIn, AudioCue::BreatheOut] {
            assert!(!deck.channel(cue).playing);
            assert_eq!(deck.channel(cue).position_ms, 0);
        }
        assert_eq!(log.borrow().stopped.len(), 2);
    }

    #[test]
    fn failed_playback_is_swallowed() {
        let (mut deck, _log) = deck(true);
        deck.play(AudioCue::BreatheIn);
        assert!(!deck.channel(AudioCue::BreatheIn).playing);
    }

    #[test]
    fn disabled_deck_plays_nothing() {
        let (deck, log) = deck(false);
        let mut deck = deck.with_enabled(false);
        deck.play(AudioCue::BreatheIn);
        assert!(log.borrow().played.is_empty());
    }

    #[test]
    fn empty_clip_is_not_played() {
        let (deck, log) = deck(false);
        let mut deck = deck.with_clips("", "breath-out.mp3");
        deck.play(AudioCue::BreatheIn);
        assert!(log.borrow().played.is_empty());
        assert!(!deck.channel(AudioCue::BreatheIn).playing);
    }

    #[test]
    fn known_length_clip_is_not_restarted_while_playing() {
        let (mut deck, log) = deck(false);
        deck.set_duration(AudioCue::BreatheIn, 3000);
        deck.play(AudioCue::BreatheIn);
        deck.advance(1000);
        deck.play(AudioCue::BreatheIn);
        assert_eq!(log.borrow().played.len(), 1);
        assert_eq!(deck.channel(AudioCue::BreatheIn).position_ms, 1000);
    }

    #[test]
    fn every_cycle_of_a_session_plays_its_cues() {
        use crate::session::{SessionController, SessionSettings};
        use rand::SeedableRng;

        let (mut deck, log) = deck(false);
        let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
        let mut session = SessionController::new(SessionSettings::default());
        let mut cues = Vec::new();

        let mut feed = |deck: &mut AudioDeck, events: Vec<Event>| {
            for event in &events {
                if let Event::AudioCue { cue, .. } = event {
                    cues.push(*cue);
                }
                deck.apply(event);
            }
        };

        feed(&mut deck, session.start().unwrap());
        for _ in 0..64 {
            deck.advance(1000);
            feed(&mut deck, session.tick_with(&mut rng));
        }

        // Four full cycles plus the opening Breathe In of the fifth.
        assert_eq!(cues.len(), 9);
        let played: Vec<AudioCue> = log.borrow().played.iter().map(|(cue, _)| *cue).collect();
        assert_eq!(played, cues);
    }

    #[test]
    fn clip_ends_after_duration() {
        let (mut deck, _log) = deck(false);
        deck.set_duration(AudioCue::BreatheIn, 3000);
        deck.play(AudioCue::BreatheIn);
        deck.advance(2000);
        assert!(deck.channel(AudioCue::BreatheIn).playing);
        deck.advance(2000);
        assert!(!deck.channel(AudioCue::BreatheIn).playing);
        assert_eq!(deck.channel(AudioCue::BreatheIn).position_ms, 3000);
    }
}
