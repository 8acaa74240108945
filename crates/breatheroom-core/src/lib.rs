//! # Breatheroom Core Library
//!
//! This library provides the core business logic for the Breatheroom guided
//! breathing timer. Like the CLI, any graphical host is meant to be a thin
//! layer over the same core: it forwards button presses and a one-second
//! timer to the controller and renders the events that come back.
//!
//! ## Architecture
//!
//! - **Session Controller**: an explicit, serializable state machine for the
//!   countdown, breathing narration and quotes. The caller invokes `tick()`
//!   once per elapsed second.
//! - **Breathing Narrator**: phases are derived from elapsed unpaused time,
//!   so a pause can never leave a stale phase transition behind.
//! - **Stats**: streak and total bookkeeping, persisted as JSON under the
//!   `meditationStats` key of a local key-value store.
//! - **Storage**: SQLite-backed key-value store and TOML configuration.
//!
//! ## Key Components
//!
//! - [`SessionController`]: countdown / breathing state machine
//! - [`Meditation`]: controller plus stats persistence
//! - [`SessionStats`]: persisted statistics record
//! - [`Database`]: local key-value store
//! - [`Config`]: application configuration management

pub mod audio;
pub mod breathing;
pub mod countdown;
pub mod error;
pub mod events;
pub mod meditation;
pub mod quotes;
pub mod scene;
pub mod session;
pub mod stats;
pub mod storage;

pub use audio::{AudioCue, AudioDeck, CuePlayer, SilentPlayer};
pub use breathing::{BreathNarrator, BreathPhase, BreathingPattern};
pub use countdown::Countdown;
pub use error::{AudioError, ConfigError, CoreError, DatabaseError, SessionError};
pub use events::Event;
pub use meditation::{CompletionSummary, Meditation};
pub use scene::{Particle, ParticleField, RevealObserver};
pub use session::{now_ms, DisplayModel, SessionController, SessionSettings, SessionState, SessionStatus};
pub use stats::{SessionStats, StreakChange};
pub use storage::{Config, Database, LocalStore, MemoryStore};
