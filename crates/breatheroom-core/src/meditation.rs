//! Controller plus stats bookkeeping.
//!
//! [`Meditation`] forwards commands to a [`SessionController`] and, whenever
//! a session finishes (completed or stopped), records it in the stats,
//! persists them and keeps a [`CompletionSummary`] for the host to show.

use chrono::{Local, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::events::Event;
use crate::session::{SessionController, SessionSettings};
use crate::stats::SessionStats;
use crate::storage::LocalStore;

/// Shown after every finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub title: String,
    pub headline: String,
    pub message: String,
    pub stats: SessionStats,
}

impl CompletionSummary {
    pub fn new(minutes: u32, stats: SessionStats) -> Self {
        Self {
            title: "Session Complete!".to_string(),
            headline: format!("{minutes} Minutes of Mindfulness"),
            message: "You've taken a wonderful step towards inner peace".to_string(),
            stats,
        }
    }
}

type TodayFn = Box<dyn Fn() -> NaiveDate>;

pub struct Meditation<S: LocalStore> {
    controller: SessionController,
    stats: SessionStats,
    store: S,
    today: TodayFn,
    summary: Option<CompletionSummary>,
}

impl<S: LocalStore> Meditation<S> {
    /// Fresh controller, stats loaded from `store`.
    pub fn load(store: S, settings: SessionSettings) -> Self {
        Self::with_controller(store, SessionController::new(settings))
    }

    /// Continue with an existing controller, stats loaded from `store`.
    pub fn with_controller(store: S, controller: SessionController) -> Self {
        let stats = SessionStats::load(&store);
        Self {
            controller,
            stats,
            store,
            today: Box::new(|| Local::now().date_naive()),
            summary: None,
        }
    }

    /// Override the calendar used for streaks.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Summary of the most recently finished session, if not yet taken.
    pub fn take_summary(&mut self) -> Option<CompletionSummary> {
        self.summary.take()
    }

    pub fn into_parts(self) -> (SessionController, SessionStats, S) {
        (self.controller, self.stats, self.store)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Vec<Event>, SessionError> {
        self.controller.start()
    }

    pub fn pause(&mut self) -> Result<Vec<Event>, SessionError> {
        self.controller.pause()
    }

    pub fn resume(&mut self) -> Result<Vec<Event>, SessionError> {
        self.controller.resume()
    }

    pub fn toggle(&mut self) -> Result<Vec<Event>, SessionError> {
        self.controller.toggle()
    }

    pub fn stop(&mut self) -> Result<Vec<Event>, SessionError> {
        let events = self.controller.stop()?;
        Ok(self.settle(events))
    }

    pub fn tick(&mut self) -> Vec<Event> {
        let events = self.controller.tick();
        self.settle(events)
    }

    pub fn tick_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Event> {
        let events = self.controller.tick_with(rng);
        self.settle(events)
    }

    pub fn catch_up(&mut self, now_epoch_ms: u64) -> Vec<Event> {
        let events = self.controller.catch_up(now_epoch_ms);
        self.settle(events)
    }

    /// Record finished sessions found in `events` and append `StatsUpdated`.
    fn settle(&mut self, mut events: Vec<Event>) -> Vec<Event> {
        let finished: Vec<u32> = events.iter().filter_map(Event::finished_minutes).collect();
        for minutes in finished {
            let streak = self.stats.record_session((self.today)(), minutes);
            if let Err(e) = self.stats.save(&self.store) {
                tracing::warn!(error = %e, "could not persist stats");
            }
            self.summary = Some(CompletionSummary::new(minutes, self.stats.clone()));
            events.push(Event::StatsUpdated {
                stats: self.stats.clone(),
                streak,
                at: Utc::now(),
            });
        }
        events
    }
}
