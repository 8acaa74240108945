use std::io::Write;
use std::time::Duration;

use breatheroom_core::{
    now_ms, AudioCue, AudioDeck, AudioError, CompletionSummary, Config, CuePlayer, Database,
    DisplayModel, Event, Meditation, SessionController, SessionStatus, SilentPlayer,
};
use chrono::Local;
use clap::Subcommand;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a session in the foreground (p = pause/resume, s = stop, Ctrl-C = stop)
    Run {
        /// Print events as JSON lines instead of text
        #[arg(long)]
        json: bool,
        /// Disable the terminal bell cues
        #[arg(long)]
        no_sound: bool,
    },
    /// Start a new session
    Start,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Start, pause or resume depending on the current state
    Toggle,
    /// Stop the session early (still counts toward stats)
    Stop,
    /// Print current session state as JSON
    Status,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    snapshot: Event,
    display: DisplayModel,
    events: &'a [Event],
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<CompletionSummary>,
}

/// Rings the terminal bell for every cue.
struct BellPlayer;

impl CuePlayer for BellPlayer {
    fn play(&mut self, cue: AudioCue, clip: &str) -> Result<(), AudioError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")?;
        err.flush()?;
        tracing::debug!(?cue, clip, "bell cue");
        Ok(())
    }
}

fn build_deck(config: &Config, no_sound: bool) -> AudioDeck {
    let player: Box<dyn CuePlayer> = if no_sound {
        Box::new(SilentPlayer)
    } else {
        Box::new(BellPlayer)
    };
    AudioDeck::new(player)
        .with_clips(
            config.audio.breathe_in_clip.clone(),
            config.audio.breathe_out_clip.clone(),
        )
        .with_enabled(config.audio.enabled && !no_sound)
}

fn open_meditation(config: &Config) -> Result<Meditation<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    // Only a session in progress keeps the settings it started with.
    let controller = db
        .load_controller()
        .filter(|c| c.status() != SessionStatus::Stopped)
        .unwrap_or_else(|| SessionController::new(config.settings()));
    Ok(Meditation::with_controller(db, controller))
}

fn save(meditation: &Meditation<Database>) -> Result<(), Box<dyn std::error::Error>> {
    meditation.store().save_controller(meditation.controller())?;
    Ok(())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    if let SessionAction::Run { json, no_sound } = action {
        return run_foreground(&config, json, no_sound);
    }

    let mut meditation = open_meditation(&config)?;
    let mut events = meditation.catch_up(now_ms());
    save(&meditation)?;

    let outcome = match action {
        SessionAction::Start => meditation.start(),
        SessionAction::Pause => meditation.pause(),
        SessionAction::Resume => meditation.resume(),
        SessionAction::Toggle => meditation.toggle(),
        SessionAction::Stop => meditation.stop(),
        SessionAction::Status | SessionAction::Run { .. } => Ok(Vec::new()),
    };
    events.extend(outcome?);
    save(&meditation)?;

    let report = StatusReport {
        snapshot: meditation.controller().snapshot(),
        display: meditation.controller().display(),
        events: &events,
        summary: meditation.take_summary(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_foreground(
    config: &Config,
    json: bool,
    no_sound: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut meditation = open_meditation(config)?;
    let mut deck = build_deck(config, no_sound);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(drive(&mut meditation, &mut deck, json));
    save(&meditation)?;
    result?;

    if let Some(summary) = meditation.take_summary() {
        print_summary(&summary, json)?;
    }
    Ok(())
}

async fn drive(
    meditation: &mut Meditation<Database>,
    deck: &mut AudioDeck,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let caught_up = meditation.catch_up(now_ms());
    emit(&caught_up, deck, json)?;

    let opening = match meditation.controller().status() {
        SessionStatus::Stopped => meditation.start()?,
        SessionStatus::Paused => meditation.resume()?,
        SessionStatus::Running => vec![meditation.controller().snapshot()],
    };
    emit(&opening, deck, json)?;
    if !json {
        println!("p + Enter: pause/resume   s + Enter: stop   Ctrl-C: stop");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                deck.advance(1000);
                let events = meditation.tick();
                emit(&events, deck, json)?;
                if events.iter().any(|e| e.finished_minutes().is_some()) {
                    return Ok(());
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    None => stdin_open = false,
                    Some("p") | Some("") => {
                        let events = meditation.toggle()?;
                        if meditation.controller().status() == SessionStatus::Running {
                            ticker.reset();
                        }
                        emit(&events, deck, json)?;
                    }
                    Some("s") | Some("q") => {
                        let events = meditation.stop()?;
                        emit(&events, deck, json)?;
                        return Ok(());
                    }
                    Some(other) => eprintln!("unknown input '{other}' (p = pause/resume, s = stop)"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let events = meditation.stop()?;
                emit(&events, deck, json)?;
                return Ok(());
            }
        }
    }
}

fn emit(events: &[Event], deck: &mut AudioDeck, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        deck.apply(event);
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else if let Some(line) = describe(event) {
            println!("[{}] {line}", Local::now().format("%H:%M:%S"));
        }
    }
    Ok(())
}

/// Human-readable line for an event, if it deserves one.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::SessionStarted { length_secs, .. } => Some(format!(
            "Meditation started ({}:{:02})",
            length_secs / 60,
            length_secs % 60
        )),
        Event::SessionPaused { .. } => Some("Meditation Paused".to_string()),
        Event::SessionResumed { .. } => Some("Resuming...".to_string()),
        Event::Tick {
            timer_text,
            progress_percent,
            ..
        } => Some(format!("{timer_text}  {progress_percent:>3}%")),
        Event::PhaseChanged { narration, .. } => Some(narration.clone()),
        Event::QuoteShown { quote, .. } => Some(format!("\"{quote}\"")),
        Event::SessionCompleted { .. } => Some("Meditation Complete".to_string()),
        Event::SessionStopped { .. } => Some("Meditation stopped".to_string()),
        Event::StateSnapshot {
            state, timer_text, ..
        } => Some(format!("Session {state} at {timer_text}")),
        _ => None,
    }
}

fn print_summary(summary: &CompletionSummary, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
        return Ok(());
    }
    let stats = &summary.stats;
    println!();
    println!("{}", summary.title);
    println!("{}", summary.headline);
    println!("{}", summary.message);
    println!(
        "Sessions: {}   Minutes: {}   Streak: {} (best {})",
        stats.total_sessions, stats.total_minutes, stats.current_streak, stats.longest_streak
    );
    Ok(())
}
