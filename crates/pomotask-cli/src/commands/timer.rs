use std::io::Write;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use pomotask_core::storage::{Database, SessionStore};
use pomotask_core::timer::format_clock;
use pomotask_core::{Config, PhaseRequest, SessionMode, SystemClock, TimerEngine, TimerState};
use tracing::warn;

use super::{print_json, session_store, CliResult};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a phase (in auto mode, the next phase of the sequence)
    Start {
        /// work, short-break, long-break or custom (normal mode only)
        #[arg(long)]
        mode: Option<SessionMode>,
        /// Phase length in minutes (normal mode only)
        #[arg(long, conflicts_with = "seconds")]
        minutes: Option<u32>,
        /// Phase length in seconds (normal mode only)
        #[arg(long)]
        seconds: Option<u64>,
        /// Tag for the session; defaults to `tags.default`
        #[arg(long)]
        tag: Option<String>,
        /// Free-text note stored with the session
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Pause the running phase
    Pause,
    /// Resume a paused phase
    Resume,
    /// End the phase early, recording the time spent so far
    Stop,
    /// Abandon the phase without recording anything
    Cancel,
    /// Acknowledge a completed phase and move on
    Ack,
    /// Print current timer state as JSON
    Status,
    /// Tick every second until the running phase completes
    Watch,
    /// Turn Pomodoro auto mode on or off
    Auto {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Restart the auto-mode sequence at Work
    ResetCycle,
    /// Retry writing records that failed to save
    Flush,
    /// Drop records that failed to save
    Discard,
}

fn load_engine(db: &Database, config: &Config) -> CliResult<TimerEngine> {
    let mut engine = match db.kv_get(ENGINE_KEY)? {
        Some(json) => match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "stored timer state is unreadable; starting fresh");
                TimerEngine::new()
            }
        },
        None => TimerEngine::new(),
    };

    // Configuration applies whenever nothing is on the clock.
    if engine.state() == TimerState::Idle {
        engine.set_durations(config.phase_durations())?;
        if engine.is_auto_mode() != config.timer.auto_mode {
            engine.set_auto_mode(config.timer.auto_mode)?;
        }
    }
    engine.set_auto_start(config.timer.auto_start);
    Ok(engine)
}

fn save_engine(db: &Database, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

pub fn run(action: TimerAction) -> CliResult {
    let mut config = Config::load()?;
    let db = Database::open()?;
    let mut store = session_store(&config)?;
    let mut engine = load_engine(&db, &config)?;
    let clock = SystemClock;

    // Pick up a completion that happened while nobody was watching.
    match engine.tick(&clock, &mut store) {
        Ok(Some(event)) => print_json(&event)?,
        Ok(None) => {}
        Err(e) => eprintln!("warning: {e}"),
    }

    let outcome = apply(action, &mut engine, &mut config, &clock, &mut store);
    save_engine(&db, &engine)?;
    outcome
}

fn apply(
    action: TimerAction,
    engine: &mut TimerEngine,
    config: &mut Config,
    clock: &SystemClock,
    store: &mut Box<dyn SessionStore>,
) -> CliResult {
    match action {
        TimerAction::Start {
            mode,
            minutes,
            seconds,
            tag,
            note,
        } => {
            let tag = tag.unwrap_or_else(|| config.tags.default.clone());
            let event = if engine.is_auto_mode() {
                if mode.is_some() || minutes.is_some() || seconds.is_some() {
                    return Err("auto mode picks the phase and its length; run `pomotask timer auto off` first".into());
                }
                engine.start_phase(clock, tag, note)?
            } else {
                let mode = mode.unwrap_or(SessionMode::Work);
                let duration_secs = match (seconds, minutes) {
                    (Some(s), _) => s,
                    (None, Some(m)) => u64::from(m) * 60,
                    (None, None) => config.phase_durations().seconds_for(mode),
                };
                engine.start(clock, PhaseRequest::new(mode, duration_secs).tag(tag).note(note))?
            };
            print_json(&event)?;
        }
        TimerAction::Pause => print_json(&engine.pause(clock)?)?,
        TimerAction::Resume => print_json(&engine.resume(clock)?)?,
        TimerAction::Stop => print_json(&engine.stop(clock, store)?)?,
        TimerAction::Cancel => print_json(&engine.cancel(clock)?)?,
        TimerAction::Ack => print_json(&engine.acknowledge(clock)?)?,
        TimerAction::Status => print_json(&engine.snapshot(clock))?,
        TimerAction::Watch => watch(engine, clock, store)?,
        TimerAction::Auto { state } => {
            let enabled = matches!(state, Switch::On);
            engine.set_auto_mode(enabled)?;
            config.timer.auto_mode = enabled;
            config.save()?;
            print_json(&engine.snapshot(clock))?;
        }
        TimerAction::ResetCycle => print_json(&engine.reset_cycle(clock)?)?,
        TimerAction::Flush => {
            let written = engine.flush_pending(store)?;
            print_json(&serde_json::json!({ "type": "PendingFlushed", "written": written }))?;
        }
        TimerAction::Discard => {
            let lost = engine.discard_pending();
            print_json(&serde_json::json!({ "type": "PendingDiscarded", "records": lost }))?;
        }
    }
    Ok(())
}

/// Blocking countdown on stderr; the completion event goes to stdout.
fn watch(engine: &mut TimerEngine, clock: &SystemClock, store: &mut Box<dyn SessionStore>) -> CliResult {
    if engine.state() != TimerState::Running {
        return Err(format!("nothing to watch: the timer is {}", engine.state()).into());
    }
    let mut stderr = std::io::stderr();
    loop {
        if let Some(event) = engine.tick(clock, store)? {
            eprintln!();
            print_json(&event)?;
            return Ok(());
        }
        let title = engine.current_mode().map(|m| m.title()).unwrap_or("Timer");
        write!(stderr, "\r{title} {}", format_clock(engine.remaining_secs(clock)))?;
        stderr.flush()?;
        std::thread::sleep(Duration::from_secs(1));
    }
}
