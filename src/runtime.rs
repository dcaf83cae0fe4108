use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

/// Event consumed by the app loop
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread and forwards them over a channel
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    debug!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if let Some(ev) = translate(event) {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

/// Map a terminal event onto a `QuizEvent`; `None` for events the app ignores
fn translate(event: CtEvent) -> Option<QuizEvent> {
    match event {
        // key release events would otherwise double every keypress on windows
        CtEvent::Key(key) if key.kind != KeyEventKind::Release => Some(QuizEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(QuizEvent::Resize),
        _ => None,
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for headless runs
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval; Tick on timeout or a closed source
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                QuizEvent::Tick
            }
        }
    }
}
