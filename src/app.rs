use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{error, info};

use crate::catalog::{Catalog, CatalogError, SupportedCatalog};
use crate::clock::Clock;
use crate::error::QuizError;
use crate::ledger::{ProgressionLedger, SessionRewards};
use crate::question::{generate, DEFAULT_QUESTION_COUNT};
use crate::session::{Advance, Phase, QuizSession, SessionReport};
use crate::store::{HistoryEntry, ProgressStore};

/// Recent sessions kept on hand for the results and profile screens
pub const RECENT_HISTORY: usize = 5;

/// Effective settings for a run, after merging config and CLI flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub question_count: usize,
    pub catalog: SupportedCatalog,
    pub catalog_file: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            catalog: SupportedCatalog::Japan,
            catalog_file: None,
            seed: None,
        }
    }
}

impl QuizSettings {
    /// A custom catalogue file takes precedence over the built-in choice
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_file {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(self.catalog),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Quiz,
    Results,
    Profile,
}

/// What the event loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Front-end state: owns the running session and forwards key presses to it
/// as `select_answer` / `advance` calls.
pub struct App {
    catalog: Catalog,
    question_count: usize,
    rng: StdRng,
    clock: Clock,
    session: QuizSession,
    store: Box<dyn ProgressStore>,
    ledger: ProgressionLedger,
    last_report: Option<SessionReport>,
    rewards: Option<SessionRewards>,
    history: Vec<HistoryEntry>,
    state: AppState,
    return_state: AppState,
    cursor: usize,
    status: Option<String>,
}

impl App {
    /// Fails only when the catalogue cannot supply the first session
    pub fn new(
        catalog: Catalog,
        question_count: usize,
        mut rng: StdRng,
        clock: Clock,
        store: Box<dyn ProgressStore>,
    ) -> Result<Self, QuizError> {
        let questions = generate(&catalog, question_count, &mut rng)?;
        let session = QuizSession::new(questions, clock)?;

        let mut app = Self {
            ledger: store.load_ledger(),
            last_report: store.load_last_report(),
            catalog,
            question_count,
            rng,
            clock,
            session,
            store,
            rewards: None,
            history: Vec::new(),
            state: AppState::Quiz,
            return_state: AppState::Quiz,
            cursor: 0,
            status: None,
        };
        app.refresh_history();
        Ok(app)
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &ProgressionLedger {
        &self.ledger
    }

    pub fn last_report(&self) -> Option<&SessionReport> {
        self.last_report.as_ref()
    }

    /// Rewards earned by the session just finished
    pub fn rewards(&self) -> Option<SessionRewards> {
        self.rewards
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Replace the running session with a freshly generated one
    pub fn new_quiz(&mut self) {
        let session = generate(&self.catalog, self.question_count, &mut self.rng)
            .and_then(|questions| QuizSession::new(questions, self.clock));

        match session {
            Ok(session) => {
                self.session = session;
                self.state = AppState::Quiz;
                self.cursor = 0;
                self.rewards = None;
                self.status = None;
            }
            Err(e) => {
                error!(error = %e, "could not start a new quiz");
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('p') if self.state != AppState::Profile => {
                self.return_state = self.state;
                self.state = AppState::Profile;
                return Control::Continue;
            }
            _ => {}
        }

        match self.state {
            AppState::Quiz => self.handle_quiz_key(key.code),
            AppState::Results => {
                if key.code == KeyCode::Char('n') {
                    self.new_quiz();
                }
            }
            AppState::Profile => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.state = self.return_state,
                KeyCode::Char('n') => self.new_quiz(),
                _ => {}
            },
        }

        Control::Continue
    }

    fn handle_quiz_key(&mut self, code: KeyCode) {
        let option_count = self
            .session
            .current_question()
            .map_or(0, |q| q.options().len());

        match code {
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if index < option_count && self.session.phase() == Phase::AwaitingAnswer {
                    self.cursor = index;
                    self.select(index);
                }
            }
            KeyCode::Up if self.session.phase() == Phase::AwaitingAnswer => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down if self.session.phase() == Phase::AwaitingAnswer => {
                if self.cursor + 1 < option_count {
                    self.cursor += 1;
                }
            }
            KeyCode::Enter => match self.session.phase() {
                Phase::AwaitingAnswer => self.select(self.cursor),
                _ => self.advance(),
            },
            _ => {}
        }
    }

    fn select(&mut self, index: usize) {
        let Some(choice) = self
            .session
            .current_question()
            .and_then(|q| q.options().get(index))
            .cloned()
        else {
            return;
        };

        if let Err(e) = self.session.select_answer(choice) {
            error!(error = %e, "rejected answer selection");
        }
    }

    fn advance(&mut self) {
        match self.session.advance() {
            Ok(Advance::Next) => self.cursor = 0,
            Ok(Advance::Completed(report)) => self.finish(report),
            Err(e) => error!(error = %e, "rejected advance"),
        }
    }

    fn finish(&mut self, report: SessionReport) {
        self.rewards = Some(self.ledger.rewards_for(&report));

        match self.store.commit_session(&report, self.clock.today()) {
            Ok(ledger) => {
                self.ledger = ledger;
                self.status = None;
            }
            Err(e) => {
                error!(error = %e, "failed to save session result");
                // keep showing the result even though it was not persisted
                self.ledger = self.ledger.apply_session_report(&report);
                self.status = Some(format!("progress not saved: {e}"));
            }
        }

        info!(score = report.score, total = report.total, "showing results");
        self.last_report = Some(report);
        self.refresh_history();
        self.state = AppState::Results;
    }

    fn refresh_history(&mut self) {
        match self.store.history(RECENT_HISTORY) {
            Ok(history) => self.history = history,
            Err(e) => {
                error!(error = %e, "failed to load session history");
                self.status = Some(format!("history unavailable: {e}"));
            }
        }
    }
}
