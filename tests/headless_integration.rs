use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{backend::TestBackend, Terminal};
use shakaquest::{
    app::{App, AppState, Control},
    catalog::{Catalog, SupportedCatalog},
    clock::fixed_clock,
    runtime::{FixedTicker, QuizEvent, Runner, TestEventSource},
    session::Phase,
    store::{ProgressStore, SqliteProgressStore},
    ui::screen::draw,
};

fn key(code: KeyCode) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn new_app(count: usize, store: SqliteProgressStore) -> App {
    App::new(
        Catalog::builtin(SupportedCatalog::Japan).unwrap(),
        count,
        StdRng::seed_from_u64(21),
        fixed_clock(),
        Box::new(store),
    )
    .unwrap()
}

// Drives App through Runner/TestEventSource and renders every step to a TestBackend.
fn drive<F>(app: &mut App, mut next_keys: F, max_steps: u32) -> Control
where
    F: FnMut(&App) -> Vec<QuizEvent>,
{
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

    for _ in 0..max_steps {
        terminal.draw(|f| draw(app, f)).unwrap();
        for event in next_keys(app) {
            tx.send(event).unwrap();
        }
        match runner.step() {
            QuizEvent::Key(k) => {
                if app.handle_key(k) == Control::Quit {
                    return Control::Quit;
                }
            }
            QuizEvent::Resize | QuizEvent::Tick => {}
        }
    }
    Control::Continue
}

#[test]
fn headless_quiz_answers_everything_correctly() {
    let mut app = new_app(10, SqliteProgressStore::open_in_memory().unwrap());

    drive(
        &mut app,
        |app| match (app.state(), app.session().phase()) {
            (AppState::Quiz, Phase::AwaitingAnswer) => {
                let index = app
                    .session()
                    .current_question()
                    .and_then(|q| q.correct_position())
                    .unwrap();
                vec![key(KeyCode::Char(char::from(b'1' + index as u8)))]
            }
            (AppState::Quiz, _) => vec![key(KeyCode::Enter)],
            _ => Vec::new(),
        },
        200,
    );

    assert_eq!(app.state(), AppState::Results);
    let report = app.last_report().unwrap();
    assert_eq!(report.score, 10);
    assert_eq!(report.total, 10);
    assert!(report.is_perfect());
    assert_eq!(report.questions.len(), 10);
    assert!(report.questions.iter().all(|o| o.is_correct == Some(true)));
    assert_eq!(app.ledger().total_xp, 100);
    assert_eq!(app.ledger().level, 2);
    assert!(app.rewards().unwrap().leveled_up);
}

#[test]
fn headless_cursor_navigation_and_quit() {
    let mut app = new_app(2, SqliteProgressStore::open_in_memory().unwrap());
    let mut script = vec![
        key(KeyCode::Down),
        key(KeyCode::Down),
        key(KeyCode::Enter),
        key(KeyCode::Enter),
        key(KeyCode::Char('q')),
    ]
    .into_iter();

    let control = drive(&mut app, |_| script.next().into_iter().collect(), 50);

    assert_eq!(control, Control::Quit);
    assert_eq!(app.session().position(), 2);
    assert_eq!(app.session().outcomes().len(), 1);
    let first = &app.session().outcomes()[0];
    assert_eq!(
        first.user_answer.as_deref(),
        Some(first.question.options()[2].as_str())
    );
}

#[test]
fn headless_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("progress.db");

    for _ in 0..2 {
        let mut app = new_app(3, SqliteProgressStore::open(&db).unwrap());
        drive(
            &mut app,
            |app| match app.state() {
                AppState::Quiz => vec![key(KeyCode::Enter)],
                _ => Vec::new(),
            },
            40,
        );
        assert_eq!(app.state(), AppState::Results);
    }

    let store = SqliteProgressStore::open(&db).unwrap();
    let ledger = store.load_ledger();
    assert_eq!(ledger.completed_sessions, 2);
    assert_eq!(ledger.total_answered, 6);
    // both sessions happened on the same fixed day
    assert_eq!(ledger.streak, 1);
    assert_eq!(store.history(10).unwrap().len(), 2);
}
