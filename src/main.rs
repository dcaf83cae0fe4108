use anyhow::{Context, Result};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use shakaquest::{
    app::{App, Control, QuizSettings},
    app_dirs::AppDirs,
    catalog::SupportedCatalog,
    clock::Clock,
    config::{Config, ConfigStore, FileConfigStore},
    ledger::ProgressionLedger,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    session::SessionReport,
    store::{export_history_csv, summarize, HistoryEntry, ProgressStore, SqliteProgressStore},
    ui::{humanize_since, screen::draw},
};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 250;
const LOG_ENV: &str = "SHAKAQUEST_LOG";

/// prefecture and capital quiz with levels, streaks and progress tracking
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal geography quiz: name the capital of a prefecture, or the prefecture behind a capital. Every finished quiz earns experience and coins, keeps your daily streak going and is saved to your local progress history."
)]
pub struct Cli {
    /// number of questions per quiz (default from config, 10)
    #[clap(short = 'n', long = "questions", value_parser = clap::value_parser!(u64).range(1..))]
    questions: Option<u64>,

    /// built-in catalogue to quiz on
    #[clap(short = 'c', long, value_enum)]
    catalog: Option<SupportedCatalog>,

    /// custom catalogue json file (same schema as the built-in ones)
    #[clap(long, value_name = "PATH", conflicts_with = "catalog")]
    catalog_file: Option<PathBuf>,

    /// seed the question generator for a repeatable quiz
    #[clap(long)]
    seed: Option<u64>,

    /// directory for the progress database, log file and config (default: platform dirs)
    #[clap(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// print your progress and last result, then exit
    #[clap(long)]
    stats: bool,

    /// write your session history as csv, then exit
    #[clap(long, value_name = "PATH")]
    export_history: Option<PathBuf>,

    /// save the question count and catalogue as defaults, then exit
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Flags win over the config file
    fn settings(&self, config: &Config) -> QuizSettings {
        QuizSettings {
            question_count: self
                .questions
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(config.question_count),
            catalog: self.catalog.unwrap_or_else(|| config.supported_catalog()),
            catalog_file: self.catalog_file.clone(),
            seed: self.seed,
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.data_dir {
            Some(dir) => FileConfigStore::with_path(dir.join("config.json")),
            None => FileConfigStore::new(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::resolve(cli.data_dir.as_deref())
        .context("could not determine a data directory, pass --data-dir")?;
    init_logging(&dirs.log_path());

    let config_store = cli.config_store();
    let config = config_store.load();
    let settings = cli.settings(&config);
    info!(?settings, data_dir = %dirs.state_dir().display(), "starting");

    if cli.save_config {
        config_store
            .save(&Config::from(&settings))
            .with_context(|| format!("failed to write {}", config_store.path().display()))?;
        println!("saved defaults to {}", config_store.path().display());
        return Ok(());
    }

    if cli.stats || cli.export_history.is_some() {
        let store = SqliteProgressStore::open(dirs.db_path())
            .with_context(|| format!("failed to open {}", dirs.db_path().display()))?;

        if let Some(path) = &cli.export_history {
            let count = export_history(&store, path)?;
            println!("exported {count} sessions to {}", path.display());
        }
        if cli.stats {
            let history = store.history(shakaquest::app::RECENT_HISTORY)?;
            write_stats(
                &mut io::stdout().lock(),
                &store.load_ledger(),
                store.load_last_report().as_ref(),
                &history,
                Clock::System,
            )?;
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let catalog = settings.load_catalog().context("failed to load catalogue")?;
    let store = SqliteProgressStore::open(dirs.db_path())
        .with_context(|| format!("failed to open {}", dirs.db_path().display()))?;
    let mut app = App::new(
        catalog,
        settings.question_count,
        settings.rng(),
        Clock::System,
        Box::new(store),
    )?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = run_tui(&mut terminal, &mut app, &runner);

    // restore the terminal before surfacing any loop error
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn init_logging(path: &Path) {
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));

    // stdout belongs to the TUI; without a log file we run silent
    let Ok(file) = file else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run_tui<B: Backend, E: QuizEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(app, f))?;

        match runner.step() {
            QuizEvent::Key(key) => {
                if app.handle_key(key) == Control::Quit {
                    break;
                }
            }
            // redraw keeps the elapsed timer moving
            QuizEvent::Resize | QuizEvent::Tick => {}
        }
    }

    info!("quit");
    Ok(())
}

/// Oldest first. Returns the number of rows written.
fn export_history(store: &SqliteProgressStore, path: &Path) -> Result<usize> {
    let mut entries = store.history(usize::MAX)?;
    entries.reverse();

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    export_history_csv(&entries, file)?;
    Ok(entries.len())
}

fn write_stats<W: Write>(
    out: &mut W,
    ledger: &ProgressionLedger,
    last_report: Option<&SessionReport>,
    history: &[HistoryEntry],
    clock: Clock,
) -> io::Result<()> {
    writeln!(
        out,
        "Level {} ({} XP, {} to next level)",
        ledger.level,
        ledger.total_xp,
        ledger.xp_to_next_level()
    )?;
    writeln!(out, "Coins {}", ledger.coins)?;
    writeln!(out, "Streak {} days", ledger.streak)?;
    writeln!(out, "Quizzes {}", ledger.completed_sessions)?;
    writeln!(
        out,
        "Accuracy {}% ({}/{})",
        ledger.accuracy(),
        ledger.correct_answers,
        ledger.total_answered
    )?;

    match last_report {
        Some(report) => writeln!(
            out,
            "Last result {}/{} ({}%) in {}s, {}",
            report.score,
            report.total,
            report.accuracy(),
            report.duration_seconds,
            humanize_since(report.completed_at, clock.now())
        )?,
        None => writeln!(out, "Last result none")?,
    }

    let summary = summarize(history);
    if let Some(average) = summary.average_accuracy {
        writeln!(
            out,
            "Recent average {average:.0}% over {} sessions",
            summary.sessions
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use shakaquest::{
        catalog::Catalog,
        clock::{fixed_clock, fixed_now},
        runtime::TestEventSource,
    };
    use std::sync::mpsc;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("shakaquest").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_defaults_come_from_config() {
        let cli = parse(&[]);
        let config = Config {
            question_count: 15,
            catalog: "japan-ja".into(),
        };

        let settings = cli.settings(&config);
        assert_eq!(settings.question_count, 15);
        assert_eq!(settings.catalog, SupportedCatalog::JapanJa);
        assert_eq!(settings.seed, None);
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = parse(&["-n", "5", "-c", "japan", "--seed", "9"]);

        let settings = cli.settings(&Config {
            question_count: 15,
            catalog: "japan-ja".into(),
        });
        assert_eq!(settings.question_count, 5);
        assert_eq!(settings.catalog, SupportedCatalog::Japan);
        assert_eq!(settings.seed, Some(9));
    }

    #[test]
    fn test_cli_rejects_zero_questions() {
        let err = Cli::try_parse_from(["shakaquest", "-n", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_catalog_and_file_conflict() {
        let err = Cli::try_parse_from(["shakaquest", "-c", "japan", "--catalog-file", "x.json"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_config_store_follows_data_dir() {
        let cli = parse(&["--data-dir", "/tmp/sq"]);
        assert_eq!(cli.config_store().path(), Path::new("/tmp/sq/config.json"));
    }

    #[test]
    fn test_write_stats_fresh_ledger() {
        let mut out = Vec::new();
        write_stats(&mut out, &ProgressionLedger::default(), None, &[], fixed_clock()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Level 1 (0 XP, 100 to next level)"));
        assert!(text.contains("Accuracy 0% (0/0)"));
        assert!(text.contains("Last result none"));
        assert!(!text.contains("Recent average"));
    }

    #[test]
    fn test_write_stats_with_history() {
        let report = SessionReport {
            score: 7,
            total: 10,
            duration_seconds: 42,
            completed_at: fixed_now(),
            questions: Vec::new(),
        };
        let ledger = ProgressionLedger::default().apply_session_report(&report);
        let history = vec![HistoryEntry::from(&report)];

        let mut out = Vec::new();
        write_stats(&mut out, &ledger, Some(&report), &history, fixed_clock()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Level 1 (70 XP, 30 to next level)"));
        assert!(text.contains("Last result 7/10 (70%) in 42s"));
        assert!(text.contains("Recent average 70% over 1 sessions"));
    }

    #[test]
    fn test_run_tui_quits_on_escape() {
        let mut app = App::new(
            Catalog::builtin(SupportedCatalog::Japan).unwrap(),
            3,
            rand::SeedableRng::seed_from_u64(1),
            fixed_clock(),
            Box::new(SqliteProgressStore::open_in_memory().unwrap()),
        )
        .unwrap();
        let (tx, rx) = mpsc::channel();
        tx.send(QuizEvent::Key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE)))
            .unwrap();
        tx.send(QuizEvent::Resize).unwrap();
        tx.send(QuizEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        run_tui(&mut terminal, &mut app, &runner).unwrap();
        assert!(app.session().reveal().is_some());
    }
}
