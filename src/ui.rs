pub mod screen;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::{
    app::App,
    session::{Phase, QuizSession},
    store::summarize,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// "5 minutes ago" style text for a past timestamp
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - then).to_std().unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

fn footer(app: &App, legend: &str) -> Paragraph<'static> {
    match app.status() {
        Some(status) => Paragraph::new(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => Paragraph::new(Span::styled(legend.to_string(), italic())),
    }
}

fn option_lines(session: &QuizSession, cursor: usize) -> Vec<Line<'static>> {
    let Some(question) = session.current_question() else {
        return Vec::new();
    };
    let revealed = session.phase() == Phase::AnswerRevealed;
    let selected = session.selected_answer();

    question
        .options()
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let style = if revealed {
                if question.correct_position() == Some(idx) {
                    bold().fg(Color::Green)
                } else if selected == Some(option.as_str()) {
                    bold().fg(Color::Red)
                } else {
                    dim()
                }
            } else if idx == cursor {
                bold().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let marker = if !revealed && idx == cursor { ">" } else { " " };

            Line::from(Span::styled(format!("{marker} {}. {option}", idx + 1), style))
        })
        .collect()
}

pub(crate) fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.session();
    let Some(question) = session.current_question() else {
        return;
    };
    let options = option_lines(session, app.cursor());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),                    // progress
            Constraint::Length(1),                    // gauge
            Constraint::Length(1),                    // padding
            Constraint::Length(1),                    // region
            Constraint::Length(2),                    // prompt
            Constraint::Length(options.len() as u16), // options
            Constraint::Length(1),                    // padding
            Constraint::Length(1),                    // feedback
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let progress = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Question {}/{}", session.position(), session.total()),
            bold(),
        ),
        Span::raw(format!(
            "   score {}   {}s",
            session.score(),
            session.elapsed().num_seconds().max(0)
        )),
    ]));
    progress.render(chunks[0], buf);

    let answered = session.outcomes().len() as f64 / session.total() as f64;
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(answered.clamp(0.0, 1.0))
        .label(format!("{}/{}", session.outcomes().len(), session.total()))
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!("Region: {}", question.subject().region),
        Style::default().fg(Color::Magenta),
    ))
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        question.prompt(app.catalog().unit_label()),
        bold(),
    ))
    .wrap(Wrap { trim: true })
    .render(chunks[4], buf);

    Paragraph::new(options).render(chunks[5], buf);

    if let Some(reveal) = session.reveal() {
        let feedback = if reveal.is_correct {
            Span::styled("Correct!", bold().fg(Color::Green))
        } else {
            Span::styled(
                format!("Incorrect. The answer is {}", reveal.correct_answer),
                bold().fg(Color::Red),
            )
        };
        Paragraph::new(feedback).render(chunks[7], buf);
    }

    let legend = if session.phase() == Phase::AnswerRevealed {
        "(enter) next / (p)rofile / (esc)ape"
    } else {
        "(1-4) answer / (↑↓ enter) choose / (p)rofile / (esc)ape"
    };
    footer(app, legend).render(chunks[9], buf);
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(report) = app.last_report() else {
        return;
    };
    let unit_label = app.catalog().unit_label();
    let now = app.clock().now();

    let mut log: Vec<Line> = report
        .questions
        .iter()
        .map(|outcome| {
            let prompt = outcome.question.prompt(unit_label);
            let answer = outcome.user_answer.as_deref().unwrap_or("-");
            if outcome.is_correct == Some(true) {
                Line::from(vec![
                    Span::styled("✓ ", bold().fg(Color::Green)),
                    Span::raw(format!("{prompt} {answer}")),
                ])
            } else {
                Line::from(vec![
                    Span::styled("✗ ", bold().fg(Color::Red)),
                    Span::raw(format!("{prompt} {answer} ")),
                    Span::styled(
                        format!("(answer: {})", outcome.question.correct_answer()),
                        dim(),
                    ),
                ])
            }
        })
        .collect();

    if !app.history().is_empty() {
        log.push(Line::from(""));
        log.push(Line::from(Span::styled("Recent sessions", bold())));
        log.extend(app.history().iter().map(|entry| {
            Line::from(format!(
                "{}/{}  {}%  {}s  {}",
                entry.score,
                entry.total,
                entry.accuracy(),
                entry.duration_seconds,
                humanize_since(entry.completed_at, now)
            ))
        }));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score
            Constraint::Length(1), // rewards
            Constraint::Length(1), // ledger
            Constraint::Length(1), // padding
            Constraint::Min(1),    // log
            Constraint::Length(1), // legend
        ])
        .split(area);

    let score_style = if report.is_perfect() {
        bold().fg(Color::Yellow)
    } else {
        bold()
    };
    Paragraph::new(Span::styled(
        format!(
            "Score {}/{} ({}%)   {}s",
            report.score,
            report.total,
            report.accuracy(),
            report.duration_seconds
        ),
        score_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    if let Some(rewards) = app.rewards() {
        let mut spans = vec![Span::styled(
            format!("+{} XP  +{} coins", rewards.xp, rewards.coins),
            Style::default().fg(Color::Cyan),
        )];
        if rewards.leveled_up {
            spans.push(Span::styled("  LEVEL UP!", bold().fg(Color::Yellow)));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    }

    let ledger = app.ledger();
    Paragraph::new(Span::styled(
        format!(
            "Level {}   XP {}   Streak {}   Coins {}",
            ledger.level, ledger.total_xp, ledger.streak, ledger.coins
        ),
        italic(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(log)
        .wrap(Wrap { trim: false })
        .render(chunks[4], buf);

    footer(app, "(n)ew / (p)rofile / (esc)ape").render(chunks[5], buf);
}

pub(crate) fn render_profile(app: &App, area: Rect, buf: &mut Buffer) {
    let ledger = app.ledger();
    let summary = summarize(app.history());

    let mut lines = vec![
        Line::from(Span::styled("Profile", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(format!("Level            {}", ledger.level)),
        Line::from(format!(
            "Experience       {} XP ({} to next level)",
            ledger.total_xp,
            ledger.xp_to_next_level()
        )),
        Line::from(format!("Coins            {}", ledger.coins)),
        Line::from(format!("Streak           {} days", ledger.streak)),
        Line::from(format!("Quizzes          {}", ledger.completed_sessions)),
        Line::from(format!(
            "Accuracy         {}% ({}/{})",
            ledger.accuracy(),
            ledger.correct_answers,
            ledger.total_answered
        )),
    ];

    if let Some(average) = summary.average_accuracy {
        lines.push(Line::from(format!(
            "Recent average   {average:.0}% over {} sessions",
            summary.sessions
        )));
    }
    if let Some(report) = app.last_report() {
        lines.push(Line::from(format!(
            "Last result      {}/{} {}",
            report.score,
            report.total,
            humanize_since(report.completed_at, app.clock().now())
        )));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    Paragraph::new(lines).render(chunks[0], buf);
    footer(app, "(n)ew / (b)ack / (esc)ape").render(chunks[1], buf);
}
