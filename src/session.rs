use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{Operation, QuizError};
use crate::question::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    AwaitingAnswer,
    AnswerRevealed,
    Completed,
}

/// Feedback for the current question once an answer has been chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// What happened to one question, as logged in the session report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question: Question,
    pub user_answer: Option<String>,
    pub is_correct: Option<bool>,
}

/// Emitted once, when the last question is advanced past
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub score: u32,
    pub total: u32,
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
    pub questions: Vec<QuestionOutcome>,
}

impl SessionReport {
    pub fn accuracy(&self) -> u32 {
        crate::util::rounded_percent(u64::from(self.score), u64::from(self.total))
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

/// Result of a successful `advance`
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next,
    Completed(SessionReport),
}

/// One quiz attempt: a fixed question sequence stepped through strictly
/// forward, one select/advance pair per question.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    selected_answer: Option<String>,
    revealed: bool,
    score: u32,
    started_at: DateTime<Utc>,
    outcomes: Vec<QuestionOutcome>,
    completed: bool,
    clock: Clock,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>, clock: Clock) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptySession);
        }

        let started_at = clock.now();
        info!(questions = questions.len(), %started_at, "session started");

        Ok(Self {
            outcomes: Vec::with_capacity(questions.len()),
            questions,
            current_index: 0,
            selected_answer: None,
            revealed: false,
            score: 0,
            started_at,
            completed: false,
            clock,
        })
    }

    pub fn phase(&self) -> Phase {
        if self.completed {
            Phase::Completed
        } else if self.revealed {
            Phase::AnswerRevealed
        } else {
            Phase::AwaitingAnswer
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// `None` once the session is completed
    pub fn current_question(&self) -> Option<&Question> {
        if self.completed {
            None
        } else {
            self.questions.get(self.current_index)
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 1-based number of the current question
    pub fn position(&self) -> usize {
        self.current_index + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now() - self.started_at
    }

    /// Feedback for the current question, if an answer has been selected
    pub fn reveal(&self) -> Option<Reveal> {
        if self.phase() != Phase::AnswerRevealed {
            return None;
        }
        let question = self.questions.get(self.current_index)?;
        let selected = self.selected_answer.clone()?;

        Some(Reveal {
            is_correct: question.is_correct(&selected),
            correct_answer: question.correct_answer().to_string(),
            selected,
        })
    }

    pub fn select_answer(&mut self, choice: impl Into<String>) -> Result<Reveal, QuizError> {
        self.expect_phase(Phase::AwaitingAnswer, Operation::SelectAnswer)?;

        let choice = choice.into();
        debug!(index = self.current_index, %choice, "answer selected");
        self.selected_answer = Some(choice);
        self.revealed = true;

        self.reveal().ok_or(QuizError::InvalidTransition {
            operation: Operation::SelectAnswer,
            phase: self.phase(),
        })
    }

    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        self.expect_phase(Phase::AnswerRevealed, Operation::Advance)?;

        let question = &self.questions[self.current_index];
        let answer = self.selected_answer.take();
        let is_correct = answer.as_deref().is_some_and(|a| question.is_correct(a));
        if is_correct {
            self.score += 1;
        }
        self.outcomes.push(QuestionOutcome {
            question: question.clone(),
            user_answer: answer,
            is_correct: Some(is_correct),
        });
        self.revealed = false;

        if self.current_index + 1 == self.questions.len() {
            self.completed = true;
            return Ok(Advance::Completed(self.build_report()));
        }

        self.current_index += 1;
        Ok(Advance::Next)
    }

    fn build_report(&self) -> SessionReport {
        let completed_at = self.clock.now();
        let elapsed_ms = (completed_at - self.started_at).num_milliseconds().max(0);
        let duration_seconds = ((elapsed_ms as f64) / 1000.0).round() as u64;

        let report = SessionReport {
            score: self.score,
            total: self.questions.len() as u32,
            duration_seconds,
            completed_at,
            questions: self.outcomes.clone(),
        };
        info!(
            score = report.score,
            total = report.total,
            duration_seconds,
            "session completed"
        );
        report
    }

    fn expect_phase(&self, expected: Phase, operation: Operation) -> Result<(), QuizError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(QuizError::InvalidTransition { operation, phase })
        }
    }
}
