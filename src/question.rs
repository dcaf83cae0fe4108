use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, GeographicUnit};
use crate::error::QuizError;

/// Options shown per question: the correct answer plus three distractors
pub const OPTION_COUNT: usize = 4;

/// Default number of questions in a session
pub const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuestionKind {
    /// Shows the unit name, asks for its capital
    AskCapital,
    /// Shows a capital, asks for the owning unit
    AskUnit,
}

impl QuestionKind {
    /// The string a unit contributes as an option for this kind of question
    pub fn answer_for<'a>(&self, unit: &'a GeographicUnit) -> &'a str {
        match self {
            QuestionKind::AskCapital => &unit.capital,
            QuestionKind::AskUnit => &unit.name,
        }
    }
}

/// A multiple-choice question. Built only by [`generate`], so `options`
/// always holds four distinct strings with `correct_answer` among them once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    subject: GeographicUnit,
    kind: QuestionKind,
    options: Vec<String>,
    correct_answer: String,
}

impl Question {
    pub fn subject(&self) -> &GeographicUnit {
        &self.subject
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Zero-based slot of the correct answer within `options`
    pub fn correct_position(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }

    /// Question text as shown to the learner
    pub fn prompt(&self, unit_label: &str) -> String {
        match self.kind {
            QuestionKind::AskCapital => format!("What is the capital of {}?", self.subject.name),
            QuestionKind::AskUnit => format!(
                "Which {unit_label} has {} as its capital?",
                self.subject.capital
            ),
        }
    }
}

/// Builds `count` questions about distinct units of `catalog`.
///
/// Pure apart from consuming `rng`; a seeded RNG reproduces the same session.
pub fn generate<R: Rng + ?Sized>(
    catalog: &Catalog,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, QuizError> {
    let units = catalog.units();

    if count > units.len() {
        return Err(QuizError::InsufficientCatalog {
            required: count,
            available: units.len(),
        });
    }
    if count > 0 && units.len() < OPTION_COUNT {
        return Err(QuizError::InsufficientCatalog {
            required: OPTION_COUNT,
            available: units.len(),
        });
    }

    let questions: Vec<Question> = units
        .choose_multiple(rng, count)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .map(|subject| build_question(units, subject, rng))
        .collect();

    debug!(
        catalog = catalog.name(),
        count = questions.len(),
        "generated questions"
    );

    Ok(questions)
}

fn build_question<R: Rng + ?Sized>(
    units: &[GeographicUnit],
    subject: GeographicUnit,
    rng: &mut R,
) -> Question {
    let kind = if rng.gen_bool(0.5) {
        QuestionKind::AskCapital
    } else {
        QuestionKind::AskUnit
    };

    let others: Vec<&GeographicUnit> = units.iter().filter(|u| u.id != subject.id).collect();

    let correct_answer = kind.answer_for(&subject).to_string();
    let mut options: Vec<String> = others
        .choose_multiple(rng, OPTION_COUNT - 1)
        .map(|u| kind.answer_for(u).to_string())
        .collect();
    options.push(correct_answer.clone());
    // Fisher-Yates; sorting by a random comparator would bias the positions
    options.shuffle(rng);

    Question {
        subject,
        kind,
        options,
        correct_answer,
    }
}
