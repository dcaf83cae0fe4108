use serde::{Deserialize, Serialize};

use crate::session::SessionReport;
use crate::util::rounded_percent;

pub const XP_PER_CORRECT: u64 = 10;
pub const COINS_PER_CORRECT: u64 = 5;
pub const XP_PER_LEVEL: u64 = 100;

/// Cross-session progression record for the single local learner.
///
/// Serialized with the field names of the persisted stats record. `level` is
/// stored for display only and is recomputed from `total_xp` on every update
/// and on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredLedger")]
pub struct ProgressionLedger {
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u64,
    pub streak: u64,
    pub coins: u64,
    #[serde(rename = "completedQuizzes")]
    pub completed_sessions: u64,
    #[serde(rename = "correctAnswers")]
    pub correct_answers: u64,
    #[serde(rename = "totalAnswers")]
    pub total_answered: u64,
}

#[derive(Deserialize)]
#[serde(default)]
struct StoredLedger {
    #[serde(rename = "totalXP")]
    total_xp: u64,
    streak: u64,
    coins: u64,
    #[serde(rename = "completedQuizzes")]
    completed_sessions: u64,
    #[serde(rename = "correctAnswers")]
    correct_answers: u64,
    #[serde(rename = "totalAnswers")]
    total_answered: u64,
}

impl Default for StoredLedger {
    fn default() -> Self {
        let ledger = ProgressionLedger::default();
        Self {
            total_xp: ledger.total_xp,
            streak: ledger.streak,
            coins: ledger.coins,
            completed_sessions: ledger.completed_sessions,
            correct_answers: ledger.correct_answers,
            total_answered: ledger.total_answered,
        }
    }
}

impl From<StoredLedger> for ProgressionLedger {
    fn from(stored: StoredLedger) -> Self {
        Self {
            total_xp: stored.total_xp,
            level: level_for(stored.total_xp),
            streak: stored.streak,
            coins: stored.coins,
            completed_sessions: stored.completed_sessions,
            correct_answers: stored.correct_answers,
            total_answered: stored.total_answered,
        }
    }
}

impl Default for ProgressionLedger {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: 1,
            streak: 0,
            coins: 0,
            completed_sessions: 0,
            correct_answers: 0,
            total_answered: 0,
        }
    }
}

/// What a single report is worth, for the results screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRewards {
    pub xp: u64,
    pub coins: u64,
    pub leveled_up: bool,
}

pub fn level_for(total_xp: u64) -> u64 {
    total_xp / XP_PER_LEVEL + 1
}

impl ProgressionLedger {
    /// Folds a completed session into the ledger. Pure: the caller persists
    /// the returned value.
    pub fn apply_session_report(&self, report: &SessionReport) -> ProgressionLedger {
        let score = u64::from(report.score);
        let xp_gained = score * XP_PER_CORRECT;
        let coins_gained = score * COINS_PER_CORRECT;

        let mut next = *self;
        next.total_xp = next.total_xp.saturating_add(xp_gained);
        next.coins = next.coins.saturating_add(coins_gained);
        next.completed_sessions = next.completed_sessions.saturating_add(1);
        next.correct_answers = next.correct_answers.saturating_add(score);
        next.total_answered = next.total_answered.saturating_add(u64::from(report.total));
        next.level = level_for(next.total_xp);
        next
    }

    pub fn rewards_for(&self, report: &SessionReport) -> SessionRewards {
        let after = self.apply_session_report(report);
        SessionRewards {
            xp: after.total_xp - self.total_xp,
            coins: after.coins - self.coins,
            leveled_up: after.level > level_for(self.total_xp),
        }
    }

    pub fn increment_streak(&mut self) {
        self.streak = self.streak.saturating_add(1);
    }

    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }

    /// Percentage of answers that were correct, 0 before any answer
    pub fn accuracy(&self) -> u32 {
        rounded_percent(self.correct_answers, self.total_answered)
    }

    pub fn xp_to_next_level(&self) -> u64 {
        XP_PER_LEVEL - self.total_xp % XP_PER_LEVEL
    }
}
