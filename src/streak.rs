use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::ProgressionLedger;

/// Calendar-day bookkeeping behind the ledger's streak counter.
///
/// The ledger only knows how to increment or reset its streak; deciding when
/// a new day has started is done here, against a day supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub last_active_day: Option<NaiveDate>,
}

impl StreakRecord {
    pub fn register_completion(
        &self,
        today: NaiveDate,
        ledger: ProgressionLedger,
    ) -> (StreakRecord, ProgressionLedger) {
        let mut ledger = ledger;

        match self.last_active_day {
            // clock went backwards or second session of the day
            Some(last) if last >= today => return (*self, ledger),
            Some(last) if today.pred_opt() == Some(last) => ledger.increment_streak(),
            _ => {
                ledger.reset_streak();
                ledger.increment_streak();
            }
        }
        debug!(%today, streak = ledger.streak, "streak updated");

        (
            StreakRecord {
                last_active_day: Some(today),
            },
            ledger,
        )
    }
}
