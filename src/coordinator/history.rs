// ABOUTME: Append-only audit log of traffic switch attempts.
// ABOUTME: Every switch and rollback, successful or refused, adds one entry.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Color, Outcome, SwitchKind, Version};

/// One recorded switch attempt. Entries are never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: SwitchKind,
    /// The color traffic was (or would have been) switched to.
    pub color: Color,
    pub version: Option<Version>,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub(crate) struct DeploymentHistory {
    entries: Vec<HistoryEntry>,
}

impl DeploymentHistory {
    pub fn record(
        &mut self,
        kind: SwitchKind,
        color: Color,
        version: Option<Version>,
        outcome: Outcome,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            timestamp: Utc::now(),
            kind,
            color,
            version,
            outcome,
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_kept_in_call_order() {
        let mut history = DeploymentHistory::default();
        history.record(SwitchKind::Switch, Color::Green, None, Outcome::Failed);
        history.record(SwitchKind::Switch, Color::Green, None, Outcome::Success);
        history.record(SwitchKind::Rollback, Color::Blue, None, Outcome::Success);

        let outcomes: Vec<_> = history.entries().iter().map(|e| e.outcome).collect();
        assert_eq!(
            outcomes,
            vec![Outcome::Failed, Outcome::Success, Outcome::Success]
        );
        assert!(
            history
                .entries()
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );
    }
}
