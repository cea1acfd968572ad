// ABOUTME: Diagnostics accumulator for non-fatal warnings during a rollout.
// ABOUTME: Collects cleanup and rollback problems that should be reported but not fail the command.

use crate::types::Color;

/// Warnings gathered while deploying, switching, and monitoring.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning; it is also logged through tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, color = %warning.color, "{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    /// Environment the warning is about.
    pub color: Color,
    pub message: String,
}

impl Warning {
    /// The previously active environment could not be stopped after a switch.
    pub fn previous_stop(color: Color, message: impl Into<String>) -> Self {
        Self::about(WarningKind::PreviousStop, color, message)
    }

    /// A deploy target that never turned healthy could not be stopped.
    pub fn target_cleanup(color: Color, message: impl Into<String>) -> Self {
        Self::about(WarningKind::TargetCleanup, color, message)
    }

    /// The monitor switched traffic back to `to`.
    pub fn rolled_back(to: Color, message: impl Into<String>) -> Self {
        Self::about(WarningKind::RolledBack, to, message)
    }

    /// The monitor wanted to leave `from` but the rollback was refused.
    pub fn rollback_failed(from: Color, message: impl Into<String>) -> Self {
        Self::about(WarningKind::RollbackFailed, from, message)
    }

    /// An environment could not be stopped while shutting everything down.
    pub fn teardown(color: Color, message: impl Into<String>) -> Self {
        Self::about(WarningKind::Teardown, color, message)
    }

    fn about(kind: WarningKind, color: Color, message: impl Into<String>) -> Self {
        Self {
            kind,
            color,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Previous environment still running after the switch.
    PreviousStop,
    /// Unhealthy target left running after an aborted deploy.
    TargetCleanup,
    /// Monitoring crossed a threshold and traffic moved back.
    RolledBack,
    /// Monitoring crossed a threshold and nothing could take traffic back.
    RollbackFailed,
    /// An environment was still draining when the command gave up on it.
    Teardown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn warnings_keep_order_and_color() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::previous_stop(Color::Blue, "blue did not drain"));
        diag.warn(Warning::target_cleanup(Color::Green, "green did not drain"));
        diag.warn(Warning::rolled_back(Color::Blue, "green kept failing"));

        assert_eq!(diag.warnings().len(), 3);
        assert_eq!(diag.warnings()[0].kind, WarningKind::PreviousStop);
        assert_eq!(diag.warnings()[1].kind, WarningKind::TargetCleanup);

        assert_eq!(diag.warnings()[2].kind, WarningKind::RolledBack);
        assert_eq!(diag.warnings()[2].color, Color::Blue);
    }
}
