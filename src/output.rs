// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::coordinator::{EnvironmentSnapshot, HistoryEntry};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => self.emit("success", message, false),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit("warning", message, true),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => self.emit("error", message, true),
        }
    }

    /// Print environment state.
    pub fn environments(&self, active: &EnvironmentSnapshot, inactive: &EnvironmentSnapshot) {
        match self.mode {
            OutputMode::Normal => {
                for env in [active, inactive] {
                    println!(
                        "  {:<6} port {:<5} {:<8} {:<9} {}",
                        env.color,
                        env.port,
                        env.status,
                        env.health,
                        env.version.as_ref().map(|v| v.as_str()).unwrap_or("-")
                    );
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let value = serde_json::json!({
                    "event": "environments",
                    "active": active,
                    "inactive": inactive,
                });
                println!("{value}");
            }
        }
    }

    /// Print the deployment history.
    pub fn history(&self, entries: &[HistoryEntry]) {
        match self.mode {
            OutputMode::Normal => {
                println!("Deployment history:");
                for entry in entries {
                    println!(
                        "  {} {:<8} -> {:<5} {:<7} {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.kind,
                        entry.color,
                        entry.outcome,
                        entry.version.as_ref().map(|v| v.as_str()).unwrap_or("-")
                    );
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let value = serde_json::json!({ "event": "history", "entries": entries });
                println!("{value}");
            }
        }
    }

    fn emit(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: if self.start_time.is_some() {
                Some(self.elapsed_secs())
            } else {
                None
            },
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
