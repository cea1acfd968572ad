// ABOUTME: Validated domain types for blue/green deployments.
// ABOUTME: Slot colors, version tags, and status enums.

mod color;
mod status;
mod version;

pub use color::{Color, ParseColorError};
pub use status::{HealthStatus, Outcome, Status, SwitchKind};
pub use version::{Version, VersionError};
