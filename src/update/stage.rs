use serde::Serialize;
use std::fmt;

/// Where an update run currently is.
///
/// ```text
/// Idle → CheckingVersion → UpToDate
///                        ↘ Stopping → BackingUp → Fetching → Extracting → Swapping
///                          → Restoring → ChangingOwnership → Starting → Done
/// ```
///
/// `Failed` is reachable from `CheckingVersion` (non-fatal check failure) and
/// from every step from `Stopping` onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStage {
    Idle,
    CheckingVersion,
    UpToDate,
    Stopping,
    BackingUp,
    Fetching,
    Extracting,
    Swapping,
    Restoring,
    ChangingOwnership,
    Starting,
    Done,
    Failed,
}

impl UpdateStage {
    /// Whether a run ends in this stage.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::UpToDate | Self::Done | Self::Failed)
    }

    /// Whether the install may have been modified by the time this stage is reached.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        !matches!(self, Self::Idle | Self::CheckingVersion | Self::UpToDate)
    }
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CheckingVersion => "checking version",
            Self::UpToDate => "up to date",
            Self::Stopping => "stopping server",
            Self::BackingUp => "backing up",
            Self::Fetching => "downloading",
            Self::Extracting => "extracting",
            Self::Swapping => "swapping install",
            Self::Restoring => "restoring user data",
            Self::ChangingOwnership => "changing ownership",
            Self::Starting => "starting server",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
