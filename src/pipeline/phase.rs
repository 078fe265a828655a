use serde::Serialize;
use std::fmt;

/// A state of the update pipeline.
///
/// ```text
/// Start -> Locating -> Deciding -> Skip -> Done
///                              \-> Fetching -> Installing -> Sweeping -> Done
/// (any) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Locating,
    Deciding,
    Skip,
    Fetching,
    Installing,
    Sweeping,
    Done,
    Failed,
}

impl Phase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether the pipeline may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if matches!(next, Self::Failed) {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Start, Self::Locating)
                | (Self::Locating, Self::Deciding)
                | (Self::Deciding, Self::Skip | Self::Fetching)
                | (Self::Skip, Self::Done)
                | (Self::Fetching, Self::Installing)
                | (Self::Installing, Self::Sweeping)
                | (Self::Sweeping, Self::Done)
        )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Locating => "locating",
            Self::Deciding => "deciding",
            Self::Skip => "skip",
            Self::Fetching => "fetching",
            Self::Installing => "installing",
            Self::Sweeping => "sweeping",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
