//! Wizard step derivation.
//!
//! The active step and every step indicator are pure functions of two flags
//! computed from the persisted documents. Nothing here is stored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    /// Select and upload four images
    Upload,
    /// Approve or reject each enhanced image
    Approve,
    /// Final curated listing
    Preview,
}

impl Step {
    /// All steps in display order.
    pub const ALL: [Self; 3] = [Self::Upload, Self::Approve, Self::Preview];

    /// 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::Approve => 2,
            Self::Preview => 3,
        }
    }

    /// Step for a 1-based number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Upload),
            2 => Some(Self::Approve),
            3 => Some(Self::Preview),
            _ => None,
        }
    }

    /// Indicator title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Upload => "Upload Images",
            Self::Approve => "Review & Approve",
            Self::Preview => "Final Preview",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

/// Display status of a step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step done
    Completed,
    /// Step shown now
    Current,
    /// Reachable but not shown
    Pending,
    /// Not reachable yet
    Disabled,
}

impl StepStatus {
    /// Whether the indicator accepts clicks.
    pub fn is_clickable(self) -> bool {
        self != Self::Disabled
    }

    /// Short marker for terminal output.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Completed => "✓",
            Self::Current => "▶",
            Self::Pending => "·",
            Self::Disabled => "✗",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Current => "current",
            Self::Pending => "pending",
            Self::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// The two facts every step decision is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepFlags {
    /// ProductInfo has a non-empty image list
    pub has_images: bool,
    /// ApprovalMap has at least one key
    pub has_approvals: bool,
}

impl StepFlags {
    /// Create flags.
    pub fn new(has_images: bool, has_approvals: bool) -> Self {
        Self { has_images, has_approvals }
    }
}

/// Step to show when the wizard is (re)loaded.
pub fn derive_step(flags: StepFlags) -> Step {
    if !flags.has_images {
        Step::Upload
    } else if !flags.has_approvals {
        Step::Approve
    } else {
        Step::Preview
    }
}

/// Status of the indicator for `step`, given the active step.
pub fn step_status(step: Step, flags: StepFlags, active: Step) -> StepStatus {
    let by_active = if active == step { StepStatus::Current } else { StepStatus::Pending };

    match step {
        Step::Upload => {
            if flags.has_images {
                StepStatus::Completed
            } else {
                by_active
            }
        }
        Step::Approve => {
            if !flags.has_images {
                StepStatus::Disabled
            } else if flags.has_approvals {
                StepStatus::Completed
            } else {
                by_active
            }
        }
        Step::Preview => {
            if !flags.has_images || !flags.has_approvals {
                StepStatus::Disabled
            } else {
                by_active
            }
        }
    }
}

/// Whether clicking the indicator for `target` may switch to it.
pub fn can_navigate(target: Step, flags: StepFlags) -> bool {
    match target {
        Step::Upload => true,
        Step::Approve => flags.has_images,
        Step::Preview => flags.has_images && flags.has_approvals,
    }
}

/// All three indicators at once.
pub fn indicators(flags: StepFlags, active: Step) -> [(Step, StepStatus); 3] {
    Step::ALL.map(|step| (step, step_status(step, flags, active)))
}
