//! Approval editor view model.

use serde::Serialize;

use super::documents::ImageRecord;
use super::state::WorkflowState;
use crate::core::Details;

/// What the approval step shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ApprovalView {
    /// Nothing was uploaded. Terminal state, nothing else happens here.
    NoImages,
    /// Images ready for review
    Ready(ApprovalBoard),
}

/// Review board for the uploaded images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalBoard {
    /// Images in upload order with their decisions
    pub items: Vec<ApprovalItem>,
    /// Editable details
    pub details: Details,
    /// Whether the proceed action is offered (any decision recorded)
    pub can_proceed: bool,
}

/// One image and its current decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalItem {
    /// The uploaded image
    pub image: ImageRecord,
    /// `Some(true)` approved, `Some(false)` rejected, `None` undecided
    pub decision: Option<bool>,
}

impl ApprovalItem {
    /// Label for the decision.
    pub fn decision_label(&self) -> &'static str {
        match self.decision {
            Some(true) => "approved",
            Some(false) => "rejected",
            None => "undecided",
        }
    }
}

impl ApprovalView {
    /// Build the view from the wizard state.
    pub fn from_state(state: &WorkflowState) -> Self {
        if !state.product.has_images() {
            return Self::NoImages;
        }

        let items = state
            .product
            .images
            .iter()
            .map(|image| ApprovalItem {
                image: image.clone(),
                decision: state.approvals.decision(&image.original),
            })
            .collect();

        Self::Ready(ApprovalBoard {
            items,
            details: state.product.details.clone(),
            can_proceed: !state.approvals.is_empty(),
        })
    }
}
