//! Typed wizard state and its transitions.
//!
//! `WorkflowState` holds both documents. Every change goes through
//! [`WorkflowState::apply`], which returns a new state and leaves the
//! original untouched, so a failed transition never leaves a half-written
//! document behind.

use serde::{Deserialize, Serialize};

use super::documents::{
    ApprovalMap, ApprovedImage, ImageRecord, ProductInfo, EXPECTED_IMAGE_COUNT,
};
use super::error::{FlowError, FlowResult};
use super::steps::{derive_step, Step, StepFlags};
use crate::core::{Details, UploadManifest};

/// A wizard transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The gateway returned a manifest
    UploadCompleted(UploadManifest),
    /// The seller decided on one image
    ApprovalChanged { image: String, decision: bool },
    /// Approve every image at once
    ApproveAll,
    /// Finalize the approved list and move to the preview
    Proceed,
    /// Replace the details with the edited mapping
    FinalizeDetails(Details),
    /// Drop all upload and approval state
    Reset,
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadCompleted(_) => "upload-completed",
            Self::ApprovalChanged { .. } => "approval-changed",
            Self::ApproveAll => "approve-all",
            Self::Proceed => "proceed",
            Self::FinalizeDetails(_) => "finalize-details",
            Self::Reset => "reset",
        }
    }
}

/// Both wizard documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The `productInfo` document
    pub product: ProductInfo,
    /// The `imageApprovals` document
    pub approvals: ApprovalMap,
}

impl WorkflowState {
    /// Create a state from its documents.
    pub fn new(product: ProductInfo, approvals: ApprovalMap) -> Self {
        Self { product, approvals }
    }

    /// Flags derived from the current documents.
    pub fn flags(&self) -> StepFlags {
        StepFlags::new(self.product.has_images(), !self.approvals.is_empty())
    }

    /// Step to show on load.
    pub fn derived_step(&self) -> Step {
        derive_step(self.flags())
    }

    /// Apply a transition and return the resulting state.
    pub fn apply(&self, action: Action) -> FlowResult<Self> {
        match action {
            Action::UploadCompleted(manifest) => Self::upload_completed(manifest),
            Action::ApprovalChanged { image, decision } => self.approval_changed(image, decision),
            Action::ApproveAll => Ok(self.approve_all()),
            Action::Proceed => self.proceed(),
            Action::FinalizeDetails(details) => {
                let mut next = self.clone();
                next.product.details = details;
                Ok(next)
            }
            Action::Reset => Ok(Self::default()),
        }
    }

    fn upload_completed(manifest: UploadManifest) -> FlowResult<Self> {
        let found = manifest.files.len();
        if found != EXPECTED_IMAGE_COUNT {
            return Err(FlowError::ImageCount { expected: EXPECTED_IMAGE_COUNT, found });
        }

        // A new upload replaces everything, including earlier decisions.
        Ok(Self::new(ProductInfo::from_manifest(manifest), ApprovalMap::new()))
    }

    fn approval_changed(&self, image: String, decision: bool) -> FlowResult<Self> {
        let record = self.product.image(&image).ok_or_else(|| FlowError::UnknownImage(image.clone()))?;

        if decision && !record.has_enhanced() {
            return Err(FlowError::EnhancementUnavailable(image));
        }

        let mut next = self.clone();
        next.approvals.set(image, decision);
        Ok(next)
    }

    fn approve_all(&self) -> Self {
        let mut next = self.clone();
        next.approvals = self
            .product
            .images
            .iter()
            .map(|img| (img.original.clone(), img.has_enhanced()))
            .collect();
        next.product.approved_images = approved_list(&self.product.images, &next.approvals);
        next
    }

    fn proceed(&self) -> FlowResult<Self> {
        if !self.approvals.any_approved() {
            return Err(FlowError::NoImageApproved);
        }

        let mut next = self.clone();
        next.product.approved_images = approved_list(&self.product.images, &self.approvals);
        Ok(next)
    }
}

/// Choose the enhanced file for approved images and the original otherwise.
///
/// Undecided images keep their original.
pub fn approved_list(images: &[ImageRecord], approvals: &ApprovalMap) -> Vec<ApprovedImage> {
    images
        .iter()
        .map(|img| ApprovedImage {
            original: img.original.clone(),
            approved: if approvals.is_approved(&img.original) {
                img.enhanced.clone()
            } else {
                img.original.clone()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisOutcome, ManifestFile};

    fn manifest(names: &[&str]) -> UploadManifest {
        UploadManifest {
            message: "ok".into(),
            files: names.iter().map(|n| ManifestFile::new(*n)).collect(),
            details: AnalysisOutcome::default(),
        }
    }

    fn uploaded() -> WorkflowState {
        WorkflowState::default()
            .apply(Action::UploadCompleted(manifest(&["1-a.png", "1-b.png", "1-c.png", "1-d.png"])))
            .unwrap()
    }

    #[test]
    fn test_upload_requires_four_images() {
        let err = WorkflowState::default()
            .apply(Action::UploadCompleted(manifest(&["1-a.png", "1-b.png"])))
            .unwrap_err();
        assert!(matches!(err, FlowError::ImageCount { expected: 4, found: 2 }));
    }

    #[test]
    fn test_upload_replaces_previous_decisions() {
        let decided = uploaded()
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: true })
            .unwrap();
        let again = decided
            .apply(Action::UploadCompleted(manifest(&["2-a.png", "2-b.png", "2-c.png", "2-d.png"])))
            .unwrap();

        assert!(again.approvals.is_empty());
        assert_eq!(again.product.images[0].original, "2-a.png");
    }

    #[test]
    fn test_approval_changed_does_not_touch_approved_list() {
        let state = uploaded()
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: true })
            .unwrap();
        assert!(state.product.approved_images.is_empty());
        assert_eq!(state.approvals.decision("1-a.png"), Some(true));
    }

    #[test]
    fn test_approval_of_unknown_image_fails() {
        let state = uploaded();
        let err = state
            .apply(Action::ApprovalChanged { image: "nope.png".into(), decision: true })
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownImage(_)));
    }

    #[test]
    fn test_apply_does_not_mutate_source() {
        let state = uploaded();
        let before = state.clone();
        let _ = state.apply(Action::ApproveAll).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_proceed_maps_approved_and_undecided() {
        let state = uploaded()
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: true })
            .unwrap()
            .apply(Action::ApprovalChanged { image: "1-c.png".into(), decision: false })
            .unwrap()
            .apply(Action::Proceed)
            .unwrap();

        let approved: Vec<_> =
            state.product.approved_images.iter().map(|a| a.approved.as_str()).collect();
        assert_eq!(approved, ["1-a-ai.png", "1-b.png", "1-c.png", "1-d.png"]);
    }

    #[test]
    fn test_proceed_without_approval_fails() {
        let state = uploaded()
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: false })
            .unwrap();
        assert!(matches!(state.apply(Action::Proceed), Err(FlowError::NoImageApproved)));
    }

    #[test]
    fn test_approve_all_skips_failed_enhancements() {
        let mut m = manifest(&["1-a.png", "1-b.png", "1-c.png", "1-d.png"]);
        m.files[1] = ManifestFile::new("1-b.png").with_failure("upstream");
        let state = WorkflowState::default()
            .apply(Action::UploadCompleted(m))
            .unwrap()
            .apply(Action::ApproveAll)
            .unwrap();

        assert_eq!(state.approvals.decision("1-b.png"), Some(false));
        assert_eq!(state.product.approved_images[1].approved, "1-b.png");
        assert_eq!(state.product.approved_images[0].approved, "1-a-ai.png");
    }

    #[test]
    fn test_approving_failed_enhancement_is_rejected() {
        let mut m = manifest(&["1-a.png", "1-b.png", "1-c.png", "1-d.png"]);
        m.files[0] = ManifestFile::new("1-a.png").with_failure("upstream");
        let state = WorkflowState::default().apply(Action::UploadCompleted(m)).unwrap();

        let err = state
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: true })
            .unwrap_err();
        assert!(matches!(err, FlowError::EnhancementUnavailable(_)));
        assert!(state
            .apply(Action::ApprovalChanged { image: "1-a.png".into(), decision: false })
            .is_ok());
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = uploaded().apply(Action::ApproveAll).unwrap().apply(Action::Reset).unwrap();
        assert_eq!(state, WorkflowState::default());
        assert_eq!(state.derived_step(), Step::Upload);
    }

    #[test]
    fn test_finalize_details_overwrites() {
        let mut details = Details::new();
        details.insert("title".into(), "Walnut desk".into());
        let state = uploaded().apply(Action::FinalizeDetails(details.clone())).unwrap();
        assert_eq!(state.product.details, details);
    }
}
