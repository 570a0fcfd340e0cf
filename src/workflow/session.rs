//! Wizard session.
//!
//! `FlowSession` owns the [`WorkflowState`] and writes both documents back
//! to a [`StateStore`] after every successful transition. Step flags are
//! always derived from the documents, never tracked on their own.
//!
//! The active step is cached in the session (and mirrored to `flowStep` for
//! display), but every query falls back to the derived step when the cached
//! one is not reachable with the current documents.

use serde::de::DeserializeOwned;

use super::approval::ApprovalView;
use super::error::{FlowResult, StoreError};
use super::preview::PreviewView;
use super::state::{Action, WorkflowState};
use super::steps::{can_navigate, derive_step, indicators, step_status, Step, StepFlags, StepStatus};
use super::store::{StateStore, APPROVALS_KEY, FLOW_STEP_KEY, PRODUCT_INFO_KEY};
use crate::core::{DetailValue, UploadManifest};

/// A wizard session bound to a store.
#[derive(Debug)]
pub struct FlowSession<S: StateStore> {
    store: S,
    state: WorkflowState,
    active: Step,
}

impl<S: StateStore> FlowSession<S> {
    /// Load the documents from `store` and pick the step to show.
    ///
    /// Corrupt documents are treated as empty.
    pub fn open(store: S) -> FlowResult<Self> {
        let product = read_document(&store, PRODUCT_INFO_KEY)?;
        let approvals = read_document(&store, APPROVALS_KEY)?;
        let state = WorkflowState::new(product, approvals);
        let active = state.derived_step();

        let mut session = Self { store, state, active };
        session.write_step()?;

        tracing::debug!(step = %active, "Opened wizard session");
        Ok(session)
    }

    /// Current documents.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the session and return the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Flags derived from the documents.
    pub fn flags(&self) -> StepFlags {
        self.state.flags()
    }

    /// The step being shown.
    pub fn active_step(&self) -> Step {
        let flags = self.flags();
        if can_navigate(self.active, flags) {
            self.active
        } else {
            derive_step(flags)
        }
    }

    /// Status of a single indicator.
    pub fn step_status(&self, step: Step) -> StepStatus {
        step_status(step, self.flags(), self.active_step())
    }

    /// All three indicators.
    pub fn indicators(&self) -> [(Step, StepStatus); 3] {
        indicators(self.flags(), self.active_step())
    }

    /// Switch to `target` if its indicator allows it.
    ///
    /// Returns `false` (and changes nothing) otherwise.
    pub fn navigate(&mut self, target: Step) -> FlowResult<bool> {
        if !can_navigate(target, self.flags()) {
            tracing::debug!(target = %target, "Navigation ignored");
            return Ok(false);
        }

        self.active = target;
        self.write_step()?;
        Ok(true)
    }

    /// Store a new upload and move to the approval step.
    pub fn complete_upload(&mut self, manifest: UploadManifest) -> FlowResult<()> {
        self.transition(Action::UploadCompleted(manifest))?;
        self.active = Step::Approve;
        self.write_step()
    }

    /// Approve (`true`) or reject (`false`) a single image.
    pub fn set_approval(&mut self, image: &str, decision: bool) -> FlowResult<()> {
        self.transition(Action::ApprovalChanged { image: image.to_string(), decision })
    }

    /// Approve every image that has an enhanced version.
    ///
    /// Does nothing before an upload.
    pub fn approve_all(&mut self) -> FlowResult<()> {
        if self.no_images("approve-all") {
            return Ok(());
        }
        self.transition(Action::ApproveAll)
    }

    /// Finalize the approved list and move to the preview.
    ///
    /// Without any approved image the session is reset to the upload step
    /// and the error is returned for display. Does nothing before an upload.
    pub fn proceed(&mut self) -> FlowResult<()> {
        if self.no_images("proceed") {
            return Ok(());
        }

        match self.transition(Action::Proceed) {
            Ok(()) => {
                self.active = Step::Preview;
                self.write_step()
            }
            Err(e) if e.is_fatal() => {
                self.report_error(&e.to_string())?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the details with an edited mapping.
    ///
    /// Does nothing before an upload.
    pub fn finalize_details(&mut self, details: crate::core::Details) -> FlowResult<()> {
        if self.no_images("finalize-details") {
            return Ok(());
        }
        self.transition(Action::FinalizeDetails(details))
    }

    /// Edit a single detail, keeping the shape of the existing value.
    pub fn edit_detail(&mut self, key: &str, input: &str) -> FlowResult<()> {
        let mut details = self.state.product.details.clone();
        let value = match details.get(key) {
            Some(existing) => existing.edit(input),
            None => DetailValue::Text(input.to_string()),
        };
        details.insert(key.to_string(), value);
        self.finalize_details(details)
    }

    /// Remove both documents without touching the active step.
    ///
    /// The next query falls back to the upload step since nothing is
    /// reachable anymore.
    pub fn clear_all(&mut self) -> FlowResult<()> {
        self.store.remove(PRODUCT_INFO_KEY)?;
        self.store.remove(APPROVALS_KEY)?;
        self.state = WorkflowState::default();
        Ok(())
    }

    /// Wipe everything and go back to the upload step.
    pub fn restart(&mut self) -> FlowResult<()> {
        self.state = self.state.apply(Action::Reset)?;
        self.store.clear()?;
        self.active = Step::Upload;
        self.write_step()
    }

    /// Report an error raised during the approval step.
    ///
    /// Always forces a full reset.
    pub fn report_error(&mut self, message: &str) -> FlowResult<()> {
        tracing::warn!(error = %message, "Resetting wizard after error");
        self.restart()
    }

    /// View model for the approval step.
    pub fn approval_view(&self) -> ApprovalView {
        ApprovalView::from_state(&self.state)
    }

    /// View model for the preview step.
    pub fn preview(&self, base_url: &str) -> PreviewView {
        PreviewView::from_product(&self.state.product, base_url)
    }

    /// Whether the approval step is in its empty state, where operations
    /// are ignored.
    fn no_images(&self, operation: &str) -> bool {
        let empty = !self.state.product.has_images();
        if empty {
            tracing::debug!(operation, "Ignoring operation without uploaded images");
        }
        empty
    }

    fn transition(&mut self, action: Action) -> FlowResult<()> {
        let name = action.name();
        let next = self.state.apply(action)?;
        self.persist(&next)?;
        self.state = next;
        tracing::debug!(action = name, "Applied wizard transition");
        Ok(())
    }

    fn persist(&mut self, state: &WorkflowState) -> FlowResult<()> {
        let product = serde_json::to_string(&state.product).map_err(StoreError::from)?;
        let approvals = serde_json::to_string(&state.approvals).map_err(StoreError::from)?;
        self.store.set(PRODUCT_INFO_KEY, product)?;
        self.store.set(APPROVALS_KEY, approvals)?;
        Ok(())
    }

    fn write_step(&mut self) -> FlowResult<()> {
        let step = self.active_step();
        self.store.set(FLOW_STEP_KEY, step.number().to_string())?;
        Ok(())
    }
}

fn read_document<T, S>(store: &S, key: &str) -> FlowResult<T>
where
    T: DeserializeOwned + Default,
    S: StateStore,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(doc) => Ok(doc),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring corrupt document");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisOutcome, ManifestFile};
    use crate::workflow::error::FlowError;
    use crate::workflow::store::MemoryStore;

    fn manifest() -> UploadManifest {
        UploadManifest {
            message: "ok".into(),
            files: ["1-a.png", "1-b.png", "1-c.png", "1-d.png"]
                .iter()
                .map(|n| ManifestFile::new(*n))
                .collect(),
            details: AnalysisOutcome::default(),
        }
    }

    #[test]
    fn test_fresh_session_starts_at_upload() {
        let store = MemoryStore::new();
        let session = FlowSession::open(store.clone()).unwrap();
        assert_eq!(session.active_step(), Step::Upload);
        assert_eq!(store.get(FLOW_STEP_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_upload_moves_to_approve_and_persists() {
        let store = MemoryStore::new();
        let mut session = FlowSession::open(store.clone()).unwrap();
        session.complete_upload(manifest()).unwrap();

        assert_eq!(session.active_step(), Step::Approve);
        let reopened = FlowSession::open(store).unwrap();
        assert_eq!(reopened.active_step(), Step::Approve);
        assert_eq!(reopened.state().product.images.len(), 4);
    }

    #[test]
    fn test_navigation_respects_flags() {
        let mut session = FlowSession::open(MemoryStore::new()).unwrap();
        assert!(!session.navigate(Step::Preview).unwrap());
        assert!(!session.navigate(Step::Approve).unwrap());
        assert!(session.navigate(Step::Upload).unwrap());

        session.complete_upload(manifest()).unwrap();
        assert!(session.navigate(Step::Upload).unwrap());
        assert_eq!(session.active_step(), Step::Upload);
        assert_eq!(session.step_status(Step::Upload), StepStatus::Completed);
    }

    #[test]
    fn test_proceed_without_approval_resets() {
        let store = MemoryStore::new();
        let mut session = FlowSession::open(store.clone()).unwrap();
        session.complete_upload(manifest()).unwrap();
        session.set_approval("1-a.png", false).unwrap();

        let err = session.proceed().unwrap_err();
        assert!(matches!(err, FlowError::NoImageApproved));
        assert_eq!(session.active_step(), Step::Upload);
        assert!(store.get(PRODUCT_INFO_KEY).unwrap().is_none());
        assert_eq!(store.get(FLOW_STEP_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_unknown_image_keeps_state() {
        let mut session = FlowSession::open(MemoryStore::new()).unwrap();
        session.complete_upload(manifest()).unwrap();
        assert!(session.set_approval("nope.png", true).is_err());
        assert_eq!(session.active_step(), Step::Approve);
    }

    #[test]
    fn test_clear_all_falls_back_to_upload() {
        let store = MemoryStore::new();
        let mut session = FlowSession::open(store.clone()).unwrap();
        session.complete_upload(manifest()).unwrap();
        session.clear_all().unwrap();

        assert_eq!(session.active_step(), Step::Upload);
        assert!(store.get(APPROVALS_KEY).unwrap().is_none());
        assert!(matches!(session.approval_view(), ApprovalView::NoImages));
    }

    #[test]
    fn test_corrupt_documents_are_empty() {
        let mut store = MemoryStore::new();
        store.set(PRODUCT_INFO_KEY, "{broken".into()).unwrap();
        store.set(APPROVALS_KEY, r#"{"1-a.png":true}"#.into()).unwrap();

        let session = FlowSession::open(store).unwrap();
        assert!(!session.state().product.has_images());
        assert_eq!(session.active_step(), Step::Upload);
    }

    #[test]
    fn test_proceed_without_images_is_ignored() {
        let mut store = MemoryStore::new();
        store.set("sellerNote", "keep me".into()).unwrap();
        let mut session = FlowSession::open(store.clone()).unwrap();

        session.proceed().unwrap();

        assert_eq!(store.get("sellerNote").unwrap().as_deref(), Some("keep me"));
        assert_eq!(store.get(FLOW_STEP_KEY).unwrap().as_deref(), Some("1"));
        assert_eq!(session.active_step(), Step::Upload);
    }

    #[test]
    fn test_editing_without_images_writes_nothing() {
        let store = MemoryStore::new();
        let mut session = FlowSession::open(store.clone()).unwrap();

        session.edit_detail("title", "Lamp").unwrap();
        session.approve_all().unwrap();

        assert!(store.get(PRODUCT_INFO_KEY).unwrap().is_none());
        assert!(store.get(APPROVALS_KEY).unwrap().is_none());
        assert!(session.state().product.details.is_empty());
        assert!(matches!(session.approval_view(), ApprovalView::NoImages));
    }

    #[test]
    fn test_edit_detail_keeps_list_shape() {
        let mut m = manifest();
        let mut details = crate::core::Details::new();
        details.insert("recommendations".into(), DetailValue::List(vec!["Den".into()]));
        m.details = AnalysisOutcome::Details(details);

        let mut session = FlowSession::open(MemoryStore::new()).unwrap();
        session.complete_upload(m).unwrap();
        session.edit_detail("recommendations", "Office , Studio").unwrap();
        session.edit_detail("title", "Desk").unwrap();

        let details = &session.state().product.details;
        assert_eq!(
            details["recommendations"],
            DetailValue::List(vec!["Office".into(), "Studio".into()])
        );
        assert_eq!(details["title"], DetailValue::Text("Desk".into()));
    }
}
