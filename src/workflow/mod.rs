//! Seller wizard.
//!
//! Three steps (upload, approve, preview) driven by two persisted documents.
//!
//! ## Documents
//!
//! - `productInfo` - uploaded images, extracted details, approved list
//! - `imageApprovals` - per-image decision (enhanced or original)
//!
//! ## Flow
//!
//! - `UploadSelection` - validates the four images before sending them
//! - `FlowSession` - applies transitions and persists the documents
//! - `ApprovalView` / `PreviewView` - what each step shows

mod approval;
mod documents;
mod error;
mod preview;
mod session;
mod state;
mod steps;
mod store;
mod upload;

pub use approval::{ApprovalBoard, ApprovalItem, ApprovalView};
pub use documents::{ApprovalMap, ApprovedImage, ImageRecord, ProductInfo, EXPECTED_IMAGE_COUNT};
pub use error::{FlowError, FlowResult, StoreError, UploadError};
pub use preview::{image_url, ImageFolder, Listing, ListingImage, PreviewView};
pub use session::FlowSession;
pub use state::{approved_list, Action, WorkflowState};
pub use steps::{
    can_navigate, derive_step, indicators, step_status, Step, StepFlags, StepStatus,
};
pub use store::{
    JsonFileStore, MemoryStore, StateStore, StoreResult, APPROVALS_KEY, FLOW_STEP_KEY,
    PRODUCT_INFO_KEY,
};
pub use upload::{SelectedImage, UploadSelection, DEFAULT_CATEGORY, KNOWN_CATEGORIES};
