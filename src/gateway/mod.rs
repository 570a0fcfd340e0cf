//! Enhancement gateway.
//!
//! Accepts up to four product photos, stores them, asks the image model for
//! an enhanced version of each, extracts listing details from the first one
//! and returns a manifest.

mod details_log;
mod error;
mod pipeline;
mod server;
mod storage;

pub use details_log::{DetailsLog, DETAILS_LOG_FILE};
pub use error::{GatewayError, GatewayResult};
pub use pipeline::{EnhancementPipeline, UploadRequest, UploadedImage, SUCCESS_MESSAGE};
pub use server::{routes, serve, AVAILABLE_ROUTES};
pub use storage::UploadStorage;
