//! # Product Studio
//!
//! AI seller dashboard - turn four product snapshots into studio-grade photos
//! and a ready-to-edit listing.
//!
//! Two halves talk over HTTP:
//!
//! - **Enhancement gateway** (`product-studio serve`): stores the uploads,
//!   asks Gemini for enhanced versions and listing details, returns a manifest.
//! - **Seller wizard** (every other subcommand): upload, approve each
//!   enhancement, then preview the curated listing. Progress is kept in a
//!   small JSON state file so the wizard survives restarts.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the gateway
//! GEMINI_API=... product-studio serve
//!
//! # Upload four photos
//! product-studio upload a.jpg b.jpg c.jpg d.jpg --category furniture
//!
//! # Review
//! product-studio approve-all && product-studio proceed && product-studio preview
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_precision_loss)]

pub mod ai;
pub mod client;
pub mod core;
pub mod workflow;

#[cfg(feature = "server")]
pub mod gateway;

// Re-export commonly used types
pub use ai::{AIError, GeminiClient, ImageEnhancer, ImageInput, ProductAnalyzer};
pub use client::GatewayClient;
pub use core::{AnalysisOutcome, Config, DetailValue, Details, ManifestFile, UploadManifest};
pub use workflow::{FlowError, FlowSession, JsonFileStore, MemoryStore, StateStore, Step};

#[cfg(feature = "server")]
pub use gateway::{EnhancementPipeline, GatewayError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "product-studio";
