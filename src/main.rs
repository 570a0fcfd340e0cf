//! Product Studio - AI seller dashboard.
//!
//! `serve` runs the enhancement gateway. Every other subcommand drives the
//! seller wizard stored in a local state file.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use product_studio::client::GatewayClient;
use product_studio::core::{Config, DetailValue, FileStatus};
use product_studio::workflow::{
    ApprovalView, FlowSession, JsonFileStore, PreviewView, Step, UploadSelection,
    DEFAULT_CATEGORY, KNOWN_CATEGORIES,
};

/// Shown by approval commands before any upload.
const NO_IMAGES_NOTICE: &str = "No images uploaded yet.";

/// AI seller dashboard: studio-grade product photos and listing details
#[derive(Parser)]
#[command(name = "product-studio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Wizard state file (defaults to the data directory)
    #[arg(long, global = true, env = "PRODUCT_STUDIO_STATE")]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enhancement gateway
    #[cfg(feature = "server")]
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the wizard progress
    Status,

    /// Jump to a step (1 upload, 2 approve, 3 preview)
    Goto {
        /// Step number
        step: u8,
    },

    /// Upload exactly four product photos
    Upload {
        /// Image files (JPEG, PNG, WebP, BMP or TIFF)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Product category (auto-detect, furniture, home_decor, grocery)
        #[arg(short, long, default_value = DEFAULT_CATEGORY)]
        category: String,

        /// Gateway URL (defaults to the configured server)
        #[arg(long)]
        server: Option<String>,
    },

    /// Use the enhanced version of an image
    Approve {
        /// Stored original file name
        image: String,
    },

    /// Keep the original version of an image
    Reject {
        /// Stored original file name
        image: String,
    },

    /// Approve every enhanced image
    ApproveAll,

    /// Finalize the approvals and move to the preview
    Proceed,

    /// Show the extracted product details
    Details,

    /// Edit a product detail
    Detail {
        /// Detail key (e.g. title, color)
        key: String,

        /// New value (comma separated for lists)
        value: String,
    },

    /// Show the final curated listing
    Preview {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the uploaded images and approvals
    Clear,

    /// Start over from step 1
    Restart,

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env first so RUST_LOG set there is honored
    dotenvy::dotenv().ok();

    // Setup logging
    #[cfg(feature = "server")]
    let default_level = if matches!(cli.command, Commands::Serve { .. }) { "info" } else { "warn" };
    #[cfg(not(feature = "server"))]
    let default_level = "warn";

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let state = cli.state.as_deref();

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            cmd_serve(host, port)?;
        }
        Commands::Status => {
            cmd_status(state)?;
        }
        Commands::Goto { step } => {
            cmd_goto(state, step)?;
        }
        Commands::Upload { files, category, server } => {
            cmd_upload(state, &files, &category, server)?;
        }
        Commands::Approve { image } => {
            cmd_decide(state, &image, true)?;
        }
        Commands::Reject { image } => {
            cmd_decide(state, &image, false)?;
        }
        Commands::ApproveAll => {
            cmd_approve_all(state)?;
        }
        Commands::Proceed => {
            cmd_proceed(state)?;
        }
        Commands::Details => {
            cmd_details(state)?;
        }
        Commands::Detail { key, value } => {
            cmd_detail(state, &key, &value)?;
        }
        Commands::Preview { json } => {
            cmd_preview(state, json)?;
        }
        Commands::Clear => {
            cmd_clear(state)?;
        }
        Commands::Restart => {
            cmd_restart(state)?;
        }
        Commands::Config { path } => {
            cmd_config(path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Open the wizard session for the configured (or overridden) state file.
fn open_session(state: Option<&Path>, config: &Config) -> Result<FlowSession<JsonFileStore>> {
    let path = match state {
        Some(path) => path.to_path_buf(),
        None => config.state_file()?,
    };
    tracing::debug!(path = %path.display(), "Using state file");

    Ok(FlowSession::open(JsonFileStore::open(path))?)
}

/// Run the enhancement gateway.
#[cfg(feature = "server")]
fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    use std::sync::Arc;

    use anyhow::Context;

    use product_studio::gateway::{serve, EnhancementPipeline};
    use product_studio::GeminiClient;

    let mut config = Config::load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let gemini = Arc::new(
        GeminiClient::from_config(&config.gemini)
            .context("The gateway needs a Gemini API key (set GEMINI_API)")?,
    );
    let pipeline = EnhancementPipeline::from_config(&config, gemini.clone(), gemini);

    println!("Product Studio gateway on {}", config.server.local_url());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(&config, pipeline))
}

/// Show the step indicators and the image decisions.
fn cmd_status(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(state, &config)?;
    let active = session.active_step();

    println!("Step {} of 3: {}\n", active.number(), active.title());

    for (step, status) in session.indicators() {
        println!("  {} {:<22} {}", status.marker(), step.to_string(), status);
    }

    match session.approval_view() {
        ApprovalView::NoImages => {
            println!("\n{NO_IMAGES_NOTICE}");
        }
        ApprovalView::Ready(board) => {
            println!("\nImages:");
            for item in &board.items {
                let note = if item.image.enhancement_status == FileStatus::Failed {
                    " (enhancement failed)"
                } else {
                    ""
                };
                println!("  {:<40} {}{}", item.image.original, item.decision_label(), note);
            }
        }
    }

    Ok(())
}

/// Manually switch steps.
fn cmd_goto(state: Option<&Path>, step: u8) -> Result<()> {
    let target =
        Step::from_number(step).ok_or_else(|| anyhow::anyhow!("Unknown step: {step} (use 1-3)"))?;

    let config = Config::load()?;
    let mut session = open_session(state, &config)?;

    if session.navigate(target)? {
        println!("Now on {target}");
    } else {
        println!("{target} is not available yet");
    }

    Ok(())
}

/// Validate, upload and record four images.
fn cmd_upload(
    state: Option<&Path>,
    files: &[PathBuf],
    category: &str,
    server: Option<String>,
) -> Result<()> {
    if !KNOWN_CATEGORIES.iter().any(|(value, _)| *value == category) {
        tracing::warn!(category, "Category is not one of the suggested values");
    }

    let selection = UploadSelection::new(files, category)?;

    let config = Config::load()?;
    let mut session = open_session(state, &config)?;

    let client = GatewayClient::new(server.unwrap_or_else(|| config.server_url()))
        .with_timeout(config.upload_timeout())?;

    println!("Uploading {} images to {}...", selection.images().len(), client.base_url());

    let rt = tokio::runtime::Runtime::new()?;
    let manifest = rt.block_on(client.upload(&selection))?;

    let failed = manifest.failed_count();
    session.complete_upload(manifest)?;

    println!("Images uploaded and processed");
    if failed > 0 {
        println!("{failed} enhancement(s) failed, only the original is available for those");
    }
    println!("Review them with `product-studio status`");

    Ok(())
}

/// Approve or reject one image.
fn cmd_decide(state: Option<&Path>, image: &str, approve: bool) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    session.set_approval(image, approve)?;

    let verb = if approve { "Approved" } else { "Rejected" };
    println!("{verb} {image}");
    Ok(())
}

/// Approve every image that has an enhanced version.
fn cmd_approve_all(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    if matches!(session.approval_view(), ApprovalView::NoImages) {
        println!("{NO_IMAGES_NOTICE}");
        return Ok(());
    }
    session.approve_all()?;

    let approved = session.state().approvals.iter().filter(|(_, d)| *d).count();
    println!("Approved {approved} image(s)");
    Ok(())
}

/// Move on to the preview.
fn cmd_proceed(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    if matches!(session.approval_view(), ApprovalView::NoImages) {
        println!("{NO_IMAGES_NOTICE}");
        return Ok(());
    }

    session.proceed().map_err(|e| {
        if e.is_fatal() {
            anyhow::anyhow!("{e} The wizard was reset to step 1.")
        } else {
            e.into()
        }
    })?;

    println!("Listing ready, see `product-studio preview`");
    Ok(())
}

/// Print the product details.
fn cmd_details(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(state, &config)?;
    let details = &session.state().product.details;

    if details.is_empty() {
        println!("No product details yet.");
        return Ok(());
    }

    for (key, value) in details {
        let kind = match value {
            DetailValue::Text(_) => "",
            DetailValue::List(_) => " (list)",
        };
        println!("{key}{kind}: {}", value.display());
    }
    Ok(())
}

/// Edit one detail.
fn cmd_detail(state: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    if matches!(session.approval_view(), ApprovalView::NoImages) {
        println!("{NO_IMAGES_NOTICE}");
        return Ok(());
    }
    session.edit_detail(key, value)?;

    if let Some(updated) = session.state().product.details.get(key) {
        println!("{key}: {}", updated.display());
    }
    Ok(())
}

/// Print the curated listing.
fn cmd_preview(state: Option<&Path>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let session = open_session(state, &config)?;
    let view = session.preview(&config.server_url());

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    match view {
        PreviewView::NoApprovedImages => {
            println!("No Approved Images");
            println!("Start over with `product-studio restart`");
        }
        PreviewView::Listing(listing) => {
            println!("Main image: {}\n", listing.main_image);
            println!("Images:");
            for image in &listing.images {
                println!("  [{}] {}", image.folder.as_str(), image.url);
            }
            if !listing.details.is_empty() {
                println!("\nDetails:");
                for (key, value) in &listing.details {
                    println!("  {key}: {value}");
                }
            }
        }
    }
    Ok(())
}

/// Drop the documents.
fn cmd_clear(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    session.clear_all()?;
    println!("Cleared uploaded images and approvals");
    Ok(())
}

/// Reset the wizard.
fn cmd_restart(state: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let mut session = open_session(state, &config)?;
    session.restart()?;
    println!("Back to {}", Step::Upload);
    Ok(())
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "product-studio", &mut io::stdout());
}
