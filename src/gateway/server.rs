//! HTTP server.
//!
//! Routes:
//!
//! - `POST /api/upload-images` - multipart upload (`images`, `category`)
//! - `GET /uploads/original/:file`, `GET /uploads/ai/:file` - stored images
//! - anything else - JSON 404 listing the available routes

use std::convert::Infallible;
use std::time::Duration;

use bytes::BufMut;
use futures::TryStreamExt;
use serde::Serialize;
use warp::filters::BoxedFilter;
use warp::http::header::{HeaderMap, HeaderValue};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::path::FullPath;
use warp::reject::{LengthRequired, MethodNotAllowed, PayloadTooLarge};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use super::error::{error_response, GatewayError, GatewayResult};
use super::pipeline::{EnhancementPipeline, UploadRequest, UploadedImage};
use crate::core::{Config, ServerConfig};

/// Routes listed in the 404 body.
pub const AVAILABLE_ROUTES: [&str; 1] = ["POST /api/upload-images - Upload images"];

/// Multipart field carrying the images.
const IMAGES_FIELD: &str = "images";

/// Multipart field carrying the category label.
const CATEGORY_FIELD: &str = "category";

const CORS_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "OPTIONS"];
const CORS_HEADERS: [&str; 3] = ["Content-Type", "Authorization", "X-Requested-With"];
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// 404 body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotFoundBody {
    success: bool,
    message: String,
    available_routes: Vec<&'static str>,
}

/// Build every route, with CORS and security headers applied.
///
/// Without configured origins no CORS policy is applied, so cross-origin
/// requests reach the routes without CORS headers.
pub fn routes(pipeline: EnhancementPipeline, server: &ServerConfig) -> BoxedFilter<(Response,)> {
    let original_dir = pipeline.storage().original_dir().to_path_buf();
    let ai_dir = pipeline.storage().ai_dir().to_path_buf();

    let upload = warp::path!("api" / "upload-images")
        .and(warp::post())
        .and(warp::multipart::form().max_length(server.body_limit_bytes()))
        .and(with_pipeline(pipeline))
        .and_then(handle_upload);

    let originals = warp::path("uploads").and(warp::path("original")).and(warp::fs::dir(original_dir));
    let enhanced = warp::path("uploads").and(warp::path("ai")).and(warp::fs::dir(ai_dir));

    let not_found = warp::path::full().map(|path: FullPath| not_found_response(path.as_str()));

    let app = upload
        .or(originals)
        .or(enhanced)
        .recover(handle_rejection)
        .or(not_found)
        .with(warp::reply::with::headers(security_headers()))
        .map(Reply::into_response);

    match cors(&server.cors_origins) {
        Some(cors) => {
            app.with(cors).with(warp::trace::request()).map(Reply::into_response).boxed()
        }
        None => app.with(warp::trace::request()).map(Reply::into_response).boxed(),
    }
}

/// Run the gateway until Ctrl-C.
pub async fn serve(config: &Config, pipeline: EnhancementPipeline) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    pipeline.storage().ensure_dirs().await?;

    let routes = routes(pipeline, &config.server);
    let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })?;

    tracing::info!(addr = %bound, "Gateway listening");
    server.await;
    tracing::info!("Gateway stopped");

    Ok(())
}

fn with_pipeline(
    pipeline: EnhancementPipeline,
) -> impl Filter<Extract = (EnhancementPipeline,), Error = Infallible> + Clone {
    warp::any().map(move || pipeline.clone())
}

async fn handle_upload(
    form: FormData,
    pipeline: EnhancementPipeline,
) -> Result<Response, Infallible> {
    let result = match read_form(form, pipeline.max_files()).await {
        Ok(request) => pipeline.process(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(manifest) => Ok(warp::reply::json(&manifest).into_response()),
        Err(e) => {
            if e.status_code().is_server_error() {
                tracing::error!(error = %e, "Upload failed");
            } else {
                tracing::warn!(error = %e, "Upload rejected");
            }
            Ok(e.into_response())
        }
    }
}

/// Collect the multipart fields into an upload request.
///
/// Unknown fields are skipped.
async fn read_form(mut form: FormData, max_files: usize) -> GatewayResult<UploadRequest> {
    let mut request = UploadRequest::default();

    while let Some(part) = form.try_next().await.map_err(invalid_upload)? {
        let field = part.name().to_string();
        match field.as_str() {
            IMAGES_FIELD => {
                if request.images.len() >= max_files {
                    return Err(GatewayError::TooManyFiles { limit: max_files });
                }
                let client_name = part.filename().unwrap_or_default().to_string();
                let bytes = read_part(part).await?;
                request.images.push(UploadedImage::new(client_name, bytes));
            }
            CATEGORY_FIELD => {
                let bytes = read_part(part).await?;
                request.category = String::from_utf8_lossy(&bytes).trim().to_string();
            }
            other => tracing::debug!(field = other, "Ignoring multipart field"),
        }
    }

    Ok(request)
}

async fn read_part(part: Part) -> GatewayResult<Vec<u8>> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
        .map_err(invalid_upload)
}

fn invalid_upload(e: warp::Error) -> GatewayError {
    GatewayError::InvalidUpload(e.to_string())
}

/// Map framework rejections to JSON errors.
///
/// Not-found and wrong-method rejections fall through to the 404 route.
async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if err.is_not_found() || err.find::<MethodNotAllowed>().is_some() {
        return Err(warp::reject::not_found());
    }

    if err.find::<PayloadTooLarge>().is_some() {
        return Ok(GatewayError::PayloadTooLarge.into_response());
    }
    if err.find::<LengthRequired>().is_some() {
        return Ok(error_response(StatusCode::LENGTH_REQUIRED, "Content-Length required"));
    }

    tracing::warn!(rejection = ?err, "Rejected upload request");
    Ok(GatewayError::InvalidUpload("expected a multipart/form-data body".to_string()).into_response())
}

fn not_found_response(path: &str) -> Response {
    let body = NotFoundBody {
        success: false,
        message: format!("Route {path} not found"),
        available_routes: AVAILABLE_ROUTES.to_vec(),
    };
    warp::reply::with_status(warp::reply::json(&body), StatusCode::NOT_FOUND).into_response()
}

fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers
}

/// CORS policy for the configured origins.
///
/// Origins that do not parse as URLs are skipped. `None` when no valid
/// origin remains.
fn cors(origins: &[String]) -> Option<warp::cors::Builder> {
    let valid: Vec<String> = origins
        .iter()
        .filter_map(|raw| match reqwest::Url::parse(raw.trim()) {
            Ok(url) if url.origin().is_tuple() => Some(url.origin().ascii_serialization()),
            _ => {
                tracing::warn!(origin = %raw, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if valid.is_empty() {
        return None;
    }

    Some(
        warp::cors()
            .allow_origins(valid.iter().map(String::as_str))
            .allow_methods(CORS_METHODS)
            .allow_headers(CORS_HEADERS)
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE),
    )
}
