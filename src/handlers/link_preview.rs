use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::PreviewData;
use crate::state::AppState;

// ── Request ────────────────────────────────────────────────────────────────

/// Upper bound on the submitted text, in bytes.
const MAX_TEXT_BYTES: usize = 16 * 1024;

/// Free text to look for a link in, plus an optional fetch timeout.
#[derive(Debug, Deserialize, Validate)]
pub struct LinkPreviewRequest {
    pub text: String,
    #[validate(range(min = 1, max = 60000, message = "timeout_ms must be between 1 and 60000"))]
    pub timeout_ms: Option<u64>,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /link-preview?text=<encoded-text>&timeout_ms=<optional>
///
/// Always answers 200 with a possibly empty preview once the request is valid.
pub async fn get_link_preview(
    State(state): State<AppState>,
    Query(params): Query<LinkPreviewRequest>,
) -> AppResult<Json<PreviewData>> {
    preview(&state, params).await
}

/// POST /link-preview with `{"text": "...", "timeout_ms": 3000}`.
pub async fn post_link_preview(
    State(state): State<AppState>,
    Json(body): Json<LinkPreviewRequest>,
) -> AppResult<Json<PreviewData>> {
    preview(&state, body).await
}

fn validate_text(text: &str) -> AppResult<()> {
    if text.len() > MAX_TEXT_BYTES {
        return Err(AppError::Validation(format!(
            "text must be at most {MAX_TEXT_BYTES} bytes"
        )));
    }
    Ok(())
}

async fn preview(state: &AppState, req: LinkPreviewRequest) -> AppResult<Json<PreviewData>> {
    validate_text(&req.text)?;
    req.validate()?;

    let timeout = req
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(state.extractor.options().default_timeout);

    let preview = state.extractor.extract(&req.text, timeout).await;
    tracing::debug!(
        empty = preview.is_empty(),
        has_link = preview.link.is_some(),
        has_image = preview.image.is_some(),
        "Link preview built"
    );

    Ok(Json(preview))
}

// ── Unit tests ─────────────────────────────────────────────────────────────
