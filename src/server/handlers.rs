//! Request handlers

use super::error::ApiError;
use super::AppState;
use crate::error::StyleTextError;
use crate::generate_styled_text;
use crate::types::Language;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const PERSISTED_HEADER: HeaderName = HeaderName::from_static("x-artifacts-persisted");

/// Fields of a `/generate` form
#[derive(Debug, Default)]
struct GenerateForm {
    image: Option<Vec<u8>>,
    text: Option<String>,
    language: Option<String>,
}

impl GenerateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("image") => form.image = Some(field.bytes().await?.to_vec()),
                Some("text") => form.text = Some(field.text().await?),
                Some("language") => form.language = Some(field.text().await?),
                other => debug!(field = ?other, "Ignoring unknown form field"),
            }
        }
        Ok(form)
    }
}

/// GET / - service metadata
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let (status, synthesizer) = match state.processor.processor() {
        Ok(processor) => ("ready", Some(processor.synthesizer_name().to_string())),
        Err(_) => ("unavailable", None),
    };

    Json(json!({
        "message": "StyleText Image Generation API",
        "endpoints": ["/generate (POST)"],
        "synthesizer": synthesizer,
        "status": status,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// POST /generate - render text in the style of the uploaded image
///
/// Pipeline:
/// 1. Refuse with 503 when the synthesizer failed to load
/// 2. Read `image`, `text` and `language` from the form (400 if invalid)
/// 3. Run the generation on the blocking pool
/// 4. Return the PNG with the request id
pub async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let processor = state.processor.processor().map_err(|e| {
        warn!("Generation refused: model unavailable");
        ApiError::from(e)
    })?;

    let form = GenerateForm::read(multipart).await?;
    let image = form
        .image
        .ok_or_else(|| StyleTextError::invalid_request("missing form field 'image'"))?;
    let text = form
        .text
        .ok_or_else(|| StyleTextError::invalid_request("missing form field 'text'"))?;
    let language = match form.language.as_deref() {
        None | Some("") => Language::default(),
        Some(tag) => tag.parse::<Language>()?,
    };

    let output = generate_styled_text(processor, image, text, language).await?;

    if let Some(reason) = &output.persistence_error {
        warn!(request_id = %output.request_id, reason = %reason, "Artifacts were not persisted");
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (REQUEST_ID_HEADER, output.request_id.to_string()),
            (PERSISTED_HEADER, output.artifacts_persisted().to_string()),
        ],
        output.png,
    )
        .into_response())
}
