//! Axum route handler for resume uploads.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::pdf::pdf_to_text;
use crate::models::profile::CandidateProfile;
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResumeResponse {
    pub file_name: String,
    pub raw_text: String,
    pub contact_info: CandidateProfile,
}

struct ResumeUpload {
    file_name: String,
    bytes: Vec<u8>,
}

/// POST /api/v1/parse-resume
///
/// Accepts a multipart `resume` PDF, extracts its text and contact details,
/// and stores the profile in the register for later autofill.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let upload = read_resume_field(&mut multipart).await?;
    info!(
        "Parsing resume '{}' ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let bytes = upload.bytes;
    let raw_text = match tokio::task::spawn_blocking(move || pdf_to_text(&bytes)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Resume parsing failed: {e}");
            return Err(AppError::UnprocessableEntity(format!(
                "Resume parsing failed: {e}"
            )));
        }
        Err(e) if e.is_panic() => {
            warn!("PDF decoder panicked on '{}'", upload.file_name);
            return Err(AppError::UnprocessableEntity(
                "Resume parsing failed: malformed PDF".to_string(),
            ));
        }
        Err(e) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "PDF extraction task failed: {e}"
            )))
        }
    };

    let contact_info = state.extractor.extract(&raw_text);
    state.register.store(&contact_info).await;

    Ok(Json(ParseResumeResponse {
        file_name: upload.file_name,
        raw_text,
        contact_info,
    }))
}

async fn read_resume_field(multipart: &mut Multipart) -> Result<ResumeUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        if field.content_type() != Some(PDF_MIME) {
            return Err(AppError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        return Ok(ResumeUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::Validation(format!(
        "Missing '{RESUME_FIELD}' file field"
    )))
}
