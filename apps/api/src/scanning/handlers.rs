//! Axum route handler for form scraping.

use axum::{extract::State, Json};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::form::SelectorMap;
use crate::scanning::scrape::scrape_form_fields;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub fields: SelectorMap,
}

/// POST /api/v1/scrape
///
/// Loads the page at `url` and returns the selector bound to each recognised
/// field category.
pub async fn handle_scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let url = validate_page_url(&request.url)?;

    let fields = scrape_form_fields(
        state.sessions.as_ref(),
        &state.classifier,
        url.as_str(),
        &state.config.scrape_options(),
    )
    .await?;

    Ok(Json(ScrapeResponse {
        success: true,
        fields,
    }))
}

fn validate_page_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::Validation(format!("Invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::Validation(format!(
            "Unsupported URL scheme '{scheme}', expected http or https"
        ))),
    }
}
