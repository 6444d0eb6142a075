//! Background component: the only part of the agent that talks to the backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::autofill::normalize::normalize_profile;
use crate::messaging::{Envelope, Request, Response};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the backend API.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Latest parsed profile, as stored by the backend.
    pub async fn fetch_register(&self) -> Result<Value, BackendError> {
        let url = format!("{}/api/v1/getRegister", self.base_url);
        debug!("GET {url}");
        let response = self.client.get(&url).send().await?;
        Self::json_body(response).await
    }

    /// Asks the backend to scan `page_url`. Accepts both `{fields: {...}}`
    /// and a bare selector map.
    pub async fn scrape(&self, page_url: &str) -> Result<Value, BackendError> {
        let url = format!("{}/api/v1/scrape", self.base_url);
        debug!("POST {url} for {page_url}");
        let response = self
            .client
            .post(&url)
            .json(&json!({ "url": page_url }))
            .send()
            .await?;
        let mut body = Self::json_body(response).await?;
        if let Some(fields) = body.get_mut("fields") {
            return Ok(fields.take());
        }
        Ok(body)
    }

    async fn json_body(response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[derive(Clone)]
pub struct BackgroundWorker {
    backend: Arc<BackendClient>,
}

impl BackgroundWorker {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Serves requests until every sender is gone. Requests are handled
    /// concurrently.
    pub async fn run(self, mut inbox: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = inbox.recv().await {
            let worker = self.clone();
            tokio::spawn(async move {
                let response = worker.handle(&envelope.request).await;
                envelope.respond(response);
            });
        }
        debug!("Background inbox closed");
    }

    pub async fn handle(&self, request: &Request) -> Response {
        match request {
            Request::FetchData => match self.backend.fetch_register().await {
                Ok(raw) => {
                    let data = normalize_profile(&raw);
                    info!("Fetched profile with {} key(s)", data.len());
                    Response::Data {
                        data: json!(data),
                    }
                }
                Err(e) => {
                    error!("Fetch data error: {e}");
                    Response::error(e.to_string())
                }
            },
            Request::ScrapeFields { url } => match self.backend.scrape(url).await {
                Ok(fields) => Response::Data {
                    data: json!({ "fields": fields }),
                },
                Err(e) => {
                    error!("Scrape fields error: {e}");
                    Response::error(e.to_string())
                }
            },
            Request::DynamicAutofill { .. } => {
                warn!("dynamicAutofill sent to the background component");
                Response::error("dynamicAutofill must be handled by the page component")
            }
        }
    }
}
