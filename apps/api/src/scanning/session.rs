//! Page access. The scanner only needs "go to a URL" and "give me the current
//! DOM snapshot"; everything else about the browser stays behind this seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use thiserror::Error;
use tracing::debug;

use crate::scanning::scanner::form_control_selector;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36";

const PRESENCE_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("navigation to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("navigation failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no page has been loaded in this session")]
    NotLoaded,

    #[error("failed to open browser session: {0}")]
    Launch(String),
}

/// Point in the page lifecycle at which navigation is considered done.
/// Scraping only needs the parsed DOM, not subresources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub timeout: Duration,
    pub wait_until: WaitUntil,
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<(), PageError>;

    /// Serialized DOM of the current page.
    async fn content(&self) -> Result<String, PageError>;
}

/// Opens one session per scrape request.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, PageError>;
}

/// Fetches pages over plain HTTP. The response body is the whole document,
/// so `DomContentLoaded` holds once it has been read.
pub struct HttpSessionFactory {
    client: Client,
}

impl HttpSessionFactory {
    pub fn new(user_agent: &str) -> Result<Self, PageError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| PageError::Launch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, PageError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            html: None,
        }))
    }
}

pub struct HttpSession {
    client: Client,
    html: Option<String>,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, options: &NavigateOptions) -> Result<(), PageError> {
        debug!("GET {url} (wait until {:?})", options.wait_until);

        let fetch = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PageError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok::<_, PageError>(response.text().await?)
        };

        let html = tokio::time::timeout(options.timeout, fetch)
            .await
            .map_err(|_| PageError::Timeout {
                url: url.to_string(),
                timeout_secs: options.timeout.as_secs(),
            })??;

        self.html = Some(html);
        Ok(())
    }

    async fn content(&self) -> Result<String, PageError> {
        self.html.clone().ok_or(PageError::NotLoaded)
    }
}

pub fn has_form_fields(html: &str) -> bool {
    let document = Html::parse_document(html);
    let controls = form_control_selector();
    let found = document.select(&controls).next().is_some();
    found
}

/// Polls the page until a form control shows up or `timeout` elapses.
/// Returns whether one was seen; callers proceed either way.
pub async fn wait_for_form_fields(session: &dyn BrowserSession, timeout: Duration) -> bool {
    let poll = async {
        loop {
            match session.content().await {
                Ok(html) if has_form_fields(&html) => return true,
                Ok(_) => {}
                Err(e) => {
                    debug!("Presence check aborted: {e}");
                    return false;
                }
            }
            tokio::time::sleep(PRESENCE_POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(timeout, poll).await.unwrap_or(false)
}
