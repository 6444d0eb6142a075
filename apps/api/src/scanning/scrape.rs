use std::time::Duration;

use scraper::Html;
use tracing::{debug, info, warn};

use crate::models::form::SelectorMap;
use crate::scanning::classifier::FieldClassifier;
use crate::scanning::scanner::scan;
use crate::scanning::session::{
    wait_for_form_fields, NavigateOptions, PageError, SessionFactory, WaitUntil,
};

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub navigation_timeout: Duration,
    pub field_wait_timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            field_wait_timeout: Duration::from_secs(5),
        }
    }
}

/// Opens a session, loads `url`, and classifies the form controls on it.
///
/// Navigation failures are returned as-is; there is no retry.
pub async fn scrape_form_fields(
    sessions: &dyn SessionFactory,
    classifier: &FieldClassifier,
    url: &str,
    options: &ScrapeOptions,
) -> Result<SelectorMap, PageError> {
    let mut session = sessions.open().await?;

    info!("Navigating to {url}");
    session
        .navigate(
            url,
            &NavigateOptions {
                timeout: options.navigation_timeout,
                wait_until: WaitUntil::DomContentLoaded,
            },
        )
        .await?;

    if !wait_for_form_fields(session.as_ref(), options.field_wait_timeout).await {
        warn!("No form fields found on {url}");
    }

    let html = session.content().await?;
    let fields = classify_snapshot(classifier, &html);
    info!("Matched {} field(s) on {url}", fields.len());
    Ok(fields)
}

pub fn classify_snapshot(classifier: &FieldClassifier, html: &str) -> SelectorMap {
    let document = Html::parse_document(html);
    let elements = scan(&document);
    debug!("Scanned {} form control(s)", elements.len());
    classifier.classify(&elements)
}
