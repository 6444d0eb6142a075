use std::sync::Arc;

use crate::config::Config;
use crate::extraction::ResumeExtractor;
use crate::register::ProfileRegister;
use crate::scanning::{FieldClassifier, SessionFactory};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Immutable rule set; built once at startup.
    pub extractor: Arc<ResumeExtractor>,
    pub classifier: Arc<FieldClassifier>,
    /// Page access for scraping. Default: plain HTTP fetch.
    pub sessions: Arc<dyn SessionFactory>,
    pub register: ProfileRegister,
}
