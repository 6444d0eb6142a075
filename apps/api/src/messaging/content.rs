//! Page component: owns the live document and answers `dynamicAutofill`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::autofill::document::LiveDocument;
use crate::autofill::reconciler::{Reconciler, OBSERVATION_WINDOW};
use crate::messaging::{Envelope, MessageSender, Request, Response};
use crate::models::form::{AutofillReport, FieldCategory, SelectorMap};
use crate::models::profile::ProfileData;

pub struct ContentWorker<D> {
    document: Arc<D>,
    background: MessageSender,
    window: Duration,
    /// Receives each run's report once its observation window closes.
    reports: Option<mpsc::Sender<AutofillReport>>,
}

impl<D> Clone for ContentWorker<D> {
    fn clone(&self) -> Self {
        Self {
            document: Arc::clone(&self.document),
            background: self.background.clone(),
            window: self.window,
            reports: self.reports.clone(),
        }
    }
}

impl<D: LiveDocument + 'static> ContentWorker<D> {
    pub fn new(document: Arc<D>, background: MessageSender) -> Self {
        Self {
            document,
            background,
            window: OBSERVATION_WINDOW,
            reports: None,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_report_sink(mut self, sink: mpsc::Sender<AutofillReport>) -> Self {
        self.reports = Some(sink);
        self
    }

    pub async fn run(self, mut inbox: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = inbox.recv().await {
            let worker = self.clone();
            tokio::spawn(async move {
                let response = worker.handle(&envelope.request).await;
                envelope.respond(response);
            });
        }
        debug!("Content inbox closed");
    }

    pub async fn handle(&self, request: &Request) -> Response {
        match request {
            Request::DynamicAutofill { fields } => self.dynamic_autofill(fields).await,
            other => {
                warn!("Page component ignores {other:?}");
                Response::error("Unsupported action for the page component")
            }
        }
    }

    /// Fetches the profile through the background component, then runs the
    /// reconciler. Replies with the immediate-pass report; the deferred pass
    /// keeps running after the reply.
    async fn dynamic_autofill(&self, fields: &BTreeMap<String, String>) -> Response {
        info!("Received dynamicAutofill request for {} field(s)", fields.len());

        let data = match self.background.send(Request::FetchData).await {
            Ok(Response::Data { data }) => into_profile(data),
            Ok(Response::Error { error }) => {
                error!("Fetch data error in autofill: {error}");
                return Response::Error { error };
            }
            Ok(other) => {
                error!("Unexpected fetchData response: {other:?}");
                return Response::error("Unexpected response to fetchData");
            }
            Err(e) => {
                error!("Background component unavailable: {e}");
                return Response::error(e.to_string());
            }
        };

        if fields.is_empty() {
            warn!("No fields provided for autofill");
            return Response::error("No fields provided for autofill");
        }

        let selectors = parse_selectors(fields);
        let session = Reconciler::new(Arc::clone(&self.document))
            .with_window(self.window)
            .reconcile(data, selectors);
        let response = Response::from_report(session.initial_report());

        let sink = self.reports.clone();
        tokio::spawn(async move {
            let report = session.finished().await;
            info!(
                "Autofill finished: filled={:?}, unfilled={:?}",
                report.filled, report.unfilled
            );
            if let Some(sink) = sink {
                if sink.send(report).await.is_err() {
                    debug!("Report sink closed");
                }
            }
        });

        response
    }
}

fn into_profile(data: Value) -> ProfileData {
    match data {
        Value::Object(map) => map.into_iter().collect(),
        _ => ProfileData::new(),
    }
}

fn parse_selectors(fields: &BTreeMap<String, String>) -> SelectorMap {
    fields
        .iter()
        .filter_map(|(key, selector)| match key.parse::<FieldCategory>() {
            Ok(category) => Some((category, selector.clone())),
            Err(e) => {
                warn!("Skipping field: {e}");
                None
            }
        })
        .collect()
}
