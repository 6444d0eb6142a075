//! Autofill Reconciler: writes candidate data into the elements a
//! `SelectorMap` points at, then keeps retrying unfilled categories while the
//! page mutates, for a bounded window.
//!
//! Lifecycle: `Idle → ImmediateFill → Observing → Finalized`. Observing is
//! skipped when the immediate pass fills everything, and ends only on window
//! expiry or `AutofillSession::cancel`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::autofill::document::{DomError, DomEvent, ElementHandle, LiveDocument, MutationObserver};
use crate::autofill::fallback::fallback_selectors;
use crate::autofill::normalize::fillable_value;
use crate::models::form::{AutofillReport, FieldCategory, SelectorMap};
use crate::models::profile::ProfileData;

pub const OBSERVATION_WINDOW: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ReconcilerPhase {
    Idle,
    ImmediateFill,
    Observing,
    Finalized,
}

/// Forward-only phase tracker shared with the observation task.
#[derive(Clone)]
struct PhaseCell(Arc<Mutex<ReconcilerPhase>>);

impl PhaseCell {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(ReconcilerPhase::Idle)))
    }

    fn get(&self) -> ReconcilerPhase {
        *lock(&self.0)
    }

    fn advance(&self, next: ReconcilerPhase) {
        let mut phase = lock(&self.0);
        if next > *phase {
            debug!("Reconciler {:?} -> {:?}", *phase, next);
            *phase = next;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct Reconciler<D> {
    document: Arc<D>,
    window: Duration,
}

impl<D: LiveDocument + 'static> Reconciler<D> {
    pub fn new(document: Arc<D>) -> Self {
        Self {
            document,
            window: OBSERVATION_WINDOW,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Runs the immediate pass and, if anything is left unfilled, starts the
    /// deferred pass on the current tokio runtime.
    pub fn reconcile(&self, data: ProfileData, selectors: SelectorMap) -> AutofillSession {
        let phase = PhaseCell::new();
        // Subscribe before the first write so no mutation slips between passes.
        let mut observer = MutationObserver::observe(self.document.as_ref());
        let fill = FillContext {
            document: Arc::clone(&self.document),
            data,
            selectors,
        };

        phase.advance(ReconcilerPhase::ImmediateFill);
        let mut report = AutofillReport::default();
        for &category in fill.selectors.keys() {
            match fill.immediate_fill(category) {
                Ok(true) => report.mark_filled(category),
                Ok(false) => report.mark_unfilled(category),
                Err(e) => {
                    error!("Error filling field \"{category}\": {e}");
                    report.mark_unfilled(category);
                }
            }
        }
        info!(
            "Autofill summary: filled={}, unfilled={}",
            report.filled.len(),
            report.unfilled.len()
        );

        let initial = report.clone();
        let shared = Arc::new(Mutex::new(report));

        if initial.unfilled.is_empty() {
            observer.disconnect();
            phase.advance(ReconcilerPhase::Finalized);
            return AutofillSession {
                initial,
                report: shared,
                phase,
                cancel: None,
                task: None,
            };
        }

        phase.advance(ReconcilerPhase::Observing);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(observe_dynamic_fields(
            fill,
            observer,
            Arc::clone(&shared),
            cancel_rx,
            self.window,
            phase.clone(),
        ));

        AutofillSession {
            initial,
            report: shared,
            phase,
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }
}

/// Handle on one reconciliation run.
///
/// Dropping the session does not stop the deferred pass; it runs to the end
/// of its window.
pub struct AutofillSession {
    initial: AutofillReport,
    report: Arc<Mutex<AutofillReport>>,
    phase: PhaseCell,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl AutofillSession {
    /// Report as it stood right after the immediate pass.
    pub fn initial_report(&self) -> &AutofillReport {
        &self.initial
    }

    pub fn report(&self) -> AutofillReport {
        lock(&self.report).clone()
    }

    pub fn phase(&self) -> ReconcilerPhase {
        self.phase.get()
    }

    /// Ends the observation window early.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Waits for the observation window to close and returns the final report.
    pub async fn finished(mut self) -> AutofillReport {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Dynamic field observer failed: {e}");
            }
        }
        self.phase.advance(ReconcilerPhase::Finalized);
        self.report()
    }
}

struct FillContext<D> {
    document: Arc<D>,
    data: ProfileData,
    selectors: SelectorMap,
}

impl<D: LiveDocument> FillContext<D> {
    fn value_for(&self, category: FieldCategory) -> Option<String> {
        self.data.get(category.key()).and_then(fillable_value)
    }

    /// Primary selector first, then the fallback chain. Selector errors only
    /// skip to the next candidate.
    fn resolve(&self, category: FieldCategory) -> Option<ElementHandle> {
        let primary = self
            .selectors
            .get(&category)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        match primary {
            Some(selector) => match self.document.query_selector(selector) {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(e) => warn!("Invalid selector for \"{category}\": {e}"),
            },
            None => warn!("Empty selector for \"{category}\""),
        }

        let fallbacks = fallback_selectors(category.key());
        for selector in &fallbacks {
            match self.document.query_selector(selector) {
                Ok(Some(element)) => {
                    debug!("Resolved \"{category}\" via fallback {selector}");
                    return Some(element);
                }
                Ok(None) => {}
                Err(e) => warn!("Invalid fallback selector for \"{category}\": {e}"),
            }
        }

        debug!(
            "No element for \"{category}\", tried fallbacks: {}",
            fallbacks.join(", ")
        );
        None
    }

    fn immediate_fill(&self, category: FieldCategory) -> Result<bool, DomError> {
        let element = self.resolve(category);
        let value = self.value_for(category);
        match (element, value) {
            (Some(element), Some(value)) => {
                self.write(&element, &value)?;
                info!("Filled field \"{category}\" with value \"{value}\"");
                Ok(true)
            }
            (element, value) => {
                warn!(
                    "Field \"{category}\" left unfilled (element found: {}, data present: {})",
                    element.is_some(),
                    value.is_some()
                );
                Ok(false)
            }
        }
    }

    /// Same as the immediate fill, but never overwrites a non-empty field.
    fn deferred_fill(&self, category: FieldCategory) -> Result<bool, DomError> {
        let Some(value) = self.value_for(category) else {
            return Ok(false);
        };
        let Some(element) = self.resolve(category) else {
            return Ok(false);
        };
        if !self.document.value(&element)?.is_empty() {
            return Ok(false);
        }
        self.write(&element, &value)?;
        info!("Dynamic: filled field \"{category}\" with value \"{value}\"");
        Ok(true)
    }

    /// Once the value is set the write counts, even if an event fails.
    fn write(&self, element: &ElementHandle, value: &str) -> Result<(), DomError> {
        self.document.set_value(element, value)?;
        for event in [DomEvent::Input, DomEvent::Change] {
            if let Err(e) = self.document.dispatch_event(element, event) {
                warn!("Failed to dispatch {event:?} event: {e}");
            }
        }
        Ok(())
    }

    fn retry_unfilled(&self, report: &Mutex<AutofillReport>) {
        let pending: Vec<FieldCategory> = lock(report).unfilled.iter().copied().collect();
        for category in pending {
            match self.deferred_fill(category) {
                Ok(true) => lock(report).mark_filled(category),
                Ok(false) => {}
                Err(e) => error!("Dynamic fill error for \"{category}\": {e}"),
            }
        }
    }
}

async fn observe_dynamic_fields<D: LiveDocument>(
    fill: FillContext<D>,
    mut observer: MutationObserver,
    report: Arc<Mutex<AutofillReport>>,
    mut cancel: oneshot::Receiver<()>,
    window: Duration,
    phase: PhaseCell,
) {
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);
    let mut cancel_armed = true;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                debug!("Observation window of {}s elapsed", window.as_secs());
                break;
            }
            signal = &mut cancel, if cancel_armed => {
                if signal.is_ok() {
                    debug!("Observation cancelled");
                    break;
                }
                // Session dropped: nobody can cancel any more, keep observing.
                cancel_armed = false;
            }
            batch = observer.next_batch(), if observer.is_connected() => {
                if let Some(records) = batch {
                    debug!("Mutation batch of {records} record(s)");
                    fill.retry_unfilled(&report);
                    if lock(&report).is_complete() {
                        debug!("All fields filled; waiting out the window");
                    }
                }
            }
        }
    }

    observer.disconnect();
    phase.advance(ReconcilerPhase::Finalized);
    let report = lock(&report);
    info!(
        "Stopped observing for dynamic fields: filled={}, unfilled={}",
        report.filled.len(),
        report.unfilled.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::document::MemoryDocument;
    use serde_json::json;

    fn data(pairs: &[(&str, serde_json::Value)]) -> ProfileData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn selectors(pairs: &[(FieldCategory, &str)]) -> SelectorMap {
        pairs.iter().map(|(c, s)| (*c, s.to_string())).collect()
    }

    #[tokio::test]
    async fn test_immediate_fill_of_present_element() {
        let doc = Arc::new(MemoryDocument::new(
            r#"<html><body><input id="email-input"></body></html>"#,
        ));
        let session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("email", json!("a@b.com"))]),
            selectors(&[(FieldCategory::Email, "#email-input")]),
        );

        assert_eq!(session.phase(), ReconcilerPhase::Finalized);
        let report = session.finished().await;
        assert!(report.filled.contains(&FieldCategory::Email));
        assert!(report.unfilled.is_empty());
        assert_eq!(doc.value_of("#email-input").as_deref(), Some("a@b.com"));
        assert_eq!(
            doc.events_for("#email-input"),
            vec![DomEvent::Input, DomEvent::Change]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_pass_fills_element_added_later() {
        let doc = Arc::new(MemoryDocument::new(
            r#"<html><body><form id="apply"></form></body></html>"#,
        ));
        let session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("email", json!("a@b.com"))]),
            selectors(&[(FieldCategory::Email, "#email-input")]),
        );
        assert!(session.initial_report().unfilled.contains(&FieldCategory::Email));
        assert_eq!(session.phase(), ReconcilerPhase::Observing);

        let started = tokio::time::Instant::now();
        let mutator = Arc::clone(&doc);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            mutator.append_to_body(r#"<input id="email-input">"#);
        });

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(session.report().filled.contains(&FieldCategory::Email));
        assert_eq!(session.phase(), ReconcilerPhase::Observing);

        let report = session.finished().await;
        assert!(started.elapsed() >= OBSERVATION_WINDOW);
        assert_eq!(report.filled.len(), 1);
        assert!(report.unfilled.is_empty());
        assert_eq!(doc.value_of("#email-input").as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_fallback_chain_resolves_missing_selector() {
        let doc = Arc::new(MemoryDocument::new(
            r#"<html><body>
                <input name="email">
                <input name="applicant_name">
            </body></html>"#,
        ));
        let session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("email", json!("a@b.com")), ("FullName", json!("Jane Doe"))]),
            selectors(&[
                (FieldCategory::Email, "#gone"),
                (FieldCategory::FullName, "input["),
            ]),
        );

        let report = session.finished().await;
        assert_eq!(report.filled.len(), 2);
        assert_eq!(doc.value_of(r#"input[name="email"]"#).as_deref(), Some("a@b.com"));
        assert_eq!(
            doc.value_of(r#"input[name="applicant_name"]"#).as_deref(),
            Some("Jane Doe")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failing_key_does_not_abort_the_rest() {
        let doc = Arc::new(MemoryDocument::new(
            r#"<html><body><div id="name"></div><input id="email"></body></html>"#,
        ));
        let mut session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("email", json!("a@b.com")), ("FullName", json!("Jane Doe"))]),
            selectors(&[
                (FieldCategory::FullName, "div#name"),
                (FieldCategory::Email, "#email"),
            ]),
        );

        let initial = session.initial_report().clone();
        assert!(initial.unfilled.contains(&FieldCategory::FullName));
        assert!(initial.filled.contains(&FieldCategory::Email));

        session.cancel();
        let report = session.finished().await;
        assert!(report.unfilled.contains(&FieldCategory::FullName));
        assert_eq!(doc.value_of("#email").as_deref(), Some("a@b.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_data_is_never_written() {
        let doc = Arc::new(MemoryDocument::new(
            r#"<html><body><input id="phone"></body></html>"#,
        ));
        let session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("phone", json!(""))]),
            selectors(&[(FieldCategory::Phone, "#phone")]),
        );
        doc.append_to_body("<p>noise</p>");

        let report = session.finished().await;
        assert!(report.unfilled.contains(&FieldCategory::Phone));
        assert!(report.filled.is_empty());
        assert_eq!(doc.value_of("#phone").as_deref(), Some(""));
        assert!(doc.events_for("#phone").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_pass_never_overwrites() {
        let doc = Arc::new(MemoryDocument::new("<html><body></body></html>"));
        let session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("github", json!("https://github.com/jane"))]),
            selectors(&[(FieldCategory::Github, "#gh")]),
        );
        doc.append_to_body(r#"<input id="gh" value="https://github.com/someone">"#);

        let report = session.finished().await;
        assert!(report.unfilled.contains(&FieldCategory::Github));
        assert_eq!(
            doc.value_of("#gh").as_deref(),
            Some("https://github.com/someone")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_finalizes_before_window() {
        let doc = Arc::new(MemoryDocument::new("<html><body></body></html>"));
        let mut session = Reconciler::new(Arc::clone(&doc)).reconcile(
            data(&[("email", json!("a@b.com"))]),
            selectors(&[(FieldCategory::Email, "#email")]),
        );
        let started = tokio::time::Instant::now();

        session.cancel();
        let report = session.finished().await;
        assert!(started.elapsed() < OBSERVATION_WINDOW);
        assert!(report.unfilled.contains(&FieldCategory::Email));

        // Late arrivals are ignored once finalized.
        doc.append_to_body(r#"<input id="email">"#);
        tokio::task::yield_now().await;
        assert_eq!(doc.value_of("#email").as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_window_is_respected() {
        let doc = Arc::new(MemoryDocument::new("<html><body></body></html>"));
        let session = Reconciler::new(Arc::clone(&doc))
            .with_window(Duration::from_secs(1))
            .reconcile(
                data(&[("skills", json!(["Rust", "Go"]))]),
                selectors(&[(FieldCategory::Skills, "#skills")]),
            );
        let started = tokio::time::Instant::now();
        let report = session.finished().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < OBSERVATION_WINDOW);
        assert!(report.unfilled.contains(&FieldCategory::Skills));
    }

    #[tokio::test]
    async fn test_empty_selector_map_finalizes_immediately() {
        let doc = Arc::new(MemoryDocument::new("<html><body></body></html>"));
        let session = Reconciler::new(doc).reconcile(ProfileData::new(), SelectorMap::new());
        assert_eq!(session.phase(), ReconcilerPhase::Finalized);
        assert_eq!(session.finished().await, AutofillReport::default());
    }
}
