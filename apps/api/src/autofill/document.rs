//! The live, mutable page the reconciler writes into.
//!
//! `LiveDocument` is the seam: resolution, value access, event dispatch and
//! mutation notifications. `MemoryDocument` implements it over an HTML
//! snapshot and backs both the agent binary and the tests.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

const MUTATION_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("element is no longer attached to the document")]
    Detached,

    #[error("<{0}> is not a form control")]
    NotFormControl(String),
}

/// Opaque reference to one element of the current document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(Vec<usize>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomMutation {
    ChildList,
}

pub trait LiveDocument: Send + Sync {
    /// First element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError>;

    fn value(&self, element: &ElementHandle) -> Result<String, DomError>;

    fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), DomError>;

    fn dispatch_event(&self, element: &ElementHandle, event: DomEvent) -> Result<(), DomError>;

    fn subscribe(&self) -> broadcast::Receiver<DomMutation>;
}

/// Explicit subscribe/unsubscribe pair over a document's mutation feed.
pub struct MutationObserver {
    receiver: Option<broadcast::Receiver<DomMutation>>,
}

impl MutationObserver {
    pub fn observe<D: LiveDocument + ?Sized>(document: &D) -> Self {
        Self {
            receiver: Some(document.subscribe()),
        }
    }

    /// Waits for the next batch of mutation records and returns its size.
    /// `None` once disconnected or the document is gone.
    pub async fn next_batch(&mut self) -> Option<usize> {
        let receiver = self.receiver.as_mut()?;
        let mut records = match receiver.recv().await {
            Ok(_) => 1,
            Err(broadcast::error::RecvError::Lagged(skipped)) => skipped as usize,
            Err(broadcast::error::RecvError::Closed) => {
                self.receiver = None;
                return None;
            }
        };
        // Coalesce whatever else is already queued into the same batch.
        loop {
            match receiver.try_recv() {
                Ok(_) => records += 1,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => records += skipped as usize,
                Err(_) => break,
            }
        }
        Some(records)
    }

    pub fn is_connected(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn disconnect(&mut self) {
        if self.receiver.take().is_some() {
            debug!("Mutation observer disconnected");
        }
    }
}

struct DocumentState {
    source: String,
    values: HashMap<ElementHandle, String>,
    events: Vec<(ElementHandle, DomEvent)>,
}

/// In-memory page. Values written through `set_value` live beside the HTML
/// source, the way a browser keeps form state apart from markup.
pub struct MemoryDocument {
    state: RwLock<DocumentState>,
    mutations: broadcast::Sender<DomMutation>,
}

impl MemoryDocument {
    pub fn new(html: impl Into<String>) -> Self {
        let (mutations, _) = broadcast::channel(MUTATION_BUFFER);
        Self {
            state: RwLock::new(DocumentState {
                source: html.into(),
                values: HashMap::new(),
                events: Vec::new(),
            }),
            mutations,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// Full markup as it currently stands, without form state.
    pub fn html(&self) -> String {
        self.read().source.clone()
    }

    /// Swaps the whole document. Form state does not survive.
    pub fn replace_html(&self, html: impl Into<String>) {
        {
            let mut state = self.write();
            state.source = html.into();
            state.values.clear();
        }
        self.notify();
    }

    /// Appends markup at the end of `<body>`; existing elements keep their state.
    pub fn append_to_body(&self, fragment: &str) {
        {
            let mut state = self.write();
            match state.source.to_ascii_lowercase().rfind("</body>") {
                Some(index) => state.source.insert_str(index, fragment),
                None => state.source.push_str(fragment),
            }
        }
        self.notify();
    }

    /// Current value of the first element matching `selector`.
    pub fn value_of(&self, selector: &str) -> Option<String> {
        let handle = self.query_selector(selector).ok()??;
        self.value(&handle).ok()
    }

    /// Events dispatched so far on the first element matching `selector`.
    pub fn events_for(&self, selector: &str) -> Vec<DomEvent> {
        let Ok(Some(handle)) = self.query_selector(selector) else {
            return Vec::new();
        };
        self.read()
            .events
            .iter()
            .filter(|(target, _)| *target == handle)
            .map(|(_, event)| *event)
            .collect()
    }

    fn notify(&self) {
        // No receivers simply means nobody is observing.
        let _ = self.mutations.send(DomMutation::ChildList);
    }

    fn read(&self) -> RwLockReadGuard<'_, DocumentState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, DocumentState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Markup-derived value: `value` attribute, or text for a textarea.
    fn initial_value(element: ElementRef) -> String {
        match element.value().name() {
            "textarea" => element.text().collect(),
            _ => element.value().attr("value").unwrap_or_default().to_string(),
        }
    }

    fn control<'a>(document: &'a Html, handle: &ElementHandle) -> Result<ElementRef<'a>, DomError> {
        let element = resolve(document, handle).ok_or(DomError::Detached)?;
        match element.value().name() {
            "input" | "textarea" | "select" => Ok(element),
            other => Err(DomError::NotFormControl(other.to_string())),
        }
    }
}

impl LiveDocument for MemoryDocument {
    fn query_selector(&self, selector: &str) -> Result<Option<ElementHandle>, DomError> {
        let parsed =
            Selector::parse(selector).map_err(|_| DomError::InvalidSelector(selector.to_string()))?;
        let state = self.read();
        let document = Html::parse_document(&state.source);
        let handle = document.select(&parsed).next().map(handle_of);
        Ok(handle)
    }

    fn value(&self, element: &ElementHandle) -> Result<String, DomError> {
        let state = self.read();
        let document = Html::parse_document(&state.source);
        let control = Self::control(&document, element)?;
        Ok(state
            .values
            .get(element)
            .cloned()
            .unwrap_or_else(|| Self::initial_value(control)))
    }

    fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), DomError> {
        let mut state = self.write();
        {
            let document = Html::parse_document(&state.source);
            Self::control(&document, element)?;
        }
        state.values.insert(element.clone(), value.to_string());
        Ok(())
    }

    fn dispatch_event(&self, element: &ElementHandle, event: DomEvent) -> Result<(), DomError> {
        let mut state = self.write();
        {
            let document = Html::parse_document(&state.source);
            resolve(&document, element).ok_or(DomError::Detached)?;
        }
        state.events.push((element.clone(), event));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<DomMutation> {
        self.mutations.subscribe()
    }
}

/// Child-index path from the tree root to `element`.
fn handle_of(element: ElementRef) -> ElementHandle {
    let mut path = Vec::new();
    let mut node = *element;
    while let Some(parent) = node.parent() {
        path.push(node.prev_siblings().count());
        node = parent;
    }
    path.reverse();
    ElementHandle(path)
}

fn resolve<'a>(document: &'a Html, handle: &ElementHandle) -> Option<ElementRef<'a>> {
    let mut node = document.tree.root();
    for &index in &handle.0 {
        node = node.children().nth(index)?;
    }
    ElementRef::wrap(node)
}
