//! Request/response channel between the background component (backend I/O)
//! and the content component (owns the live page).
//!
//! Every request travels with exactly one reply slot. A component that goes
//! away without answering drops the slot, which the sender sees as
//! `ChannelError::NoResponse`.

pub mod background;
pub mod content;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::models::form::AutofillReport;

pub use background::{BackendClient, BackgroundWorker};
pub use content::ContentWorker;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    FetchData,
    ScrapeFields {
        url: String,
    },
    DynamicAutofill {
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Autofill {
        success: bool,
        filled: Vec<String>,
        unfilled: Vec<String>,
    },
    Data {
        data: Value,
    },
    Error {
        error: String,
    },
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }

    pub fn from_report(report: &AutofillReport) -> Self {
        Response::Autofill {
            success: true,
            filled: report.filled.iter().map(|c| c.key().to_string()).collect(),
            unfilled: report.unfilled.iter().map(|c| c.key().to_string()).collect(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("receiving component is gone")]
    Closed,

    #[error("request was dropped without a response")]
    NoResponse,
}

/// A request plus the slot its single response goes into.
#[derive(Debug)]
pub struct Envelope {
    pub request: Request,
    reply: oneshot::Sender<Response>,
}

impl Envelope {
    pub fn respond(self, response: Response) {
        if self.reply.send(response).is_err() {
            debug!("Requester stopped waiting; response discarded");
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageSender {
    inner: mpsc::Sender<Envelope>,
}

impl MessageSender {
    pub async fn send(&self, request: Request) -> Result<Response, ChannelError> {
        let (reply, response) = oneshot::channel();
        self.inner
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ChannelError::Closed)?;
        response.await.map_err(|_| ChannelError::NoResponse)
    }
}

pub fn channel(capacity: usize) -> (MessageSender, mpsc::Receiver<Envelope>) {
    let (inner, inbox) = mpsc::channel(capacity);
    (MessageSender { inner }, inbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form::FieldCategory;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "action": "dynamicAutofill",
            "fields": {"email": "#email", "FullName": "#name"}
        }))
        .unwrap();
        let Request::DynamicAutofill { fields } = request else {
            panic!("wrong variant");
        };
        assert_eq!(fields["email"], "#email");

        let request: Request = serde_json::from_value(json!({"action": "dynamicAutofill"})).unwrap();
        assert_eq!(
            request,
            Request::DynamicAutofill {
                fields: BTreeMap::new()
            }
        );

        assert_eq!(
            serde_json::to_value(Request::ScrapeFields {
                url: "https://a.example".to_string()
            })
            .unwrap(),
            json!({"action": "scrapeFields", "url": "https://a.example"})
        );
        assert_eq!(
            serde_json::to_value(Request::FetchData).unwrap(),
            json!({"action": "fetchData"})
        );
    }

    #[test]
    fn test_response_wire_format() {
        let mut report = AutofillReport::default();
        report.mark_filled(FieldCategory::Email);
        report.mark_unfilled(FieldCategory::DomainSpecialization);
        assert_eq!(
            serde_json::to_value(Response::from_report(&report)).unwrap(),
            json!({"success": true, "filled": ["email"], "unfilled": ["domainSpecialization"]})
        );
        assert_eq!(
            serde_json::to_value(Response::error("HTTP error: 404")).unwrap(),
            json!({"error": "HTTP error: 404"})
        );

        let parsed: Response = serde_json::from_value(json!({"data": {"email": "a@b.com"}})).unwrap();
        assert_eq!(
            parsed,
            Response::Data {
                data: json!({"email": "a@b.com"})
            }
        );
    }

    #[tokio::test]
    async fn test_round_trip_and_dropped_reply() {
        let (sender, mut inbox) = channel(4);
        tokio::spawn(async move {
            let first = inbox.recv().await.unwrap();
            first.respond(Response::Data { data: json!({}) });
            // Second request is dropped unanswered.
            let _second = inbox.recv().await.unwrap();
        });

        assert_eq!(
            sender.send(Request::FetchData).await,
            Ok(Response::Data { data: json!({}) })
        );
        assert_eq!(
            sender.send(Request::FetchData).await,
            Err(ChannelError::NoResponse)
        );
    }

    #[tokio::test]
    async fn test_send_to_closed_inbox() {
        let (sender, inbox) = channel(1);
        drop(inbox);
        assert_eq!(sender.send(Request::FetchData).await, Err(ChannelError::Closed));
    }
}
