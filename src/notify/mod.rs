//! Outbound notices for bookings and cancellations.
//!
//! Delivery is fire-and-forget: the engine calls [`NotificationSink::notify`]
//! after a commit and only logs a failure.

pub mod messages;

pub use messages::Message;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Most recent deliveries kept by the outbox.
const OUTBOX_CAPACITY: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    MissingRecipient,
    Rejected(String),
    /// The notice template failed to render.
    Render(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::MissingRecipient => write!(f, "No recipient address"),
            NotifyError::Rejected(e) => write!(f, "Delivery rejected: {e}"),
            NotifyError::Render(e) => write!(f, "Notice not rendered: {e}"),
        }
    }
}

impl std::error::Error for NotifyError {}

pub trait NotificationSink: Send + Sync {
    /// Hand a notice to the delivery channel. Returns a delivery id.
    fn notify(&self, recipient: &str, subject: &str, body_html: &str) -> Result<String, NotifyError>;
}

/// A notice accepted by the [`Outbox`].
#[derive(Debug, Clone, Serialize)]
pub struct SentNotice {
    pub id: String,
    pub recipient: String,
    pub subject: String,
    pub body_html: String,
    pub sent_at: NaiveDateTime,
}

/// Sink that logs each notice and keeps the most recent ones in memory.
#[derive(Clone, Default)]
pub struct Outbox {
    sent: Arc<Mutex<VecDeque<SentNotice>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivered notices, oldest first.
    pub fn sent(&self) -> Vec<SentNotice> {
        let sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.iter().cloned().collect()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<SentNotice> {
        self.sent()
            .into_iter()
            .filter(|n| n.recipient == recipient)
            .collect()
    }
}

impl NotificationSink for Outbox {
    fn notify(&self, recipient: &str, subject: &str, body_html: &str) -> Result<String, NotifyError> {
        if recipient.trim().is_empty() {
            return Err(NotifyError::MissingRecipient);
        }
        let id = delivery_id();
        log::info!("Notice {} to {}: {}", id, recipient, subject);

        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        if sent.len() >= OUTBOX_CAPACITY {
            sent.pop_front();
        }
        sent.push_back(SentNotice {
            id: id.clone(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body_html: body_html.to_string(),
            sent_at: Utc::now().naive_utc(),
        });
        Ok(id)
    }
}

/// Random 8-byte hex id.
fn delivery_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    hex::encode(bytes)
}

/// Send a rendered notice and swallow any failure after logging it.
pub fn dispatch(sink: &dyn NotificationSink, recipient: &str, rendered: &Result<Message, NotifyError>) {
    let result = match rendered {
        Ok(msg) => sink
            .notify(recipient, &msg.subject, &msg.body_html)
            .map(|_| ()),
        Err(e) => Err(e.clone()),
    };
    if let Err(e) = result {
        log::warn!("Notice to '{}' not delivered: {}", recipient, e);
    }
}
