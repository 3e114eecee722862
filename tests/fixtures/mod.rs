//! Test fixtures and mock implementations for integration testing

use async_trait::async_trait;
use duet::error::Result;
use duet::notify::ChatNotifier;
use duet::types::{ChatEnded, ChatEvent, PairConnected, ReportWarning, UserId};
use std::sync::{Arc, Mutex};

/// Mock notifier that captures emitted events for testing
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<ChatEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all captured events (for testing)
    pub fn events(&self) -> Vec<ChatEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of a specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| match event {
                ChatEvent::PairConnected(_) => event_type == "PairConnected",
                ChatEvent::ChatEnded(_) => event_type == "ChatEnded",
                ChatEvent::ReportWarning(_) => event_type == "ReportWarning",
                ChatEvent::Searching { .. } => event_type == "Searching",
            })
            .count()
    }

    /// Chat-ended events addressed to a specific user
    pub fn chat_ended_for(&self, user_id: UserId) -> Vec<ChatEnded> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                ChatEvent::ChatEnded(e) if e.user_id == user_id => Some(e.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn notify_pair_connected(&self, event: PairConnected) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(ChatEvent::PairConnected(event));
        }
        Ok(())
    }

    async fn notify_chat_ended(&self, event: ChatEnded) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(ChatEvent::ChatEnded(event));
        }
        Ok(())
    }

    async fn notify_searching(&self, user_id: UserId) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(ChatEvent::Searching { user_id });
        }
        Ok(())
    }

    async fn notify_report_warning(&self, event: ReportWarning) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(ChatEvent::ReportWarning(event));
        }
        Ok(())
    }
}
