//! Chat event notification for the messaging transport collaborator
//!
//! The engine never talks to a chat transport directly; it emits events
//! through this trait and the transport layer owns message text, media
//! relaying, and keyboard layouts.

use crate::error::Result;
use crate::types::{ChatEnded, PairConnected, ReportWarning, UserId};
use async_trait::async_trait;
use tracing::info;

/// Trait for delivering matchmaking events to chat participants
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Notify both parties that they have been paired
    async fn notify_pair_connected(&self, event: PairConnected) -> Result<()>;

    /// Notify the remaining party that the chat session ended
    async fn notify_chat_ended(&self, event: ChatEnded) -> Result<()>;

    /// Notify a user that the search continues and they were enqueued
    async fn notify_searching(&self, user_id: UserId) -> Result<()>;

    /// Send an advisory caution about a frequently reported partner
    async fn notify_report_warning(&self, event: ReportWarning) -> Result<()>;
}

/// Notifier that logs events as JSON lines instead of delivering them
///
/// Default implementation for local runs and the simulation CLI; a real
/// deployment wires a transport-backed implementation. The serialized form
/// matches what a transport adapter would put on the wire.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl ChatNotifier for LogNotifier {
    async fn notify_pair_connected(&self, event: PairConnected) -> Result<()> {
        info!("pair_connected: {}", serde_json::to_string(&event)?);
        Ok(())
    }

    async fn notify_chat_ended(&self, event: ChatEnded) -> Result<()> {
        info!("chat_ended: {}", serde_json::to_string(&event)?);
        Ok(())
    }

    async fn notify_searching(&self, user_id: UserId) -> Result<()> {
        info!("User {} enqueued, searching for a partner", user_id);
        Ok(())
    }

    async fn notify_report_warning(&self, event: ReportWarning) -> Result<()> {
        info!("report_warning: {}", serde_json::to_string(&event)?);
        Ok(())
    }
}
