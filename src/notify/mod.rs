//! Outbound notification interface toward the messaging transport

pub mod publisher;

pub use publisher::{ChatNotifier, LogNotifier};
