//! Service wiring and lifecycle

pub mod app;

pub use app::{AppState, ServiceStats};
