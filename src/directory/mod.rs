//! User directory: the persistence collaborator interface and the in-memory
//! implementation

pub mod store;

pub use store::{InMemoryUserStore, UserStore};
