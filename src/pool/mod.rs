//! Waiting pool for users seeking a chat partner

pub mod waiting;

pub use waiting::WaitingPool;
