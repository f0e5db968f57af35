//! State persisted between runs.

pub mod store;

pub use store::{StateStore, STATE_VERSION};
