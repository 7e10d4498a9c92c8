//! Light/dark theme state, persistence and change notifications.

mod manager;
mod store;

pub use manager::*;
pub use store::*;
