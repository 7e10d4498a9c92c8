//! Squid ACL editor: rule shapes, type metadata and form state.

mod form;
mod models;
mod types;

pub use form::*;
pub use models::*;
pub use types::*;
