//! Per-user access log records, grouping and filtering.

mod category;
mod filter;
mod group;
mod models;

pub use category::*;
pub use filter::*;
pub use group::*;
pub use models::*;
