//! Dashboard page state: the paginated user list and the log viewer.

mod controller;
mod pagination;
mod viewer;

pub use controller::*;
pub use pagination::*;
pub use viewer::*;
