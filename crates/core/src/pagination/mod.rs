//! Pagination strategies and the dispatching engine.

mod cursor;
mod engine;
mod page;

pub use cursor::{CursorPaginator, ID_AFTER_PARAM, ID_BEFORE_PARAM};
pub use engine::{EngineConfig, PaginationEngine};
pub use page::PagePaginator;
