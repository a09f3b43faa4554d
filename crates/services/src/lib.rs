//! post-notes/crates/services/src/lib.rs
//!
//! Business logic over the domain ports: the post repository, listing
//! queries and date presentation.

pub mod date_service;
pub mod post_query;
pub mod post_service;

pub use date_service::input_date_to_display;
pub use post_query::filter_and_sort;
pub use post_service::{ChangeListener, ListenerId, PostService};
