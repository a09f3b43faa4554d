//! Headless page controllers for post-notes.
//!
//! [`dom`] provides a small single-threaded element tree with bubbling
//! events; the handler modules wire forms, dialogs, the sidebar and the
//! posts list onto it, and [`page::HomePage`] assembles the whole page.

pub mod dialog;
pub mod dom;
pub mod error;
pub mod form;
pub mod handler;
pub mod header;
pub mod page;
pub mod posts_container;
pub mod sidebar;

pub use dialog::{DialogAction, DialogHandler};
pub use dom::{
    Document, Element, ElementRef, Event, EventKind, InputType, Point, Rect, Tag, WeakDocument,
};
pub use error::ElementError;
pub use form::{
    FieldDescriptor, FieldElement, FieldState, FormHandler, FormOptions, RenderedField,
    ValidationMessage, Validity,
};
pub use handler::HandlerSlot;
pub use header::HeaderHandler;
pub use page::HomePage;
pub use posts_container::PostsContainer;
pub use sidebar::{NavItem, SidebarAction, SidebarHandler, SidebarOptions, SidebarState};
