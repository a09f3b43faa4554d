//! Lookup and precondition failures of the page controllers.

use thiserror::Error;

use crate::dom::Tag;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    /// The element a controller needs is absent from the page
    #[error("{0} element not found")]
    NotFound(String),

    /// The element exists but is the wrong kind for the controller
    #[error("expected <{expected}> element, found <{found}>")]
    WrongKind { expected: Tag, found: Tag },
}

impl ElementError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
