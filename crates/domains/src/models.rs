//! # Domain Models
//!
//! These structs represent the core entities of post-notes.
//! Ids are plain integers handed out by the post repository.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Canonical format of the `date` field, as produced by a date input.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Values collected from a submitted form, keyed by field name.
pub type FormData = BTreeMap<String, String>;

/// Repository-assigned post identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl PostId {
    /// `None` once the id space is used up.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fundamental persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Always `yyyy-mm-dd`
    pub date: String,
    /// Empty string means "no description"
    #[serde(default)]
    pub description: String,
}

impl Post {
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// A post candidate before the repository assigns it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds a candidate from submitted form values.
    /// Returns `None` when `title` or `date` is missing or empty.
    pub fn from_form_data(data: &FormData) -> Option<Self> {
        let title = data.get("title").filter(|v| !v.is_empty())?;
        let date = data.get("date").filter(|v| !v.is_empty())?;

        Some(Self {
            title: title.clone(),
            date: date.clone(),
            description: data.get("description").cloned(),
        })
    }

    /// Checks the persistence invariant: non-empty title, parseable date.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(AppError::ValidationError("title is required".into()));
        }
        if self.date.is_empty() {
            return Err(AppError::ValidationError("date is required".into()));
        }
        NaiveDate::parse_from_str(&self.date, DATE_INPUT_FORMAT).map_err(|e| {
            AppError::ValidationError(format!("date {:?} is not yyyy-mm-dd: {e}", self.date))
        })?;
        Ok(())
    }

    /// Consumes the candidate into a post with the given id.
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            title: self.title,
            date: self.date,
            description: self.description.unwrap_or_default(),
        }
    }
}

/// Partial match criteria for listing posts.
/// Unset or empty fields are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Substring of the raw `yyyy-mm-dd` date
    pub date: Option<String>,
}

impl PostFilter {
    pub fn by_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn by_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.as_deref().is_none_or(str::is_empty)
            && self.date.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, post: &Post) -> bool {
        let title_ok = match self.title.as_deref() {
            Some(needle) if !needle.is_empty() => post
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        let date_ok = match self.date.as_deref() {
            Some(needle) if !needle.is_empty() => post.date.contains(needle),
            _ => true,
        };
        title_ok && date_ok
    }
}
