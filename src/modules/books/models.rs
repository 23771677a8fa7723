//! Book records and their create/update/read shapes.
//!
//! Bounds are counted in characters, not bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub const TITLE_MAX: usize = 200;
pub const AUTHOR_MAX: usize = 100;
pub const GENRE_MAX: usize = 50;
pub const NOTES_MAX: usize = 1000;

/// Where a book sits on the reading list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    WantToRead,
    Reading,
    Completed,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WantToRead => "want_to_read",
            Self::Reading => "reading",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "want_to_read" => Ok(Self::WantToRead),
            "reading" => Ok(Self::Reading),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reading status '{0}'")]
pub struct UnknownStatus(pub String);

/// A stored book, including its server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Server-assigned identifier, never reused
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Reading progress
    pub status: ReadingStatus,
    /// Free-form genre label
    pub genre: Option<String>,
    /// Personal notes
    pub notes: Option<String>,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBook {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Defaults to `want_to_read`
    #[serde(default)]
    pub status: ReadingStatus,
    /// Free-form genre label
    #[serde(default)]
    pub genre: Option<String>,
    /// Personal notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            status: ReadingStatus::default(),
            genre: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check_len("title", &self.title, 1, TITLE_MAX);
        errors.check_len("author", &self.author, 1, AUTHOR_MAX);
        if let Some(genre) = &self.genre {
            errors.check_len("genre", genre, 0, GENRE_MAX);
        }
        if let Some(notes) = &self.notes {
            errors.check_len("notes", notes, 0, NOTES_MAX);
        }
        errors.into_result()
    }
}

/// A field in a partial update: left out, sent as `null`, or sent with a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Unset,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        !matches!(self, Patch::Unset)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Missing keys never reach here; `#[serde(default)]` yields `Unset`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

/// Request model for a partial update. Only fields present in the body are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateBook {
    /// New title; may not be null
    #[serde(default)]
    pub title: Patch<String>,
    /// New author; may not be null
    #[serde(default)]
    pub author: Patch<String>,
    /// New reading status; may not be null
    #[serde(default)]
    pub status: Patch<ReadingStatus>,
    /// New genre; null clears it
    #[serde(default)]
    pub genre: Patch<String>,
    /// New notes; null clears it
    #[serde(default)]
    pub notes: Patch<String>,
}

impl UpdateBook {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check_required_patch("title", &self.title, TITLE_MAX);
        errors.check_required_patch("author", &self.author, AUTHOR_MAX);
        if matches!(self.status, Patch::Null) {
            errors.push("status", "may not be null");
        }
        if let Patch::Value(genre) = &self.genre {
            errors.check_len("genre", genre, 0, GENRE_MAX);
        }
        if let Patch::Value(notes) = &self.notes {
            errors.check_len("notes", notes, 0, NOTES_MAX);
        }
        errors.into_result()
    }

    /// Overwrite the fields of `book` that this update sets.
    ///
    /// Expects a validated update; `Null` on a required field leaves it as is.
    pub fn apply_to(self, book: &mut Book) {
        if let Patch::Value(title) = self.title {
            book.title = title;
        }
        if let Patch::Value(author) = self.author {
            book.author = author;
        }
        if let Patch::Value(status) = self.status {
            book.status = status;
        }
        match self.genre {
            Patch::Unset => {}
            Patch::Null => book.genre = None,
            Patch::Value(genre) => book.genre = Some(genre),
        }
        match self.notes {
            Patch::Unset => {}
            Patch::Null => book.notes = None,
            Patch::Value(notes) => book.notes = Some(notes),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.title.is_set()
            || self.author.is_set()
            || self.status.is_set()
            || self.genre.is_set()
            || self.notes.is_set())
    }
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field-level failure found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid book: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn check_len(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("must be at least {} characters", min));
        } else if len > max {
            self.push(field, format!("must be at most {} characters", max));
        }
    }

    fn check_required_patch(&mut self, field: &'static str, patch: &Patch<String>, max: usize) {
        match patch {
            Patch::Unset => {}
            Patch::Null => self.push(field, "may not be null"),
            Patch::Value(value) => self.check_len(field, value, 1, max),
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}
