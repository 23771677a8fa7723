//! Shelf application library
//!
//! A personal reading list served over HTTP: the `books` module owns the
//! table and its CRUD endpoints, `home` serves the landing route.

pub mod app;
pub mod modules;

/// Re-export commonly used types
pub use modules::*;
