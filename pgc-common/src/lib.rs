//! # PGC Common Library
//!
//! Shared code for the profile gender checker:
//! - Verdict and gender domain types
//! - Cross-context request/response messages
//! - Event types (PgcEvent enum) and EventBus
//! - Bootstrap configuration loading
//! - Database initialization

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod protocol;
pub mod verdict;

pub use error::{Error, Result};
pub use verdict::{Gender, PictureGender, ProfileGender, RunId, Verdict, VerdictStatus};
