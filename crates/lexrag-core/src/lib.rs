//! lexrag-core
//!
//! Domain types, the error taxonomy, collaborator traits, configuration and
//! the page-anchored chunker shared by every other lexrag crate.

pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
