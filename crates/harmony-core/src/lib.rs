//! # Harmony-Core
//!
//! Core types for the Harmony matchmaking engine: the versioned personality
//! vector, structured profile and candidate records, identifiers, and the
//! error taxonomy shared by every layer.

pub mod error;
pub mod profile;
pub mod types;
pub mod vector;

pub use error::{Error, ErrorKind, Result};
pub use profile::*;
pub use types::*;
pub use vector::*;
