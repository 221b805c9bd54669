//! mt-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other mt-* crates,
//! providing the job identifier, a unified error type that carries the
//! failing pipeline stage, media-domain enums, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod stage;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::JobId;
pub use media::*;
pub use stage::Stage;
