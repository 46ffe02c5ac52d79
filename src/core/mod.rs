/*!
 * Core Module
 * Shared types, limits and errors
 */

pub mod errors;
pub mod limits;
pub mod types;

pub use errors::{ChurnError, ConfigError, RunError};
pub use types::{CycleIndex, ResidentBytes, Size};
