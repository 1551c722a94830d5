//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! options file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → HttpLog::configure (normalize, atomic swap, push backend settings)
//!     → each request takes one snapshot at entry creation
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new options
//!     → sent over a channel, applied with HttpLog::configure
//! ```
//!
//! # Design Decisions
//! - Replacing options is all-or-nothing; nothing is merged
//! - Empty level and time format are defaulted, nothing else is validated

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_options, ConfigError};
pub use schema::{Options, DEFAULT_TIME_FORMAT};
pub use watcher::OptionsWatcher;
