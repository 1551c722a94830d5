//! Tower middleware.
//!
//! # Stack
//! ```text
//! SetRequestIdLayer (x-request-id)
//!     → RequestLoggerLayer (entry, tee, timing, flush)
//!     → RecovererLayer (panic → entry.panic → 500)
//!     → handler
//! ```

pub mod recoverer;
pub mod request_logger;

pub use recoverer::{Recoverer, RecovererLayer};
pub use request_logger::{RequestLogger, RequestLoggerLayer};
