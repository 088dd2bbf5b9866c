//! Logging bootstrap. Modules log through the re-exported `tracing` macros.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
