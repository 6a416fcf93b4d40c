//! Process-level utilities for the node binary

pub mod logging;
pub mod signal;

pub use logging::{init_json_logging, init_logging, init_logging_from_config};
pub use signal::{wait_for_shutdown, wait_for_shutdown_signal};
