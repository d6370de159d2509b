//! Utility functions for logging

mod logging;

pub use logging::setup_logging;
