//! Process-level concerns shared by every mode

pub mod logging;

pub use logging::init_logging;
