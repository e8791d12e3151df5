//! CLI command implementations

pub mod error;
pub mod progress;
pub mod upload;

pub use error::CliError;
pub use progress::ProgressReporter;
pub use upload::{exit_code, Cli, OutputFormat};

/// Every file uploaded, or nothing to upload
pub const EXIT_SUCCESS: i32 = 0;
/// At least one file failed
pub const EXIT_FAILURE: i32 = 1;
/// The run could not start (bad configuration, missing path)
pub const EXIT_FATAL: i32 = 2;
/// Stopped by Ctrl+C before every file was attempted
pub const EXIT_INTERRUPTED: i32 = 130;
