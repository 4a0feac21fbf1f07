//! # confguard-cli: Configuration Check Command-Line Interface
//!
//! ## Subcommands
//!
//! - `check`: validate a configuration file, plus the environment
//!   overrides the schema declares, against a schema path or URL.
//! - `env`: list the environment variable each schema property binds to.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; validation logic lives in
//!   `confguard-schema`.
//! - Handlers return an exit code: 0 on success, 1 when the configuration
//!   does not conform, 2 on operational errors.

use anyhow::Context;

pub mod check;
pub mod env;

/// Exit code for a conforming configuration.
pub const EXIT_OK: u8 = 0;
/// Exit code for a configuration that violates its schema.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for anything that prevented validation.
pub const EXIT_ERROR: u8 = 2;

/// Single-threaded runtime for the one schema fetch a command makes.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
