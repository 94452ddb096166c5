//! One-shot bootstrap for distributed browser-based test runs.
//!
//! Acquires exactly one browser automation endpoint (remote attach or
//! local launch), probes the application build version, and publishes a
//! session descriptor that independent worker processes consume to
//! drive the same browser instance.

pub mod acquire;
pub mod bootstrap;
pub mod browser;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod logging;
pub mod run_log;
pub mod version;

pub use bootstrap::{BootstrapContext, run};
pub use error::{BootstrapError, Result};
