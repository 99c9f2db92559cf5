//! Command line interface module
//!
//! This module provides argument parsing and the runner that maps each
//! subcommand onto the session and market services.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::{RunError, Runner};
