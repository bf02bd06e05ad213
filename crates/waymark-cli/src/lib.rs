//! Waymark CLI library
//!
//! Command-line front end for the Waymark scenario engine: inspect the
//! resolved environment, preview which scenarios a manifest registers, and
//! generate synthetic test data.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{Cli, ColorArg, Commands, DataArgs, EnvArgs, PlanArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
