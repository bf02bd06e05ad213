//! Command handlers
//!
//! Each handler renders to a `String` or lines through a pure function so the
//! output can be tested without spawning the binary.

pub mod data;
pub mod env;
pub mod plan;

pub use data::{execute_data, generate_lines};
pub use env::{execute_env, render_environment};
pub use plan::{execute_plan, render_plan};
