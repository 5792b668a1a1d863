//! # CLI Layer
//!
//! The terminal client for the lnbot library. This is the **only** place
//! that:
//! - Parses shell arguments (clap)
//! - Prompts for confirmation and installs the Ctrl+C handler
//! - Writes to stdout and stderr
//!
//! ## Structure
//!
//! - `setup`: clap definitions, grouped help, version string
//! - `commands`: `run()`, the `AppContext` and per-command handlers
//! - `render`: text and JSON presentation of a `CmdResult`
//!
//! Business logic is out of scope here; handlers call one `LnbotApi`
//! method and print what comes back.

mod commands;
mod render;
pub mod setup;

pub use commands::run;
pub use render::render_error;
