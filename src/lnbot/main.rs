//! # lnbot CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/lnbot/cli/`, while
//! this file only invokes `cli::run()` and handles process termination.
//! See the library docs for the layering.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprint!("{}", cli::render_error(&e));
        std::process::exit(1);
    }
}
