//! # lnbot Architecture
//!
//! lnbot is a command-line client for a hosted Lightning wallet service,
//! built as a **library that happens to have a CLI client**. Everything the
//! binary does goes through [`api::LnbotApi`]; the binary only parses
//! arguments, asks for confirmation and prints.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prompts, renders text or JSON          │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Resolves --wallet into a connected client                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic, returns CmdResult                        │
//! │  - Settlement watching (watch.rs) for invoices and payments │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                             │
//!                 ▼                             ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Registry (registry, store/)  │ │  Client (client/)         │
//! │  - wallet names → credentials │ │  - WalletApi, EventSource │
//! │  - FileStore, InMemoryStore   │ │  - HTTP + SSE over reqwest│
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes regular Rust arguments, returns
//! `Result<CmdResult>`, and never writes to stdout or stderr. Network
//! access is confined to `client::http` and the update checker's
//! `GithubReleases`; both sit behind traits so tests substitute them.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: unit tests against [`test_utils::MockClient`] and
//!    `InMemoryStore`. Most of the testing lives here.
//! 2. **Watcher**: scripted event streams drive every terminal state and
//!    the cancellation path.
//! 3. **CLI**: `tests/` runs the binary with `LNBOT_CONFIG` pointing at a
//!    temp dir and the service unreachable.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Business logic for each command
//! - [`watch`]: Settlement watcher and cancellation
//! - [`client`]: Service boundary traits and the HTTP implementation
//! - [`registry`] / [`store`]: Wallet registry and its persistence
//! - [`resolver`]: Wallet name → credential → client
//! - [`update`]: Advisory release check
//! - [`config`]: Per-invocation settings from the environment
//! - [`model`]: Resource types exchanged with the service
//! - [`format`]: Amount, age and key formatting
//! - [`error`]: Error types

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod update;
pub mod watch;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
