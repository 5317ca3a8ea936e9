//! Textwo is a terminal client for a one-to-one chat service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the persisted session slot, the decoded
//!   user identity, the presence connection state machine, and the active
//!   conversation selection.
//! - [`auth`] gates startup on a stored session and turns it into an
//!   identity, redirecting to the login flow when none is usable.
//! - [`ui`] renders the terminal shell and runs the interactive event loop
//!   that reconciles overlays against pointer and resize events.
//! - [`api`] fetches the contact list from the backend.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which checks the session gate and dispatches
//! into [`ui::shell`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
