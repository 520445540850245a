//! Command implementations for the `domloom` binary.
//!
//! Each command loads captured trees from JSON, drives the engine against an
//! in-memory document builder, and returns the payload printed on stdout.
//! Diagnostics and progress stay on stderr; stdout is reserved for JSON.

mod command;

pub use command::{run_components, run_convert, run_diff, run_sync};
