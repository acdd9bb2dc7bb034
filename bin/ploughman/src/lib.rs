//! Console front end for ploughman.
//!
//! The binary composes the library crates from configuration and reads
//! utterances and session commands from standard input.

pub mod config;
pub mod console;
pub mod error;
