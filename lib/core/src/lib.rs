//! Core domain types and utilities for ploughman.
//!
//! This crate provides the foundational types and error handling shared by
//! the conversation, tool and orchestration crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId};
