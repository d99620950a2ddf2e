//! Rage - mirror a remote document database to a local JSON tree
//!
//! This crate provides the core functionality for the `rage` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Persisted configuration and path resolution
//! - [`selection`] - Credential, database allow-list and exclusions for a run
//! - [`mirror`] - The on-disk JSON mirror tree (write, read, status)
//! - [`remote`] - Remote store abstraction (MongoDB, in-memory)
//! - [`sync`] - Pull and push orchestration
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod mirror;
pub mod remote;
pub mod selection;
pub mod sync;

pub use error::{Error, Result};
