//! Service artefact installer library.
//!
//! This crate resolves the latest version of a service artefact from a
//! Maven-layout repository, downloads and verifies its archive, and unpacks
//! it into a local directory. It is used by the `sm2-installer` CLI binary
//! and can be consumed programmatically for testing or custom installation
//! workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Resolution, download, verification and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration loading
//! - [`error`] - Semantic error types for each install stage
//! - [`install_flow`] - The resolve, fetch, extract and infer pipeline
//! - [`output`] - Stderr messages and download progress rendering

pub mod artefact;
pub mod cli;
pub mod config;
pub mod error;
pub mod install_flow;
pub mod output;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
