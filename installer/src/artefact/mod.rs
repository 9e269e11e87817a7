//! Artefact resolution, download, verification and extraction.
//!
//! This module implements the core of the installer: finding the latest
//! version of a service artefact in a Maven-layout repository, fetching and
//! verifying its archive, and unpacking it into a local directory.
//!
//! # Sub-modules
//!
//! - [`coordinate`] - Artefact coordinates and repository URL layout.
//! - [`download`] - Artefact download trait and HTTP implementation.
//! - [`error`] - Validation errors for coordinates and naming policies.
//! - [`extraction`] - Archive extraction with path traversal protection.
//! - [`fetch`] - Streaming download with progress and checksum taps.
//! - [`metadata`] - Version metadata reported by the repository.
//! - [`metadata_parser`] - `maven-metadata.xml` deserialization.
//! - [`naming`] - Naming-variant fallback policy (`NamingVariantPolicy`).
//! - [`resolver`] - Latest-version resolution (`VersionResolver`).
//! - [`service_dir`] - Service-root inference from extracted directories.
//! - [`verification`] - Checksums and verification policy.

pub mod coordinate;
pub mod download;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod metadata;
pub mod metadata_parser;
pub mod naming;
pub mod resolver;
pub mod service_dir;
pub mod verification;
