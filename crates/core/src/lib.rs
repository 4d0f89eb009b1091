//! ollama_inspect_core - Core library for inspecting an Ollama model cache
//!
//! This crate provides:
//! - Manifest scanning (blob hash -> owning models)
//! - Blob enumeration for the flat blob directory
//! - Reconciliation into rows with orphan detection, filtering and sorting
//! - Persistent configuration

pub mod blobs;
pub mod config;
pub mod error;
pub mod manifest;
pub mod report;

pub use config::{Config, ModelPaths};
pub use error::InspectError;
pub use manifest::{BlobOwners, ManifestOutcome};
pub use report::{Column, Report, Row, SizeUnit, SortKey, SortOrder, SortSpec, View};
