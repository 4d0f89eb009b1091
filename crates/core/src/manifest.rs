//! Manifest scanning: map blob hashes to the models that reference them.
//!
//! Manifests live under `manifests/registry.ollama.ai/` in a tree such as
//! `library/llama3/latest`. Each file is a JSON object with an optional
//! `config.digest` and a `layers[].digest` list. Files that cannot be read or
//! parsed are skipped; a manifest directory may hold unrelated files.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LIBRARY_PREFIX: &str = "library/";
const DIGEST_PREFIX: &str = "sha256:";

/// Blob hash -> distinct model names referencing it.
pub type BlobOwners = HashMap<String, BTreeSet<String>>;

/// Why a manifest file contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable(String),
    InvalidJson(String),
    OutsideRoot,
}

/// Result of inspecting a single file under the manifest root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    Parsed { model: String, hashes: Vec<String> },
    Skipped(SkipReason),
}

/// Derive a model name from a manifest path relative to the manifest root.
///
/// `library/llama3/latest` -> `llama3`, `mistral/7b` -> `mistral`.
pub fn model_name(relative: &str) -> &str {
    let trimmed = relative.strip_prefix(LIBRARY_PREFIX).unwrap_or(relative);
    trimmed.split('/').next().unwrap_or(trimmed)
}

/// Hash part of a `sha256:<hex>` digest, if the value is such a string.
pub fn digest_hash(value: &Value) -> Option<&str> {
    value.as_str()?.strip_prefix(DIGEST_PREFIX)
}

/// Every accepted hash referenced by a manifest document, in document order.
pub fn referenced_hashes(doc: &Value) -> Vec<String> {
    let mut hashes = Vec::new();

    if let Some(digest) = doc
        .get("config")
        .filter(|c| c.is_object())
        .and_then(|c| c.get("digest"))
        .and_then(digest_hash)
    {
        hashes.push(digest.to_string());
    }

    if let Some(layers) = doc.get("layers").and_then(Value::as_array) {
        hashes.extend(
            layers
                .iter()
                .filter(|layer| layer.is_object())
                .filter_map(|layer| layer.get("digest").and_then(digest_hash))
                .map(str::to_string),
        );
    }

    hashes
}

/// Interpret raw manifest bytes found at `relative` (path under the root).
pub fn parse_manifest(relative: &str, content: &[u8]) -> ManifestOutcome {
    match serde_json::from_slice::<Value>(content) {
        Ok(doc) => ManifestOutcome::Parsed {
            model: model_name(relative).to_string(),
            hashes: referenced_hashes(&doc),
        },
        Err(e) => ManifestOutcome::Skipped(SkipReason::InvalidJson(e.to_string())),
    }
}

/// Read and interpret one manifest file.
pub fn inspect_file(root: &Path, path: &Path) -> ManifestOutcome {
    let Some(relative) = relative_key(root, path) else {
        return ManifestOutcome::Skipped(SkipReason::OutsideRoot);
    };

    match fs::read(path) {
        Ok(content) => parse_manifest(&relative, &content),
        Err(e) => ManifestOutcome::Skipped(SkipReason::Unreadable(e.to_string())),
    }
}

/// Build the blob -> models mapping for every manifest under `root`.
///
/// A missing root yields an empty mapping.
pub fn scan_manifests(root: &Path) -> BlobOwners {
    let mut owners = BlobOwners::new();

    if !root.exists() {
        tracing::debug!(root = %root.display(), "Manifest root not found");
        return owners;
    }

    for path in manifest_files(root) {
        match inspect_file(root, &path) {
            ManifestOutcome::Parsed { model, hashes } => {
                tracing::debug!(path = %path.display(), %model, blobs = hashes.len(), "Parsed manifest");
                for hash in hashes {
                    owners.entry(hash).or_default().insert(model.clone());
                }
            }
            ManifestOutcome::Skipped(reason) => {
                tracing::debug!(path = %path.display(), ?reason, "Skipping manifest");
            }
        }
    }

    owners
}

fn manifest_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.into_path())
}

// Relative path with `/` separators so model names do not depend on the platform.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(parts.join("/"))
}
