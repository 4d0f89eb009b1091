//! Blob enumeration for the flat `blobs/` directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const BLOB_PREFIX: &str = "sha256-";

const BARE_PREFIX: &str = "sha256";
const MIN_HASH_LEN: usize = 40;
const MAX_HASH_LEN: usize = 128;

/// Hash of a standard `sha256-<hash>` blob name, taken verbatim.
pub fn strict_hash(name: &str) -> Option<&str> {
    name.strip_prefix(BLOB_PREFIX).filter(|rest| !rest.is_empty())
}

/// Hash recovered from a non-standard blob name.
///
/// Lowercases, drops everything from the first `.`, drops a bare `sha256`
/// prefix, then accepts 40-128 lowercase hex digits.
pub fn relaxed_hash(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    let stem = lowered.split('.').next().unwrap_or_default();
    let stem = stem.strip_prefix(BARE_PREFIX).unwrap_or(stem);

    let valid_len = (MIN_HASH_LEN..=MAX_HASH_LEN).contains(&stem.len());
    let all_hex = stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

    (valid_len && all_hex).then(|| stem.to_string())
}

/// Blob hash for a file name, trying the strict rule before the relaxed one.
pub fn blob_hash(name: &str) -> Option<String> {
    match strict_hash(name) {
        Some(hash) => Some(hash.to_string()),
        None => relaxed_hash(name),
    }
}

/// Canonical on-disk path for a blob hash.
pub fn blob_path(blobs_root: &Path, hash: &str) -> PathBuf {
    blobs_root.join(format!("{BLOB_PREFIX}{hash}"))
}

/// Sorted, deduplicated hashes of the regular files directly inside `root`.
///
/// A missing or unreadable root yields an empty list.
pub fn list_blobs(root: &Path) -> Vec<String> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "Blob root not readable");
            return Vec::new();
        }
    };

    let mut hashes = BTreeSet::new();
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.path().is_file() {
            continue;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        match blob_hash(&name) {
            Some(hash) => {
                hashes.insert(hash);
            }
            None => tracing::debug!(file = %name, "Ignoring file with no recognizable hash"),
        }
    }

    hashes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEX64: &str = "9d507a36062c2845dd3bb3e93364e9abc1607118acd8650727a700f72fb126e5";

    #[test]
    fn test_strict_hash_is_verbatim() {
        assert_eq!(strict_hash("sha256-XYZ"), Some("XYZ"));
        assert_eq!(strict_hash("sha256-abc.partial"), Some("abc.partial"));
        assert_eq!(strict_hash(&format!("sha256-{HEX64}")), Some(HEX64));
    }

    #[test]
    fn test_strict_hash_requires_suffix() {
        assert_eq!(strict_hash("sha256-"), None);
        assert_eq!(strict_hash("sha256abc"), None);
        assert_eq!(strict_hash("SHA256-abc"), None);
    }

    #[test]
    fn test_relaxed_hash_plain_and_extension() {
        assert_eq!(relaxed_hash(HEX64).as_deref(), Some(HEX64));
        assert_eq!(relaxed_hash(&format!("{HEX64}.bin")).as_deref(), Some(HEX64));
        assert_eq!(
            relaxed_hash(&format!("{HEX64}.tar.gz")).as_deref(),
            Some(HEX64)
        );
    }

    #[test]
    fn test_relaxed_hash_mixed_case_and_bare_prefix() {
        let upper = HEX64.to_uppercase();
        assert_eq!(relaxed_hash(&upper).as_deref(), Some(HEX64));
        assert_eq!(relaxed_hash(&format!("SHA256{upper}")).as_deref(), Some(HEX64));
    }

    #[test]
    fn test_relaxed_hash_length_bounds() {
        assert_eq!(relaxed_hash(&"a".repeat(39)), None);
        assert_eq!(relaxed_hash(&"a".repeat(40)).as_deref(), Some("a".repeat(40).as_str()));
        assert!(relaxed_hash(&"f".repeat(128)).is_some());
        assert_eq!(relaxed_hash(&"f".repeat(129)), None);
    }

    #[test]
    fn test_relaxed_hash_rejects_non_hex_and_empty() {
        assert_eq!(relaxed_hash(""), None);
        assert_eq!(relaxed_hash(".hidden"), None);
        assert_eq!(relaxed_hash(&format!("g{}", &HEX64[1..])), None);
        assert_eq!(relaxed_hash(&format!("sha256_{HEX64}")), None);
    }

    #[test]
    fn test_blob_hash_prefers_strict() {
        assert_eq!(blob_hash("sha256-XYZ").as_deref(), Some("XYZ"));
        assert_eq!(blob_hash(HEX64).as_deref(), Some(HEX64));
        assert_eq!(blob_hash("notes.txt"), None);
    }

    #[test]
    fn test_list_blobs_missing_root() {
        let temp = TempDir::new().unwrap();
        assert!(list_blobs(&temp.path().join("blobs")).is_empty());
    }

    #[test]
    fn test_list_blobs_sorted_dedup_files_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("sha256-bbbb"), b"b").unwrap();
        fs::write(root.join("sha256-aaaa"), b"a").unwrap();
        fs::write(root.join(HEX64), b"x").unwrap();
        fs::write(root.join(format!("{HEX64}.bin")), b"x").unwrap();
        fs::write(root.join("README.md"), b"ignored").unwrap();
        fs::create_dir(root.join("sha256-cccc")).unwrap();

        let blobs = list_blobs(root);
        assert_eq!(blobs, vec![HEX64.to_string(), "aaaa".into(), "bbbb".into()]);
    }

    #[test]
    fn test_list_blobs_does_not_recurse() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("sub");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("sha256-deep"), b"d").unwrap();
        assert!(list_blobs(temp.path()).is_empty());
    }

    #[test]
    fn test_blob_path() {
        assert_eq!(
            blob_path(Path::new("/m/blobs"), "abc"),
            PathBuf::from("/m/blobs/sha256-abc")
        );
    }
}
