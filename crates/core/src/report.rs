//! Reconciliation of enumerated blobs against manifest references, plus the
//! column, filter and sort options applied to the resulting rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::blobs::{blob_path, BLOB_PREFIX};
use crate::error::InspectError;
use crate::manifest::BlobOwners;

pub const DEFAULT_COLUMNS: &str = "blob,models,size,is_orphan";

const MIB: f64 = (1u64 << 20) as f64;
const GIB: f64 = (1u64 << 30) as f64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Mb,
    Gb,
}

impl SizeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeUnit::Mb => "mb",
            SizeUnit::Gb => "gb",
        }
    }

    /// Format a byte count with two decimals in this unit.
    pub fn format(&self, bytes: u64) -> String {
        match self {
            SizeUnit::Mb => format!("{:.2} MB", bytes as f64 / MIB),
            SizeUnit::Gb => format!("{:.2} GB", bytes as f64 / GIB),
        }
    }
}

impl FromStr for SizeUnit {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mb" => Ok(SizeUnit::Mb),
            "gb" => Ok(SizeUnit::Gb),
            _ => Err(InspectError::UnknownSizeUnit(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Blob,
    Models,
    SizeBytes,
    Size,
    IsOrphan,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Blob,
        Column::Models,
        Column::SizeBytes,
        Column::Size,
        Column::IsOrphan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Blob => "blob",
            Column::Models => "models",
            Column::SizeBytes => "size_bytes",
            Column::Size => "size",
            Column::IsOrphan => "is_orphan",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Parse a comma-separated column list, rejecting unknown names.
pub fn parse_columns(list: &str) -> Result<Vec<Column>, InspectError> {
    let names: Vec<&str> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if names.is_empty() {
        return Err(InspectError::NoColumns);
    }

    let unknown: Vec<String> = names
        .iter()
        .filter(|n| Column::from_name(n).is_none())
        .map(|n| n.to_string())
        .collect();

    if !unknown.is_empty() {
        let mut allowed: Vec<&'static str> = Column::ALL.iter().map(Column::name).collect();
        allowed.sort_unstable();
        return Err(InspectError::UnknownColumns { unknown, allowed });
    }

    Ok(names.into_iter().filter_map(Column::from_name).collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub hash: String,
    /// Owning models, sorted and distinct.
    pub models: Vec<String>,
    pub size_bytes: u64,
    pub size: String,
}

impl Row {
    pub fn blob(&self) -> String {
        format!("{BLOB_PREFIX}{}", self.hash)
    }

    pub fn models_joined(&self) -> String {
        self.models.join("|")
    }

    pub fn is_orphan(&self) -> bool {
        self.models.is_empty()
    }

    /// Display text for a column; emphasis is applied by the caller.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Blob => self.blob(),
            Column::Models => self.models_joined(),
            Column::SizeBytes => self.size_bytes.to_string(),
            Column::Size => self.size.clone(),
            Column::IsOrphan => {
                let flag = if self.is_orphan() { "yes" } else { "no" };
                flag.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub rows: Vec<Row>,
    /// Paths of every orphan blob, in enumeration order.
    pub orphans: Vec<PathBuf>,
}

impl Report {
    pub fn total_bytes(&self) -> u64 {
        self.rows.iter().map(|r| r.size_bytes).sum()
    }

    pub fn orphan_bytes(&self) -> u64 {
        self.rows
            .iter()
            .filter(|r| r.is_orphan())
            .map(|r| r.size_bytes)
            .sum()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }
}

/// Size of a file in bytes, or zero if it cannot be queried.
pub fn file_size(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Size query failed, using 0");
            0
        }
    }
}

/// Build one row per enumerated hash. `on_blob` is called after each row.
pub fn reconcile(
    owners: &BlobOwners,
    hashes: &[String],
    blobs_root: &Path,
    unit: SizeUnit,
    mut on_blob: impl FnMut(&Row),
) -> Report {
    let mut report = Report::default();

    for hash in hashes {
        let path = blob_path(blobs_root, hash);
        let models: Vec<String> = owners
            .get(hash)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let size_bytes = file_size(&path);

        let row = Row {
            hash: hash.clone(),
            models,
            size_bytes,
            size: unit.format(size_bytes),
        };

        if row.is_orphan() {
            report.orphans.push(path);
        }
        on_blob(&row);
        report.rows.push(row);
    }

    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Blob,
    Model,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

/// Row selection and ordering applied before rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub only_orphans: bool,
    pub sort: Option<SortSpec>,
}

impl View {
    /// Validate the individual sort flags into a view.
    pub fn from_flags(
        only_orphans: bool,
        by_blob: bool,
        by_model: bool,
        by_size: bool,
        ascending: bool,
        descending: bool,
    ) -> Result<Self, InspectError> {
        let keys: Vec<SortKey> = [
            (by_blob, SortKey::Blob),
            (by_model, SortKey::Model),
            (by_size, SortKey::Size),
        ]
        .into_iter()
        .filter_map(|(set, key)| set.then_some(key))
        .collect();

        if keys.len() > 1 {
            return Err(InspectError::MultipleSortKeys(keys.len()));
        }
        if ascending && descending {
            return Err(InspectError::ConflictingSortOrder);
        }

        let order = if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };

        Ok(Self {
            only_orphans,
            sort: keys.first().map(|&key| SortSpec { key, order }),
        })
    }

    /// Filter then sort a copy of the rows.
    pub fn apply<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        let mut selected: Vec<&Row> = rows
            .iter()
            .filter(|r| !self.only_orphans || r.is_orphan())
            .collect();

        if let Some(spec) = self.sort {
            selected.sort_by(|a, b| compare(spec, a, b));
        }

        selected
    }
}

fn compare(spec: SortSpec, a: &Row, b: &Row) -> Ordering {
    let directed = |ord: Ordering| match spec.order {
        SortOrder::Ascending => ord,
        SortOrder::Descending => ord.reverse(),
    };

    match spec.key {
        SortKey::Blob => directed(a.hash.cmp(&b.hash)),
        SortKey::Size => directed(a.size_bytes.cmp(&b.size_bytes)),
        // Unowned rows stay at the bottom in both directions.
        SortKey::Model => a.is_orphan().cmp(&b.is_orphan()).then_with(|| {
            directed(
                a.models_joined()
                    .cmp(&b.models_joined())
                    .then_with(|| a.hash.cmp(&b.hash)),
            )
        }),
    }
}
