//! Bundle merger
//!
//! Appends veris framework objects and their ATT&CK mappings to an ATT&CK
//! object list. By default only veris objects that at least one mapping
//! points at (via `source_ref`) are kept.

use std::collections::HashSet;

use stix_bundle::{Bundle, Record, RecordError};

/// Counts describing how the output was assembled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// ATT&CK records copied
    pub attack: usize,
    /// Veris records kept
    pub veris_kept: usize,
    /// Veris records dropped because no mapping references them
    pub veris_dropped: usize,
    /// Mapping records copied
    pub mappings: usize,
}

impl MergeStats {
    pub fn total(&self) -> usize {
        self.attack + self.veris_kept + self.mappings
    }
}

/// Result of a merge: the combined records plus diagnostic counts
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub objects: Vec<Record>,
    pub stats: MergeStats,
}

impl Merged {
    /// Wrap the merged records in a new bundle
    pub fn into_bundle(self) -> Bundle {
        Bundle::new(self.objects)
    }
}

/// Concatenate ATT&CK, (filtered) veris and mapping records, in that order.
///
/// With `allow_unmapped` unset, a veris record survives only if its `id`
/// appears as the `source_ref` of some mapping. Dangling `source_ref`
/// values never match anything and are ignored.
///
/// Fails if a mapping lacks `source_ref`, or (when filtering) a veris
/// record lacks `id`.
pub fn merge(
    attack: Vec<Record>,
    veris: Vec<Record>,
    mappings: Vec<Record>,
    allow_unmapped: bool,
) -> Result<Merged, RecordError> {
    let veris_total = veris.len();

    let kept_veris = if allow_unmapped {
        veris
    } else {
        let used_ids = referenced_ids(&mappings)?;
        let mut kept = Vec::with_capacity(veris.len());
        for record in veris {
            if used_ids.contains(record.id()?) {
                kept.push(record);
            }
        }
        kept
    };

    let stats = MergeStats {
        attack: attack.len(),
        veris_kept: kept_veris.len(),
        veris_dropped: veris_total - kept_veris.len(),
        mappings: mappings.len(),
    };

    let mut objects = attack;
    objects.reserve(kept_veris.len() + mappings.len());
    objects.extend(kept_veris);
    objects.extend(mappings);

    Ok(Merged { objects, stats })
}

/// Same as [`merge`], reading the records out of three bundles
pub fn merge_bundles(
    attack: &Bundle,
    veris: &Bundle,
    mappings: &Bundle,
    allow_unmapped: bool,
) -> Result<Merged, RecordError> {
    merge(
        attack.objects().to_vec(),
        veris.objects().to_vec(),
        mappings.objects().to_vec(),
        allow_unmapped,
    )
}

/// Every `source_ref` named by the mapping records
fn referenced_ids(mappings: &[Record]) -> Result<HashSet<String>, RecordError> {
    mappings
        .iter()
        .map(|m| m.source_ref().map(str::to_owned))
        .collect()
}
