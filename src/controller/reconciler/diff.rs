//! # Diff
//!
//! Computes which remote keys are no longer declared.

use crate::crd::EncryptedEntry;
use std::collections::HashSet;

/// Remote keys present in `old` but absent from `new`
///
/// Keys are returned once each, in order of first appearance in `old`.
#[must_use]
pub fn keys_to_delete(old: &[EncryptedEntry], new: &[EncryptedEntry]) -> Vec<String> {
    let retained: HashSet<&str> = new.iter().map(|e| e.remote_ref_key.as_str()).collect();
    let mut seen = HashSet::new();
    old.iter()
        .map(|e| e.remote_ref_key.as_str())
        .filter(|key| !retained.contains(key) && seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// Every remote key declared by `entries`, deduplicated, in declared order
#[must_use]
pub fn declared_keys(entries: &[EncryptedEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|e| e.remote_ref_key.as_str())
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}
