//! # Fingerprint
//!
//! Content fingerprint of a declared entry list and the decision of whether
//! remote work is needed.
//!
//! The fingerprint is position-sensitive: reordering entries yields a
//! different value even when the same entries are present.

use crate::crd::{EncryptedEntry, PushEncryptedSecretStatus, SyncPhase};
use sha2::{Digest, Sha256};

/// SHA-256 over the ordered entries, rendered as lowercase hex
///
/// Each field is prefixed with its byte length so that no two distinct
/// entry lists share an input stream.
#[must_use]
pub fn fingerprint(entries: &[EncryptedEntry]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((entries.len() as u64).to_be_bytes());
    for entry in entries {
        update_field(&mut hasher, &entry.encrypted_secret);
        update_field(&mut hasher, &entry.remote_ref_key);
    }
    format!("{:x}", hasher.finalize())
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}

/// Whether the declared entries must be (re)published
///
/// | last fingerprint | phase   | current      | result |
/// |------------------|---------|--------------|--------|
/// | empty            | any     | any          | true   |
/// | equal            | ERROR   | -            | true   |
/// | different        | any     | -            | true   |
/// | equal            | SUCCESS | -            | false  |
#[must_use]
pub fn should_sync(last_fingerprint: &str, last_phase: SyncPhase, current_fingerprint: &str) -> bool {
    if last_fingerprint.is_empty() {
        return true;
    }
    if last_fingerprint != current_fingerprint {
        return true;
    }
    last_phase != SyncPhase::Success
}

/// [`should_sync`] against a recorded status
#[must_use]
pub fn needs_sync(status: &PushEncryptedSecretStatus, entries: &[EncryptedEntry]) -> bool {
    should_sync(&status.hash, status.status, &fingerprint(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(keys: &[&str]) -> Vec<EncryptedEntry> {
        keys.iter()
            .map(|k| EncryptedEntry::new(format!("cipher-{k}"), *k))
            .collect()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let list = entries(&["k1", "k2"]);
        assert_eq!(fingerprint(&list), fingerprint(&list.clone()));
        assert_eq!(fingerprint(&list).len(), 64);
        assert!(fingerprint(&list).chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_changes_on_reorder() {
        let forward = entries(&["k1", "k2", "k3"]);
        let mut swapped = forward.clone();
        swapped.swap(0, 2);
        assert_ne!(
            fingerprint(&forward),
            fingerprint(&swapped),
            "reordering must change the fingerprint"
        );
    }

    #[test]
    fn test_fingerprint_every_adjacent_swap_differs() {
        let base = entries(&["a", "b", "c", "d"]);
        let original = fingerprint(&base);
        for i in 0..base.len() - 1 {
            let mut permuted = base.clone();
            permuted.swap(i, i + 1);
            assert_ne!(original, fingerprint(&permuted), "swap at {i} went undetected");
        }
    }

    #[test]
    fn test_fingerprint_field_boundaries_are_unambiguous() {
        let a = vec![EncryptedEntry::new("ab", "c")];
        let b = vec![EncryptedEntry::new("a", "bc")];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_detects_value_change() {
        let a = vec![EncryptedEntry::new("old", "k1")];
        let b = vec![EncryptedEntry::new("new", "k1")];
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_empty_list_differs_from_single_empty_entry() {
        let single = vec![EncryptedEntry::new("", "")];
        assert_ne!(fingerprint(&[]), fingerprint(&single));
    }

    #[test]
    fn test_should_sync_truth_table() {
        let fp = "abc";
        assert!(should_sync("", SyncPhase::Unset, fp));
        assert!(should_sync("", SyncPhase::Success, fp));
        assert!(should_sync(fp, SyncPhase::Error, fp));
        assert!(should_sync("other", SyncPhase::Success, fp));
        assert!(should_sync("other", SyncPhase::Error, fp));
        assert!(!should_sync(fp, SyncPhase::Success, fp));
    }

    #[test]
    fn test_needs_sync_is_false_after_success() {
        let list = entries(&["k1"]);
        let status = PushEncryptedSecretStatus::success(fingerprint(&list));
        assert!(!needs_sync(&status, &list));
    }

    #[test]
    fn test_needs_sync_retries_error_with_matching_fingerprint() {
        let list = entries(&["k1"]);
        let status = PushEncryptedSecretStatus::error(
            "kms unavailable",
            fingerprint(&list),
            crate::crd::FailedOperation::Update,
        );
        assert!(needs_sync(&status, &list));
    }

    #[test]
    fn test_needs_sync_on_fresh_status() {
        assert!(needs_sync(&PushEncryptedSecretStatus::default(), &entries(&["k1"])));
    }
}
