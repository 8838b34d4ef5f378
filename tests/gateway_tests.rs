//! SecretGateway behavior over fake providers

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{encrypt, entries, entry, FakeKms, FakeParameterStore, KEY_ID};
use pushsecret_controller::crd::EncryptedEntry;
use pushsecret_controller::provider::{GatewayError, MissingKeyPolicy, SecretGateway};
use std::sync::Arc;

fn gateway(policy: MissingKeyPolicy) -> (SecretGateway, Arc<FakeKms>, Arc<FakeParameterStore>) {
    let kms = Arc::new(FakeKms::default());
    let parameters = Arc::new(FakeParameterStore::default());
    let gateway = SecretGateway::new(Arc::<FakeKms>::clone(&kms), Arc::<FakeParameterStore>::clone(&parameters), KEY_ID, policy);
    (gateway, kms, parameters)
}

#[tokio::test]
async fn test_publish_writes_entries_in_order() {
    let (gateway, kms, parameters) = gateway(MissingKeyPolicy::Fail);

    let published = gateway
        .decrypt_and_publish(&entries(&["/app/a", "/app/b"]))
        .await
        .unwrap();

    assert_eq!(published, 2);
    assert_eq!(parameters.puts(), vec!["/app/a", "/app/b"]);
    assert_eq!(parameters.value("/app/b").as_deref(), Some("value-of-/app/b"));
    assert_eq!(kms.calls(), 2);
}

#[tokio::test]
async fn test_publish_accepts_line_wrapped_ciphertext() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Fail);
    let encoded = encrypt("a value long enough to wrap");
    let (head, tail) = encoded.split_at(8);
    let wrapped = EncryptedEntry::new(format!("{head}\r\n{tail}\n"), "/app/a");

    gateway.decrypt_and_publish(&[wrapped]).await.unwrap();
    assert_eq!(
        parameters.value("/app/a").as_deref(),
        Some("a value long enough to wrap")
    );
}

#[tokio::test]
async fn test_publish_rejects_spaces_in_ciphertext() {
    let (gateway, kms, parameters) = gateway(MissingKeyPolicy::Fail);
    let padded = EncryptedEntry::new(format!("  {}", encrypt("s3cr3t")), "/app/a");

    let err = gateway.decrypt_and_publish(&[padded]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
    assert_eq!(kms.calls(), 0);
    assert!(parameters.puts().is_empty());
}

#[tokio::test]
async fn test_publish_stops_at_kms_failure() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Fail);
    let rejected = EncryptedEntry::new(STANDARD.encode("not-for-this-key"), "/app/b");

    let err = gateway
        .decrypt_and_publish(&[entry("/app/a"), rejected, entry("/app/c")])
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Decrypt { .. }));
    assert_eq!(err.key(), "/app/b");
    assert_eq!(parameters.puts(), vec!["/app/a"]);
}

#[tokio::test]
async fn test_publish_rejects_non_utf8_plaintext() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Fail);
    let mut blob = b"enc:".to_vec();
    blob.extend_from_slice(&[0xff, 0xfe, 0xfd]);
    let binary = EncryptedEntry::new(STANDARD.encode(blob), "/app/bin");

    let err = gateway.decrypt_and_publish(&[binary]).await.unwrap_err();
    assert!(matches!(err, GatewayError::NonUtf8Plaintext { .. }));
    assert!(parameters.puts().is_empty());
}

#[tokio::test]
async fn test_publish_reports_put_failure() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Fail);
    parameters.fail_put("/app/a");

    let err = gateway
        .decrypt_and_publish(&entries(&["/app/a", "/app/b"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Put { .. }));
    assert_eq!(parameters.puts(), vec!["/app/a"]);
}

#[tokio::test]
async fn test_delete_stops_at_first_failure() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Fail);
    parameters.seed("/app/a", "1");
    parameters.seed("/app/c", "3");

    let keys = vec!["/app/a".to_string(), "/app/b".to_string(), "/app/c".to_string()];
    let err = gateway.delete_keys(&keys).await.unwrap_err();

    assert_eq!(err.key(), "/app/b");
    assert!(matches!(err, GatewayError::Delete { ref source, .. } if source.is_not_found()));
    assert_eq!(parameters.deletes(), vec!["/app/a", "/app/b"]);
    assert!(parameters.contains("/app/c"), "keys after the failure are untouched");
}

#[tokio::test]
async fn test_delete_ignores_missing_parameters_when_configured() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Ignore);
    parameters.seed("/app/c", "3");

    let keys = vec!["/app/b".to_string(), "/app/c".to_string()];
    assert_eq!(gateway.delete_keys(&keys).await.unwrap(), 2);
    assert!(!parameters.contains("/app/c"));
}

#[tokio::test]
async fn test_ignore_policy_still_reports_service_failures() {
    let (gateway, _kms, parameters) = gateway(MissingKeyPolicy::Ignore);
    parameters.seed("/app/a", "1");
    parameters.fail_delete("/app/a", true);

    let err = gateway
        .delete_keys(&["/app/a".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Delete { .. }));
}
