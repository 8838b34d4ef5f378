//! Pact integration tests for the AWS KMS and Parameter Store providers
//!
//! Each test starts a Pact mock server, points the real SDK-backed provider
//! at it through the endpoint override and calls the provider methods the
//! reconciler uses. The recorded interactions are the controller's contract
//! with the two AWS APIs.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::init_rustls;
use pact_consumer::prelude::*;
use pushsecret_controller::prelude::*;
use pushsecret_controller::provider::aws::load_sdk_config;
use serde_json::json;
use std::env;
use std::sync::Once;

const CONSUMER: &str = "PushEncryptedSecret-Controller";
const KEY_ID: &str = "arn:aws:kms:us-east-1:111122223333:key/1234abcd-12ab-34cd-56ef-1234567890ab";

static INIT: Once = Once::new();

/// Static credentials so the SDK signs requests without touching IMDS
fn init_test() {
    INIT.call_once(|| {
        init_rustls();
        env::set_var("AWS_ACCESS_KEY_ID", "AKIDPACTTEST");
        env::set_var("AWS_SECRET_ACCESS_KEY", "pact-test-secret");
        env::set_var("AWS_EC2_METADATA_DISABLED", "true");
    });
}

fn endpoint(mock_server: &dyn ValidatingMockServer) -> String {
    let mut base_url = mock_server.url().to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

#[tokio::test]
async fn test_kms_decrypt_contract() {
    init_test();

    let ciphertext = b"ciphertext-for-database-password";
    let mut pact_builder = PactBuilder::new(CONSUMER, "AWS-KMS");
    pact_builder.interaction("decrypt a symmetric ciphertext", "", |mut i| {
        i.given("the key exists and the caller may decrypt with it");
        i.request
            .method("POST")
            .path("/")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "TrentService.Decrypt")
            .body(
                json!({
                    "CiphertextBlob": STANDARD.encode(ciphertext),
                    "KeyId": KEY_ID,
                    "EncryptionAlgorithm": "SYMMETRIC_DEFAULT"
                })
                .to_string(),
            );
        i.response
            .status(200)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "KeyId": KEY_ID,
                "Plaintext": STANDARD.encode("hunter2"),
                "EncryptionAlgorithm": "SYMMETRIC_DEFAULT"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = load_sdk_config(Some("us-east-1")).await;
    let kms = AwsKms::new(&sdk_config, Some(&endpoint(mock_server.as_ref())));

    let plaintext = kms.decrypt(ciphertext, KEY_ID).await.expect("decrypt should succeed");
    assert_eq!(plaintext.as_slice(), b"hunter2");
}

#[tokio::test]
async fn test_kms_decrypt_unknown_key_contract() {
    init_test();

    let ciphertext = b"ciphertext-for-retired-key";
    let mut pact_builder = PactBuilder::new(CONSUMER, "AWS-KMS");
    pact_builder.interaction("decrypt with a key that does not exist", "", |mut i| {
        i.given("the key does not exist");
        i.request
            .method("POST")
            .path("/")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "TrentService.Decrypt")
            .body(
                json!({
                    "CiphertextBlob": STANDARD.encode(ciphertext),
                    "KeyId": "alias/retired",
                    "EncryptionAlgorithm": "SYMMETRIC_DEFAULT"
                })
                .to_string(),
            );
        i.response
            .status(400)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "__type": "NotFoundException",
                "message": "Alias arn:aws:kms:us-east-1:111122223333:alias/retired is not found."
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = load_sdk_config(Some("us-east-1")).await;
    let kms = AwsKms::new(&sdk_config, Some(&endpoint(mock_server.as_ref())));

    let err = kms.decrypt(ciphertext, "alias/retired").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_put_secure_string_contract() {
    init_test();

    let mut pact_builder = PactBuilder::new(CONSUMER, "AWS-Parameter-Store");
    pact_builder.interaction("put a SecureString parameter, overwriting", "", |mut i| {
        i.given("AWS credentials are configured");
        i.request
            .method("POST")
            .path("/")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "AmazonSSM.PutParameter")
            .body(
                json!({
                    "Name": "/payments/prod/database_password",
                    "Value": "hunter2",
                    "Type": "SecureString",
                    "KeyId": KEY_ID,
                    "Overwrite": true
                })
                .to_string(),
            );
        i.response
            .status(200)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "Version": 3,
                "Tier": "Standard"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = load_sdk_config(Some("us-east-1")).await;
    let parameters = AwsParameterStore::new(&sdk_config, Some(&endpoint(mock_server.as_ref())));

    parameters
        .put_secure_string("/payments/prod/database_password", "hunter2", KEY_ID)
        .await
        .expect("put should succeed");
}

#[tokio::test]
async fn test_delete_parameter_contract() {
    init_test();

    let mut pact_builder = PactBuilder::new(CONSUMER, "AWS-Parameter-Store");
    pact_builder.interaction("delete an existing parameter", "", |mut i| {
        i.given("the parameter exists");
        i.request
            .method("POST")
            .path("/")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "AmazonSSM.DeleteParameter")
            .body(json!({ "Name": "/payments/prod/api_token" }).to_string());
        i.response
            .status(200)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = load_sdk_config(Some("us-east-1")).await;
    let parameters = AwsParameterStore::new(&sdk_config, Some(&endpoint(mock_server.as_ref())));

    parameters
        .delete("/payments/prod/api_token")
        .await
        .expect("delete should succeed");
}

#[tokio::test]
async fn test_delete_missing_parameter_contract() {
    init_test();

    let mut pact_builder = PactBuilder::new(CONSUMER, "AWS-Parameter-Store");
    pact_builder.interaction("delete a parameter that does not exist", "", |mut i| {
        i.given("the parameter does not exist");
        i.request
            .method("POST")
            .path("/")
            .header("content-type", "application/x-amz-json-1.1")
            .header("x-amz-target", "AmazonSSM.DeleteParameter")
            .body(json!({ "Name": "/payments/prod/removed" }).to_string());
        i.response
            .status(400)
            .header("content-type", "application/x-amz-json-1.1")
            .json_body(json!({
                "__type": "ParameterNotFound",
                "message": "Parameter /payments/prod/removed not found."
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let sdk_config = load_sdk_config(Some("us-east-1")).await;
    let parameters = AwsParameterStore::new(&sdk_config, Some(&endpoint(mock_server.as_ref())));

    let err = parameters.delete("/payments/prod/removed").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
}
