//! Common test utilities
//!
//! Rustls setup for Pact tests, plus in-memory fakes of the resource store,
//! KMS and Parameter Store used by the reconciliation scenarios.

#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use pushsecret_controller::controller::backoff::CooldownPolicy;
use pushsecret_controller::controller::reconciler::{BundleStore, Reconciler, StoreError};
use pushsecret_controller::crd::{
    EncryptedEntry, PushEncryptedSecret, PushEncryptedSecretSpec, PushEncryptedSecretStatus,
};
use pushsecret_controller::provider::{
    KeyManagementService, MissingKeyPolicy, ParameterStore, ProviderError, SecretGateway,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use zeroize::Zeroizing;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const NAMESPACE: &str = "apps";
pub const NAME: &str = "payments";
pub const KEY_ID: &str = "alias/pushsecret-test";

/// Ciphertext understood by `FakeKms`: base64 of `enc:<plaintext>`
pub fn encrypt(plaintext: &str) -> String {
    STANDARD.encode(format!("enc:{plaintext}"))
}

pub fn entry(remote_key: &str) -> EncryptedEntry {
    EncryptedEntry::new(encrypt(&format!("value-of-{remote_key}")), remote_key)
}

pub fn entries(remote_keys: &[&str]) -> Vec<EncryptedEntry> {
    remote_keys.iter().map(|k| entry(k)).collect()
}

pub fn bundle(data: Vec<EncryptedEntry>) -> PushEncryptedSecret {
    let mut pes = PushEncryptedSecret::new(NAME, PushEncryptedSecretSpec { data });
    pes.metadata.namespace = Some(NAMESPACE.to_string());
    pes
}

pub fn deletion_time() -> Time {
    serde_json::from_value(serde_json::json!("2024-01-01T00:00:00Z")).unwrap()
}

#[derive(Default)]
struct StoreState {
    objects: HashMap<String, PushEncryptedSecret>,
    status_writes: Vec<PushEncryptedSecretStatus>,
    metadata_updates: usize,
    fail_status_writes: bool,
    fail_gets: bool,
}

/// In-memory resource store with API-server-like finalizer semantics
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn insert(&self, bundle: PushEncryptedSecret) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(bundle.resource_key(), bundle);
    }

    pub fn current(&self) -> Option<PushEncryptedSecret> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&format!("{NAMESPACE}/{NAME}"))
            .cloned()
    }

    /// Replace `spec.data` the way `kubectl apply` would
    pub fn set_entries(&self, data: Vec<EncryptedEntry>) {
        let mut state = self.state.lock().unwrap();
        if let Some(obj) = state.objects.get_mut(&format!("{NAMESPACE}/{NAME}")) {
            obj.spec.data = data;
        }
    }

    /// Request deletion; the object stays while finalizers remain
    pub fn request_deletion(&self) {
        let mut state = self.state.lock().unwrap();
        let key = format!("{NAMESPACE}/{NAME}");
        let finalized = state
            .objects
            .get(&key)
            .is_some_and(PushEncryptedSecret::has_finalizer);
        if finalized {
            if let Some(obj) = state.objects.get_mut(&key) {
                obj.metadata.deletion_timestamp = Some(deletion_time());
            }
        } else {
            state.objects.remove(&key);
        }
    }

    pub fn status_writes(&self) -> Vec<PushEncryptedSecretStatus> {
        self.state.lock().unwrap().status_writes.clone()
    }

    pub fn metadata_updates(&self) -> usize {
        self.state.lock().unwrap().metadata_updates
    }

    pub fn fail_status_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_status_writes = fail;
    }

    pub fn fail_gets(&self, fail: bool) {
        self.state.lock().unwrap().fail_gets = fail;
    }
}

#[async_trait]
impl BundleStore for FakeStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<PushEncryptedSecret>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_gets {
            return Err(StoreError::Unavailable("injected get failure".to_string()));
        }
        Ok(state.objects.get(&format!("{namespace}/{name}")).cloned())
    }

    async fn update(&self, bundle: &PushEncryptedSecret) -> Result<PushEncryptedSecret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.metadata_updates += 1;
        let key = bundle.resource_key();
        let Some(stored) = state.objects.get_mut(&key) else {
            return Err(StoreError::Unavailable(format!("{key} not found")));
        };
        // Status is a subresource: a metadata update leaves it untouched
        stored.metadata.finalizers.clone_from(&bundle.metadata.finalizers);
        stored.spec = bundle.spec.clone();
        let updated = stored.clone();

        let released = updated.is_being_deleted()
            && updated
                .metadata
                .finalizers
                .as_ref()
                .map_or(true, Vec::is_empty);
        if released {
            state.objects.remove(&key);
        }
        Ok(updated)
    }

    async fn update_status(
        &self,
        bundle: &PushEncryptedSecret,
        status: &PushEncryptedSecretStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_status_writes {
            return Err(StoreError::Unavailable("injected status failure".to_string()));
        }
        state.status_writes.push(status.clone());
        if let Some(stored) = state.objects.get_mut(&bundle.resource_key()) {
            stored.status = Some(status.clone());
        }
        Ok(())
    }
}

/// KMS fake: decrypts `enc:<plaintext>` blobs, rejects anything else
#[derive(Default)]
pub struct FakeKms {
    calls: Mutex<Vec<String>>,
}

impl FakeKms {
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn key_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyManagementService for FakeKms {
    async fn decrypt(&self, ciphertext: &[u8], key_id: &str) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
        self.calls.lock().unwrap().push(key_id.to_string());
        match ciphertext.strip_prefix(b"enc:") {
            Some(plaintext) => Ok(Zeroizing::new(plaintext.to_vec())),
            None => Err(ProviderError::Service {
                operation: "kms_decrypt",
                message: "InvalidCiphertextException".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct ParameterState {
    params: HashMap<String, String>,
    puts: Vec<String>,
    deletes: Vec<String>,
    failing_deletes: HashSet<String>,
    failing_puts: HashSet<String>,
}

/// Parameter Store fake recording every call
#[derive(Default)]
pub struct FakeParameterStore {
    state: Mutex<ParameterState>,
}

impl FakeParameterStore {
    pub fn seed(&self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .params
            .insert(name.to_string(), value.to_string());
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().params.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().unwrap().params.contains_key(name)
    }

    pub fn puts(&self) -> Vec<String> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }

    pub fn fail_delete(&self, name: &str, fail: bool) {
        let mut state = self.state.lock().unwrap();
        if fail {
            state.failing_deletes.insert(name.to_string());
        } else {
            state.failing_deletes.remove(name);
        }
    }

    pub fn fail_put(&self, name: &str) {
        self.state.lock().unwrap().failing_puts.insert(name.to_string());
    }
}

#[async_trait]
impl ParameterStore for FakeParameterStore {
    async fn put_secure_string(&self, name: &str, value: &str, _key_id: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.puts.push(name.to_string());
        if state.failing_puts.contains(name) {
            return Err(ProviderError::Service {
                operation: "ssm_put_parameter",
                message: "ThrottlingException".to_string(),
            });
        }
        state.params.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(name.to_string());
        if state.failing_deletes.contains(name) {
            return Err(ProviderError::Service {
                operation: "ssm_delete_parameter",
                message: "ThrottlingException".to_string(),
            });
        }
        match state.params.remove(name) {
            Some(_) => Ok(()),
            None => Err(ProviderError::NotFound {
                operation: "ssm_delete_parameter",
                name: name.to_string(),
            }),
        }
    }
}

/// Reconciler wired to fresh fakes
pub struct Harness {
    pub reconciler: Arc<Reconciler>,
    pub store: Arc<FakeStore>,
    pub kms: Arc<FakeKms>,
    pub parameters: Arc<FakeParameterStore>,
}

impl Harness {
    pub fn new(missing_key_policy: MissingKeyPolicy) -> Self {
        let store = Arc::new(FakeStore::default());
        let kms = Arc::new(FakeKms::default());
        let parameters = Arc::new(FakeParameterStore::default());
        let gateway = SecretGateway::new(
            Arc::<FakeKms>::clone(&kms),
            Arc::<FakeParameterStore>::clone(&parameters),
            KEY_ID,
            missing_key_policy,
        );
        let reconciler = Arc::new(Reconciler::new(
            Arc::<FakeStore>::clone(&store),
            gateway,
            CooldownPolicy::default(),
        ));
        Self {
            reconciler,
            store,
            kms,
            parameters,
        }
    }

    pub async fn reconcile(
        &self,
    ) -> Result<
        pushsecret_controller::controller::reconciler::ReconcileOutcome,
        pushsecret_controller::controller::reconciler::ReconcilerError,
    > {
        self.reconciler.reconcile(NAMESPACE, NAME).await
    }
}
