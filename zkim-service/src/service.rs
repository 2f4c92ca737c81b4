//! The service facade: a type-state `ZkimService<Uninitialized | Ready>`
//! binding storage, the encryption engine, the search engine and
//! compromise detection behind the public operation surface. Readiness
//! is awaited once at construction rather than checked on every call, and
//! the type system — not a runtime flag — enforces that ordering.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use zkim_core::compression::{codec_for, CompressionCodec};
use zkim_core::engine::{self, EncryptParams};
use zkim_core::model::{AccessControl, Container, CustomFields, Metadata, RetentionPolicy};
use zkim_core::recovery;
use zkim_core::signature::{self, SigningKeyPair};
use zkim_core::wire;
use zkim_search::clock::Clock;
use zkim_search::{SearchEngine, Trapdoor};

use crate::cache::ContentKeyCache;
use crate::compromise::{CompromiseDetector, CompromiseReport};
use crate::config::Config;
use crate::error::{Envelope, ServiceError, ServiceLifecycleError, StorageError};
use crate::storage::{content_address, get_with_retry, StorageBackend};

/// Marker for a service that hasn't completed `init()` yet.
pub struct Uninitialized;
/// Marker for a service past `init()`, with the full operation surface.
pub struct Ready;

struct SigningKeys {
    platform: SigningKeyPair,
    user: SigningKeyPair,
    content: SigningKeyPair,
}

impl SigningKeys {
    fn generate() -> Self {
        Self {
            platform: signature::generate_keypair(),
            user: signature::generate_keypair(),
            content: signature::generate_keypair(),
        }
    }
}

struct ServiceInner {
    config: Config,
    storage: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    cache: ContentKeyCache,
    search: SearchEngine,
    compromise: CompromiseDetector,
    signing_keys: RwLock<SigningKeys>,
}

impl ServiceInner {
    fn codec(&self) -> Option<Box<dyn CompressionCodec>> {
        if self.config.enable_compression {
            Some(codec_for(self.config.compression_algorithm))
        } else {
            None
        }
    }
}

/// Result of `createFile` (§6): the encoded container bytes plus the key
/// it was stored under.
#[derive(Debug, Clone)]
pub struct CreatedFile {
    pub file: Vec<u8>,
    pub object_id: String,
}

/// Caller-supplied changes to a container's metadata (§6 `updateMetadata`).
///
/// The spec lists `updateMetadata(file, userId, metadataPatch) -> file`
/// without key material, but metadata lives inside the AEAD-sealed
/// platform and user layers — re-sealing requires the same key material
/// `createFile` took. This facade's `update_metadata` therefore takes
/// `platform_key_material`/`user_key_material` explicitly; see DESIGN.md.
#[derive(Debug, Clone, Default)]
pub struct MetadataPatch {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub add_tags: BTreeSet<String>,
    pub remove_tags: BTreeSet<String>,
    pub custom_fields: Option<CustomFields>,
    pub access_control: Option<AccessControl>,
    pub retention_policy: Option<RetentionPolicy>,
}

impl MetadataPatch {
    fn apply(&self, metadata: &mut Metadata) {
        if let Some(name) = &self.file_name {
            metadata.file_name = name.clone();
        }
        if let Some(mime) = &self.mime_type {
            metadata.mime_type = mime.clone();
        }
        for tag in &self.remove_tags {
            metadata.tags.remove(tag);
        }
        for tag in &self.add_tags {
            metadata.tags.insert(tag.clone());
        }
        if let Some(fields) = &self.custom_fields {
            metadata.custom_fields = fields.clone();
        }
        if let Some(ac) = &self.access_control {
            metadata.access_control = Some(ac.clone());
        }
        if let Some(rp) = &self.retention_policy {
            metadata.retention_policy = Some(rp.clone());
        }
    }
}

/// `validateIntegrity` result (§6).
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub validation_level: &'static str,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// `getUsageStats` result (§6).
#[derive(Debug, Clone, Copy)]
pub struct UsageStats {
    pub usage_count: u64,
    pub max_usage: u64,
    pub is_revoked: bool,
}

/// Encryption-engine-facing key material for one operation. Grouped to
/// keep the public method signatures close to the spec's literal
/// parameter lists.
pub struct KeyMaterial<'a> {
    pub user_id: &'a [u8],
    pub platform_key_id: &'a [u8],
    pub platform_key_material: &'a [u8],
    pub user_key_material: &'a [u8],
}

pub struct ZkimService<State = Uninitialized> {
    inner: Arc<ServiceInner>,
    _state: PhantomData<State>,
}

impl ZkimService<Uninitialized> {
    pub fn new(config: Config, storage: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        let search = SearchEngine::new(
            clock.clone(),
            config.search.clone(),
            zkim_search::OprfKey::generate(),
        );
        let inner = ServiceInner {
            config,
            storage,
            clock,
            cache: ContentKeyCache::new(),
            search,
            compromise: CompromiseDetector::new(),
            signing_keys: RwLock::new(SigningKeys::generate()),
        };
        Self { inner: Arc::new(inner), _state: PhantomData }
    }

    /// Blocks once on readiness (§5 "async key-derivation wait -> explicit
    /// init"); every operation thereafter assumes readiness, enforced by
    /// `Ready` only appearing on the return type here.
    pub async fn init(self) -> Result<ZkimService<Ready>, ServiceError> {
        let timeout = self.inner.config.initialization_timeout;
        tokio::time::timeout(timeout, async {
            // RNG and signing keys are already materialized at `new()`;
            // this is the single suspension point future async readiness
            // hooks (e.g. a host-provided CSPRNG warmup) would hang off.
            tokio::task::yield_now().await;
        })
        .await
        .map_err(|_| ServiceError::Service(ServiceLifecycleError::Timeout))?;
        Ok(ZkimService { inner: self.inner, _state: PhantomData })
    }
}

impl ZkimService<Ready> {
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn search(&self) -> &SearchEngine {
        &self.inner.search
    }

    fn query_epoch(&self) -> i64 {
        let secs = self.inner.config.search.epoch_duration.as_secs().max(1) as i64;
        self.inner.clock.now().timestamp() / secs
    }

    /// `createFile(plaintext, userId, platformKeyMaterial, userKeyMaterial,
    /// metadata?, skipContentAddress?) -> {file, objectId}`.
    pub async fn create_file(
        &self,
        plaintext: &[u8],
        keys: KeyMaterial<'_>,
        metadata: Metadata,
        searchable_text: &str,
        skip_content_address: bool,
    ) -> Result<CreatedFile, ServiceError> {
        if plaintext.len() as u64 > self.inner.config.max_file_size {
            return Err(ServiceError::Invalid("plaintext exceeds maxFileSize".into()));
        }

        let codec = self.inner.codec();
        let signing = self.inner.signing_keys.read().unwrap();

        let created_at = self.inner.clock.now().timestamp().max(0) as u64;
        let file_name = metadata.file_name.clone();
        let tags: Vec<String> = metadata.tags.iter().cloned().collect();
        let access_control = metadata.access_control.clone();

        let output = engine::encrypt_container(
            plaintext,
            EncryptParams {
                user_id: keys.user_id.to_vec(),
                platform_key_id: keys.platform_key_id.to_vec(),
                platform_key_material: keys.platform_key_material,
                user_key_material: keys.user_key_material,
                metadata,
                searchable_text: searchable_text.to_string(),
                created_at,
                chunk_size: self.inner.config.chunk_size,
                codec: codec.as_deref(),
                compression_level: self.inner.config.clamped_compression_level(),
                buckets: self.inner.config.bucket_sizes(),
                platform_signing_key: &signing.platform,
                user_signing_key: &signing.user,
                content_signing_key: &signing.content,
            },
        )?;
        drop(signing);

        let file_id_hex = hex::encode(output.container.header.file_id);
        self.inner.cache.insert(file_id_hex.clone(), output.content_key);

        let bytes = wire::encode(&output.container)?;

        let object_id = if skip_content_address {
            file_id_hex.clone()
        } else {
            content_address(&bytes)
        };
        self.inner.storage.put(&object_id, &bytes).await?;

        if self.inner.config.enable_searchable_encryption {
            let owner_user_id = String::from_utf8_lossy(keys.user_id).into_owned();
            self.inner.search.index().index_file(&zkim_search::IndexedFile {
                file_id: &file_id_hex,
                owner_user_id: &owner_user_id,
                metadata: &output.container.metadata,
                body_preview: searchable_text,
            });
        }

        tracing::info!(
            file_id = %file_id_hex,
            object_id = %object_id,
            file_name = %file_name,
            tag_count = tags.len(),
            has_acl = access_control.is_some(),
            "created file"
        );

        Ok(CreatedFile { file: bytes, object_id })
    }

    /// `getFile(objectId) -> {success, file?, error?}`.
    pub async fn get_file(&self, object_id: &str) -> Envelope<Vec<u8>> {
        match get_with_retry(
            self.inner.storage.as_ref(),
            object_id,
            self.inner.config.storage_get_retries,
            &self.inner.config.storage_retry_backoff,
        )
        .await
        {
            Ok(Some(bytes)) => Envelope::ok(bytes),
            Ok(None) => Envelope::err(&ServiceError::Storage(StorageError::FileNotFound)),
            Err(e) => Envelope::err(&ServiceError::Storage(e)),
        }
    }

    fn decode_and_verify(&self, file: &[u8]) -> Result<Container, ServiceError> {
        let container = wire::decode(file)?;
        if self.inner.config.enable_integrity_validation {
            let signing = self.inner.signing_keys.read().unwrap();
            engine::verify_signatures(
                &container,
                &signing.platform.public,
                &signing.user.public,
                &signing.content.public,
            )?;
        }
        Ok(container)
    }

    /// `decryptFile(file, userId, userKeyMaterial) -> plaintext`.
    pub async fn decrypt_file(
        &self,
        file: &[u8],
        user_id: &str,
        user_key_material: &[u8],
    ) -> Result<Vec<u8>, ServiceError> {
        let container = match self.decode_and_verify(file) {
            Ok(c) => c,
            Err(e) => {
                self.inner.compromise.record_failure(user_id);
                return Err(e);
            }
        };
        let codec = self.inner.codec();
        match engine::decrypt_container(&container, user_key_material, codec.as_deref()) {
            Ok(plaintext) => {
                self.inner.compromise.record_success(user_id);
                Ok(plaintext)
            }
            Err(e) => {
                self.inner.compromise.record_failure(user_id);
                Err(e.into())
            }
        }
    }

    /// `updateMetadata(file, userId, metadataPatch) -> file`. See
    /// [`MetadataPatch`] for the key-material deviation from the spec's
    /// literal 3-argument signature.
    pub async fn update_metadata(
        &self,
        file: &[u8],
        keys: KeyMaterial<'_>,
        patch: &MetadataPatch,
    ) -> Result<Vec<u8>, ServiceError> {
        let container = self.decode_and_verify(file)?;
        let codec = self.inner.codec();
        let plaintext =
            engine::decrypt_container(&container, keys.user_key_material, codec.as_deref())?;

        let mut metadata = container.metadata.clone();
        patch.apply(&mut metadata);
        let searchable_text = metadata.file_name.clone();

        let signing = self.inner.signing_keys.read().unwrap();
        let output = engine::encrypt_container(
            &plaintext,
            EncryptParams {
                user_id: keys.user_id.to_vec(),
                platform_key_id: keys.platform_key_id.to_vec(),
                platform_key_material: keys.platform_key_material,
                user_key_material: keys.user_key_material,
                metadata,
                searchable_text: searchable_text.clone(),
                created_at: container.header.created_at,
                chunk_size: self.inner.config.chunk_size,
                codec: codec.as_deref(),
                compression_level: self.inner.config.clamped_compression_level(),
                buckets: self.inner.config.bucket_sizes(),
                platform_signing_key: &signing.platform,
                user_signing_key: &signing.user,
                content_signing_key: &signing.content,
            },
        )?;
        drop(signing);

        let file_id_hex = hex::encode(output.container.header.file_id);
        self.inner.cache.insert(file_id_hex.clone(), output.content_key);

        if self.inner.config.enable_searchable_encryption {
            let owner_user_id = String::from_utf8_lossy(keys.user_id).into_owned();
            self.inner.search.index().index_file(&zkim_search::IndexedFile {
                file_id: &file_id_hex,
                owner_user_id: &owner_user_id,
                metadata: &output.container.metadata,
                body_preview: &searchable_text,
            });
        }

        Ok(wire::encode(&output.container)?)
    }

    /// `downloadFile(objectId, userId, platformKeyMaterial?, userKeyMaterial)
    /// -> {success, data?, error?}`.
    pub async fn download_file(
        &self,
        object_id: &str,
        user_id: &str,
        user_key_material: &[u8],
    ) -> Envelope<Vec<u8>> {
        let bytes = match get_with_retry(
            self.inner.storage.as_ref(),
            object_id,
            self.inner.config.storage_get_retries,
            &self.inner.config.storage_retry_backoff,
        )
        .await
        {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Envelope::err(&ServiceError::Storage(StorageError::FileNotFound)),
            Err(e) => return Envelope::err(&ServiceError::Storage(e)),
        };

        match self.decrypt_file(&bytes, user_id, user_key_material).await {
            Ok(plaintext) => Envelope::ok(plaintext),
            Err(e) => Envelope::err(&e),
        }
    }

    /// `searchFiles(query, userId, limit?) -> {results, ...}`.
    pub fn search_files(
        &self,
        query: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Envelope<Vec<zkim_search::SearchHit>> {
        if !self.inner.config.enable_searchable_encryption {
            return Envelope::err(&ServiceError::Lifecycle(
                zkim_search::error::LifecycleError::SearchableEncryptionDisabled,
            ));
        }
        let epoch = self.query_epoch();
        match self.inner.search.index().search(query, user_id, limit.unwrap_or(20), epoch as u64) {
            Ok(hits) => Envelope::ok(hits),
            Err(e) => Envelope::err(&ServiceError::Lifecycle(e.0)),
        }
    }

    /// `validateIntegrity(file) -> {isValid, validationLevel, errors?, warnings?}`.
    pub fn validate_integrity(&self, file: &[u8]) -> IntegrityReport {
        let container = match wire::decode(file) {
            Ok(c) => c,
            Err(e) => {
                return IntegrityReport {
                    is_valid: false,
                    validation_level: "none",
                    errors: vec![e.to_string()],
                    warnings: vec![],
                }
            }
        };

        if !self.inner.config.enable_integrity_validation {
            return IntegrityReport {
                is_valid: true,
                validation_level: "none",
                errors: vec![],
                warnings: vec![],
            };
        }

        let mut errors = Vec::new();
        if let Err(e) = container.validate_chunk_invariants() {
            errors.push(e.to_string());
        }
        {
            let signing = self.inner.signing_keys.read().unwrap();
            if let Err(e) = engine::verify_signatures(
                &container,
                &signing.platform.public,
                &signing.user.public,
                &signing.content.public,
            ) {
                errors.push(e.to_string());
            }
        }

        IntegrityReport {
            is_valid: errors.is_empty(),
            validation_level: "full",
            errors,
            warnings: vec![],
        }
    }

    /// `recoverFromCorruption(bytes, fileId, opts?) -> RecoveryResult`.
    ///
    /// `user_key_material` is required to actually recover plaintext past
    /// the `recover`/default strategies; the spec's literal signature
    /// omits it for the same reason `updateMetadata`'s does (see
    /// [`MetadataPatch`]).
    pub fn recover_from_corruption(
        &self,
        bytes: &[u8],
        user_key_material: &[u8],
        enable_reconstruction: bool,
        max_repair_attempts: Option<u32>,
    ) -> recovery::RecoveryResult {
        let codec = self.inner.codec();
        recovery::recover(
            bytes,
            enable_reconstruction,
            max_repair_attempts.unwrap_or(recovery::DEFAULT_MAX_REPAIR_ATTEMPTS),
            |container, _skip_signatures| {
                engine::decrypt_container(container, user_key_material, codec.as_deref()).ok()
            },
        )
    }

    // --- Trapdoor lifecycle delegation (§6) ---

    pub fn create_trapdoor(
        &self,
        user_id: &str,
        query: &str,
        max_usage: Option<u64>,
    ) -> Result<Trapdoor, ServiceError> {
        if !self.inner.config.enable_searchable_encryption {
            return Err(ServiceError::Lifecycle(
                zkim_search::error::LifecycleError::SearchableEncryptionDisabled,
            ));
        }
        self.inner
            .search
            .trapdoors()
            .create(user_id, query, max_usage)
            .map_err(|e| ServiceError::Lifecycle(e.0))
    }

    pub fn rotate_trapdoor(&self, trapdoor_id: &str) -> Result<Trapdoor, ServiceError> {
        self.inner.search.trapdoors().rotate(trapdoor_id).map_err(|e| ServiceError::Lifecycle(e.0))
    }

    pub fn revoke_trapdoor(&self, trapdoor_id: &str, reason: Option<&str>) -> Result<(), ServiceError> {
        self.inner
            .search
            .trapdoors()
            .revoke(trapdoor_id, reason)
            .map_err(ServiceError::Lifecycle)
    }

    pub fn update_trapdoor_usage(
        &self,
        trapdoor_id: &str,
    ) -> Result<zkim_search::UsageOutcome, ServiceError> {
        self.inner
            .search
            .trapdoors()
            .update_usage(trapdoor_id)
            .map_err(ServiceError::Lifecycle)
    }

    pub fn get_trapdoor_info(&self, trapdoor_id: &str) -> Option<Trapdoor> {
        self.inner.search.trapdoors().get(trapdoor_id)
    }

    pub fn get_user_trapdoors(&self, user_id: &str) -> Vec<Trapdoor> {
        self.inner.search.trapdoors().for_user(user_id)
    }

    pub fn get_rotation_events(&self, trapdoor_id: &str) -> Vec<zkim_search::audit::AuditEvent> {
        self.inner.search.trapdoors().audit_events_for(trapdoor_id)
    }

    pub fn get_usage_stats(&self, trapdoor_id: &str) -> Option<UsageStats> {
        self.get_trapdoor_info(trapdoor_id).map(|t| UsageStats {
            usage_count: t.usage_count,
            max_usage: t.max_usage,
            is_revoked: t.is_revoked(),
        })
    }

    /// Scheduled rotation sweep (§4.5/§5), to be driven by a caller-owned
    /// timer (or test harness advancing a `FixedClock`) rather than a
    /// timer this facade starts itself.
    pub fn run_rotation_sweep(&self) {
        self.inner.search.trapdoors().sweep();
    }

    /// `rotateKeys()`, gated by `enableKeyRotation`. Replaces all three
    /// signing keypairs; the old ones are dropped (and with them, the
    /// secret key bytes they held).
    pub fn rotate_keys(&self) -> Result<(), ServiceError> {
        if !self.inner.config.enable_key_rotation {
            return Err(ServiceError::Service(ServiceLifecycleError::KeyRotationDisabled));
        }
        let mut signing = self.inner.signing_keys.write().unwrap();
        *signing = SigningKeys::generate();
        drop(signing);
        self.inner.cache.clear();
        tracing::info!("rotated platform/user/content signing keys");
        Ok(())
    }

    /// `checkKeyCompromise()`, gated by `enableCompromiseDetection`.
    pub fn check_key_compromise(&self, user_id: &str) -> Result<CompromiseReport, ServiceError> {
        if !self.inner.config.enable_compromise_detection {
            return Err(ServiceError::Service(ServiceLifecycleError::CompromiseDetectionDisabled));
        }
        Ok(self.inner.compromise.report_for(user_id))
    }

    /// Idempotent cleanup (§5): zeroizes the content-key cache and
    /// releases the service back to `Uninitialized`. Bounded by
    /// `cleanupTimeout`; inner failures are logged and swallowed so
    /// cleanup always completes.
    pub async fn cleanup(self) -> Result<ZkimService<Uninitialized>, ServiceError> {
        let timeout = self.inner.config.cleanup_timeout;
        let inner = self.inner.clone();
        let result = tokio::time::timeout(timeout, async move {
            inner.cache.clear();
        })
        .await;
        if result.is_err() {
            tracing::warn!("cleanup exceeded cleanupTimeout; state was cleared best-effort");
        }
        Ok(ZkimService { inner: self.inner, _state: PhantomData })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBackend;
    use zkim_search::clock::SystemClock;

    fn test_metadata(name: &str) -> Metadata {
        Metadata::new(name, "text/plain", 0)
    }

    async fn ready_service() -> ZkimService<Ready> {
        let storage = Arc::new(InMemoryBackend::new());
        let clock = Arc::new(SystemClock);
        ZkimService::new(Config::default(), storage, clock).init().await.unwrap()
    }

    #[tokio::test]
    async fn round_trip_small_plaintext() {
        let service = ready_service().await;
        let keys = KeyMaterial {
            user_id: b"alice",
            platform_key_id: b"platform-1",
            platform_key_material: b"platform-secret-material-32bytes",
            user_key_material: b"alice-secret-material-32-bytes!",
        };
        let created = service
            .create_file(b"Hello, ZKIM!", keys, test_metadata("hello.txt"), "hello", false)
            .await
            .unwrap();

        let plaintext = service
            .decrypt_file(&created.file, "alice", b"alice-secret-material-32-bytes!")
            .await
            .unwrap();
        assert_eq!(plaintext, b"Hello, ZKIM!");
    }

    #[tokio::test]
    async fn tamper_detection_fails_closed() {
        let service = ready_service().await;
        let keys = KeyMaterial {
            user_id: b"alice",
            platform_key_id: b"platform-1",
            platform_key_material: b"platform-secret-material-32bytes",
            user_key_material: b"alice-secret-material-32-bytes!",
        };
        let created = service
            .create_file(b"Hello, ZKIM!", keys, test_metadata("hello.txt"), "hello", false)
            .await
            .unwrap();

        let mut tampered = created.file.clone();
        let flip_at = tampered.len() - 1;
        tampered[flip_at] ^= 0x01;

        let report = service.validate_integrity(&tampered);
        assert!(!report.is_valid);

        let result = service.decrypt_file(&tampered, "alice", b"alice-secret-material-32-bytes!").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn wrong_key_never_returns_corrupt_plaintext() {
        let service = ready_service().await;
        let keys = KeyMaterial {
            user_id: b"alice",
            platform_key_id: b"platform-1",
            platform_key_material: b"platform-secret-material-32bytes",
            user_key_material: b"alice-secret-material-32-bytes!",
        };
        let created = service
            .create_file(b"Hello, ZKIM!", keys, test_metadata("hello.txt"), "hello", false)
            .await
            .unwrap();

        let result = service.decrypt_file(&created.file, "alice", b"wrong-key-material-32-bytes!!!!").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn access_filtering_hides_file_from_non_authorized_user() {
        let service = ready_service().await;
        let mut metadata = test_metadata("plan");
        metadata.access_control = Some(AccessControl {
            read_access: ["alice".to_string()].into_iter().collect(),
            write_access: Default::default(),
            delete_access: Default::default(),
        });
        let keys = KeyMaterial {
            user_id: b"alice",
            platform_key_id: b"platform-1",
            platform_key_material: b"platform-secret-material-32bytes",
            user_key_material: b"alice-secret-material-32-bytes!",
        };
        service.create_file(b"quarterly plan", keys, metadata, "plan", false).await.unwrap();

        let alice_hits = service.search_files("plan", "alice", None);
        assert!(alice_hits.success);
        assert!(alice_hits.data.unwrap().iter().any(|h| !h.file_id.is_empty()));

        let bob_hits = service.search_files("plan", "bob", None);
        assert!(bob_hits.success);
        assert!(bob_hits.data.unwrap().iter().all(|h| h.file_id.is_empty()));
    }

    #[tokio::test]
    async fn rotate_keys_requires_config_flag() {
        let mut config = Config::default();
        config.enable_key_rotation = false;
        let storage = Arc::new(InMemoryBackend::new());
        let clock = Arc::new(SystemClock);
        let service = ZkimService::new(config, storage, clock).init().await.unwrap();
        assert!(service.rotate_keys().is_err());
    }

    #[tokio::test]
    async fn cleanup_clears_content_key_cache() {
        let service = ready_service().await;
        let keys = KeyMaterial {
            user_id: b"alice",
            platform_key_id: b"platform-1",
            platform_key_material: b"platform-secret-material-32bytes",
            user_key_material: b"alice-secret-material-32-bytes!",
        };
        service.create_file(b"data", keys, test_metadata("f"), "f", false).await.unwrap();
        let uninit = service.cleanup().await.unwrap();
        let _ = uninit.init().await.unwrap();
    }
}
