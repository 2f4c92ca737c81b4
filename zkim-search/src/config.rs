//! Trapdoor Lifecycle / Search Index configuration (§6, enumerated
//! consumed configuration). No external config-file parser: a plain
//! struct with a `Default` impl encoding every listed default, the same
//! way `zkim-core`'s engine takes a plain `EncryptParams`.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub enable_rotation: bool,
    /// Also the epoch length (`epoch = floor(now / rotationInterval)`).
    pub rotation_interval: Duration,
    pub grace_period: Duration,
    pub enable_revocation: bool,
    pub max_active_trapdoors: usize,
    pub enable_usage_tracking: bool,
    pub enable_anomaly_detection: bool,
    pub enable_audit_logging: bool,
    /// Default `maxUsage` applied to a trapdoor when the caller doesn't
    /// supply one explicitly.
    pub rotation_threshold: u64,
    pub revocation_threshold: u64,

    pub enable_rate_limiting: bool,
    pub max_queries_per_epoch: u64,
    pub epoch_duration: Duration,

    pub enable_result_padding: bool,
    pub bucket_sizes: Vec<usize>,

    pub enable_searchable_encryption: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_rotation: true,
            rotation_interval: Duration::from_secs(3600),
            grace_period: Duration::from_secs(300),
            enable_revocation: true,
            max_active_trapdoors: 1000,
            enable_usage_tracking: true,
            enable_anomaly_detection: false,
            enable_audit_logging: true,
            rotation_threshold: 1000,
            revocation_threshold: 2000,

            enable_rate_limiting: true,
            max_queries_per_epoch: 100,
            epoch_duration: Duration::from_secs(3600),

            enable_result_padding: true,
            bucket_sizes: zkim_core::model::BUCKET_SIZES.to_vec(),

            enable_searchable_encryption: true,
        }
    }
}
