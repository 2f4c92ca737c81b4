//! # zkim-search
//!
//! Searchable-encryption Search Index and Trapdoor Lifecycle for ZKIM
//! containers: OPRF-based token trapdoors, relevance-ranked access-filtered
//! queries, and the `created -> (rotated | revoked | expired)` trapdoor
//! state machine with audit logging and optional anomaly detection.
//!
//! ```no_run
//! use std::sync::Arc;
//! use zkim_search::{clock::SystemClock, config::Config, oprf::OprfKey, SearchEngine};
//!
//! let engine = SearchEngine::new(Arc::new(SystemClock), Config::default(), OprfKey::generate());
//! let trapdoor = engine.trapdoors().create("alice", "report", None).unwrap();
//! ```

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod index;
pub mod oprf;
pub mod token;
pub mod trapdoor;

use std::sync::Arc;

pub use clock::Clock;
pub use config::Config;
pub use error::{CreateError, LifecycleError, RotateError, SearchError};
pub use index::{IndexedFile, SearchHit, SearchIndex};
pub use oprf::OprfKey;
pub use trapdoor::{Trapdoor, TrapdoorManager, TrapdoorState, UsageOutcome};

/// Facade binding one `SearchIndex` to one `TrapdoorManager` under a
/// shared OPRF key, since `search` must evaluate query tokens under the
/// exact key `indexFile` used.
pub struct SearchEngine {
    index: SearchIndex,
    trapdoors: TrapdoorManager,
}

impl SearchEngine {
    pub fn new(clock: Arc<dyn Clock>, config: Config, key: OprfKey) -> Self {
        let index = SearchIndex::new(
            key.clone(),
            config.max_queries_per_epoch,
            config.enable_rate_limiting,
            config.enable_result_padding,
            config.bucket_sizes.clone(),
        );
        let trapdoors = TrapdoorManager::new(clock, config);
        Self { index, trapdoors }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn trapdoors(&self) -> &TrapdoorManager {
        &self.trapdoors
    }
}
