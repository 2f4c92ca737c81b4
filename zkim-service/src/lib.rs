//! # zkim-service
//!
//! The ZKIM service facade (§5, §6, §7): storage-backed containers, the
//! trapdoor lifecycle, key rotation and compromise detection, tied
//! together behind the public operation surface and a uniform error
//! envelope for operations that may plausibly fail without that failure
//! being a hard stop.
//!
//! ```no_run
//! use std::sync::Arc;
//! use zkim_core::model::Metadata;
//! use zkim_search::clock::SystemClock;
//! use zkim_service::{Config, KeyMaterial, ZkimService};
//! use zkim_service::storage::InMemoryBackend;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ZkimService::new(
//!     Config::default(),
//!     Arc::new(InMemoryBackend::new()),
//!     Arc::new(SystemClock),
//! )
//! .init()
//! .await?;
//!
//! let created = service
//!     .create_file(
//!         b"Hello, ZKIM!",
//!         KeyMaterial {
//!             user_id: b"alice",
//!             platform_key_id: b"platform-1",
//!             platform_key_material: b"platform-secret-material-32bytes",
//!             user_key_material: b"alice-secret-material-32-bytes!",
//!         },
//!         Metadata::new("hello.txt", "text/plain", 0),
//!         "hello",
//!         false,
//!     )
//!     .await?;
//! let plaintext = service
//!     .decrypt_file(&created.file, "alice", b"alice-secret-material-32-bytes!")
//!     .await?;
//! assert_eq!(plaintext, b"Hello, ZKIM!");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod compromise;
pub mod config;
pub mod error;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::{Envelope, ServiceError, ServiceLifecycleError, StorageError};
pub use service::{
    CreatedFile, IntegrityReport, KeyMaterial, MetadataPatch, Ready, UsageStats, Uninitialized,
    ZkimService,
};
