//! # zkim-core
//!
//! Wire Codec, Encryption Engine and Content Processor for the ZKIM
//! post-quantum-secure file container format.
//!
//! This crate is the cryptographic and binary-format core: it has no
//! opinion about where containers are stored, how searchable-encryption
//! trapdoors are managed, or what a caller's access-control policy looks
//! like. Those concerns live in `zkim-search` (OPRF trapdoors, query
//! matching, lifecycle) and `zkim-service` (the facade that owns a storage
//! backend and wires everything together).
//!
//! ## Quick start
//!
//! ```rust
//! use zkim_core::engine::{self, EncryptParams};
//! use zkim_core::model::{Metadata, BUCKET_SIZES, DEFAULT_CHUNK_SIZE};
//! use zkim_core::signature;
//! use zkim_core::wire;
//!
//! let platform_signing = signature::generate_keypair();
//! let user_signing = signature::generate_keypair();
//! let content_signing = signature::generate_keypair();
//!
//! let params = EncryptParams {
//!     user_id: b"alice".to_vec(),
//!     platform_key_id: b"platform-1".to_vec(),
//!     platform_key_material: b"platform-secret",
//!     user_key_material: b"alice-secret",
//!     metadata: Metadata::new("plan.txt", "text/plain", 0),
//!     searchable_text: "quarterly plan".into(),
//!     created_at: 0,
//!     chunk_size: DEFAULT_CHUNK_SIZE,
//!     codec: None,
//!     compression_level: 0,
//!     buckets: BUCKET_SIZES,
//!     platform_signing_key: &platform_signing,
//!     user_signing_key: &user_signing,
//!     content_signing_key: &content_signing,
//! };
//!
//! let out = engine::encrypt_container(b"Hello, ZKIM!", params).unwrap();
//! let bytes = wire::encode(&out.container).unwrap();
//! let decoded = wire::decode(&bytes).unwrap();
//! let plaintext = engine::decrypt_container(&decoded, b"alice-secret", None).unwrap();
//! assert_eq!(plaintext, b"Hello, ZKIM!");
//! ```
//!
//! ## What's NOT provided
//!
//! - Persistent storage (see `zkim-service::StorageBackend`)
//! - Searchable-encryption trapdoors (see `zkim-search`)
//! - HTTP/framework integration or authentication plumbing

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod aead;
pub mod compression;
pub mod content;
pub mod error;
pub mod kdf;
pub mod kem;
pub mod model;
pub mod signature;
pub mod wire;

#[cfg(feature = "std")]
pub mod engine;

#[cfg(feature = "std")]
pub mod recovery;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{CryptoError, RecoveryError, WireError, ZkimError};
pub use model::{Container, Header, Metadata};

/// Crate version, exposed for container inspection tooling.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire container format version this crate writes and reads.
pub const PROTOCOL_VERSION: u16 = model::CONTAINER_VERSION;
