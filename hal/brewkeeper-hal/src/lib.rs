//! BrewKeeper Hardware Abstraction Layer
//!
//! This crate defines the persistence traits the controller core is written
//! against. Chip or host specific crates implement them on top of a flash
//! file system, an EEPROM page, or plain files.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  brewkeeper-core (scheduler, keeper)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  brewkeeper-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  flash / FS   │       │  host files   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::Storage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod storage;

pub use storage::{Storage, StorageError, StorageKey};
