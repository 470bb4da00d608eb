//! Reactive key/value storage for Linguist.
//!
//! The background persists everything through an asynchronous key/value
//! backend. This crate wraps such a backend with typed, observable stores so
//! subscribers never couple to the storage technology.
//!
//! # Backends
//!
//! All backends implement the [`KeyValueBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based backend for tests and embedding
//! - [`FileBackend`] -- one JSON document per key under a directory
//!
//! # Design Rules
//!
//! 1. Writes through one [`ObservableStore`] are serialized FIFO; a
//!    read-modify-write never interleaves with another.
//! 2. A snapshot becomes visible to watchers only after the backend accepted it.
//! 3. Watchers fire immediately on subscribe, then only when their projected
//!    value changes, in registration order.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod collection;
pub mod error;
pub mod file;
pub mod memory;
pub mod observable;
pub mod path;
pub mod traits;

pub use collection::{Collection, Record, RecordId};
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use observable::{Observable, ObservableStore, StoreValue, Subscription};
pub use traits::KeyValueBackend;
