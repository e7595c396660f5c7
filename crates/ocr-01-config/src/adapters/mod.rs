//! # Adapters
//!
//! In-process implementation of the key port.

pub mod local_keys;

pub use local_keys::LocalPrivateKeys;
