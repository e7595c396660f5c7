//! # Adapters Layer

pub mod external;

pub use external::ExternalProtocol;
