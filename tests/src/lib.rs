//! # OCR Test Suite
//!
//! Cross-subsystem scenarios run against the in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs           # keys, configs, clusters of nodes
//!     ├── config_flow.rs        # tracker → supervisor adoption
//!     ├── transmission_flow.rs  # staging, deviation, crash recovery
//!     └── routing_flow.rs       # network → router epoch buffering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ocr-tests
//! cargo test -p ocr-tests integration::transmission_flow
//! ```

pub mod integration;
