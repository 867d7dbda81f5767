//! # Rendezvous Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs   # wired service, directory, ledger, bus
//!     ├── flows.rs      # request lifecycle scenarios
//!     └── economy.rs    # pricing against the economy variants
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rv-tests
//! cargo test -p rv-tests integration::flows::
//! ```

#![allow(dead_code, unused_imports)]

pub mod integration;
