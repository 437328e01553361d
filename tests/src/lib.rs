//! # Queue Dispatch Test Suite
//!
//! Unified test crate exercising the adaptor crates together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── dispatch_flows.rs   # QueueAdaptor against scripted broker sessions
//!     └── spine_matching.rs   # Fake spine router over SOAP requests
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qd-tests
//! cargo test -p qd-tests integration::dispatch_flows::
//! ```
