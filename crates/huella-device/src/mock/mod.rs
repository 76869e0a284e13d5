//! Mock scanner implementation for testing and development.
//!
//! This module provides a simulated fingerprint reader that can be
//! controlled programmatically without physical hardware: scripted
//! failures per operation, a call log for asserting call order and counts,
//! and an in-flight counter for asserting that the operation gate never
//! lets two device calls overlap.

pub mod scanner;

// Re-export commonly used types
pub use scanner::{MockScanner, MockScannerFactory, MockScript};
