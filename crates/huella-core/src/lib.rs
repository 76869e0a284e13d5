//! Core domain types for the Huella fingerprint reader service.
//!
//! This crate holds the types shared by every other Huella crate: the opaque
//! fixed-size fingerprint template blob, the vendor security-level mapping,
//! and the policy constants that bound device operations.
//!
//! Nothing in this crate touches hardware. The vendor SDK seam lives in
//! `huella-device`; the lifecycle logic lives in `huella-session`.

pub mod constants;
pub mod security;
pub mod template;

pub use security::SecurityLevel;
pub use template::{Template, TemplateError};
