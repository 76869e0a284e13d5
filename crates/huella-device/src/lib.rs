//! Vendor fingerprint reader abstraction for the Huella service.
//!
//! This crate is the seam between the device lifecycle logic in
//! `huella-session` and the foreign vendor SDK that actually drives the
//! reader. It defines:
//!
//! - [`FingerprintScanner`] — one SDK handle, mirroring the vendor call set
//!   (create/init/open/close/info/LED/image/template/match) with `Result`
//!   returns instead of raw status codes.
//! - [`ScannerFactory`] — recreates handles from scratch, which the deeper
//!   recovery tiers require.
//! - [`VendorStatus`] / [`DeviceError`] — typed vendor status codes and the
//!   structured errors built from them.
//! - [`mock`] — a scripted scanner for development and testing, in the
//!   absence of physical hardware.
//!
//! A production FFI binding to the vendor library implements
//! [`FingerprintScanner`] here; everything above this crate is generic over
//! the trait and never links the vendor SDK.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{DeviceError, Result, VendorStatus};
pub use traits::{FingerprintScanner, ScannerFactory};
pub use types::SensorInfo;
