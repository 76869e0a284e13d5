//! Device lifecycle, recovery, and capture orchestration for the Huella
//! fingerprint service.
//!
//! The centerpiece is [`DeviceController`]: one controller per physical
//! reader, serializing every device operation behind a bounded-wait gate
//! and running the lifecycle machinery around each one:
//!
//! - **Preventive maintenance** ([`maintenance`]) — refresh the connection
//!   every N successful operations, health-probe a long-idle device.
//! - **Tiered recovery** ([`recovery`]) — basic, extended, and deep
//!   software tiers escalating to a hardware USB reset, with rate limiting
//!   between attempts.
//! - **Capture pipeline** ([`capture`]) — geometry validation, bounded
//!   acquisition with in-loop recovery, LED bracketing, non-fatal
//!   templating.
//!
//! The controller is generic over
//! [`ScannerFactory`](huella_device::ScannerFactory) and
//! [`UsbResetProvider`](huella_usb::UsbResetProvider), so the whole
//! lifecycle runs unchanged against real hardware or the scripted mocks.

pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
mod maintenance;
mod recovery;
mod session;
pub mod store;

pub use capture::{CaptureOptions, CaptureOutcome};
pub use config::SessionConfig;
pub use controller::{DeviceController, DeviceStatus, MatchOutcome, TemplateSelector};
pub use error::{Result, ServiceError};
pub use recovery::RecoveryLevel;
pub use session::SessionSnapshot;
pub use store::TemplateStore;
