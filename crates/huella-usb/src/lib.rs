//! Hardware-level USB reset for the Huella fingerprint reader.
//!
//! When every software recovery tier has failed, the last resort is to make
//! the kernel drop and re-enumerate the physical device. This crate
//! abstracts that behind [`UsbResetProvider`] so the session layer only
//! ever calls `reset_device(vendor_id, product_id)` and never embeds bus
//! mechanics:
//!
//! - [`SysfsUsbReset`] — Linux implementation: locates the reader with
//!   `rusb`, then toggles the device's sysfs `authorized` flag off and on,
//!   which forces the kernel to deauthorize and re-enumerate it.
//! - [`MockUsbReset`] — scripted provider for tests.

#![allow(async_fn_in_trait)]

pub mod mock;
pub mod sysfs;

pub use mock::MockUsbReset;
pub use sysfs::SysfsUsbReset;

/// Result type alias for USB reset operations.
pub type Result<T> = std::result::Result<T, UsbResetError>;

/// Errors that can occur during a hardware-level USB reset.
#[derive(Debug, thiserror::Error)]
pub enum UsbResetError {
    /// No attached device matched the vendor/product filter.
    #[error("no USB device found matching {vendor_id:04x}:{product_filter}")]
    DeviceNotFound {
        vendor_id: u16,
        product_filter: String,
    },

    /// Bus enumeration failed.
    #[error("USB enumeration failed: {0}")]
    Enumeration(#[from] rusb::Error),

    /// Writing the sysfs authorization flag failed.
    #[error("failed to write {path}: {source}")]
    Authorize {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The provider was scripted to fail (mock only).
    #[error("USB reset failed: {0}")]
    Failed(String),
}

impl UsbResetError {
    /// Create a device-not-found error for the given filter.
    pub fn device_not_found(vendor_id: u16, product_id: Option<u16>) -> Self {
        Self::DeviceNotFound {
            vendor_id,
            product_filter: match product_id {
                Some(pid) => format!("{pid:04x}"),
                None => "*".to_string(),
            },
        }
    }
}

/// Hardware-level reset of a physical USB device.
///
/// Implementations locate the device by vendor id (and optionally product
/// id) and force the host to drop and re-enumerate it. The call is slow by
/// nature — several seconds of deauthorize/reauthorize pauses — and is only
/// ever invoked while the operation gate is held, so nothing else can touch
/// the device mid-reset.
pub trait UsbResetProvider: Send + Sync {
    /// Reset the first attached device matching `vendor_id` and, when
    /// given, `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no matching device is attached or the reset
    /// sequence fails.
    async fn reset_device(&self, vendor_id: u16, product_id: Option<u16>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_not_found_display() {
        let error = UsbResetError::device_not_found(0x1162, None);
        assert_eq!(error.to_string(), "no USB device found matching 1162:*");

        let error = UsbResetError::device_not_found(0x1162, Some(0x2200));
        assert_eq!(error.to_string(), "no USB device found matching 1162:2200");
    }
}
