//! Error surface of the session layer.

use huella_core::TemplateError;
use huella_device::DeviceError;
use huella_usb::UsbResetError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the session layer.
///
/// These are the terminal outcomes a caller can see; everything the
/// recovery state machine absorbs internally never reaches this enum.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The operation gate could not be acquired within the bounded wait.
    #[error("device busy: another operation is in progress")]
    DeviceBusy,

    /// The device is not initialized and could not be brought up.
    #[error("device not initialized: {reason}")]
    NotInitialized { reason: String },

    /// A recovery attempt arrived inside the minimum spacing window.
    #[error("recovery suppressed: previous attempt too recent")]
    RecoveryRateLimited,

    /// The sensor reported geometry outside the accepted range.
    #[error("invalid sensor dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// The computed image buffer exceeds the allocation cap.
    #[error("image buffer of {size} bytes exceeds cap of {cap}")]
    BufferTooLarge { size: usize, cap: usize },

    /// No usable frame was acquired within the attempt and time budget.
    #[error("fingerprint capture failed after {attempts} attempts")]
    CaptureFailed {
        attempts: u32,
        last_vendor_code: Option<i32>,
    },

    /// No stored template under the requested id.
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    /// Raw template data failed validation.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A device call failed and was not recoverable.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The hardware USB reset failed.
    #[error(transparent)]
    UsbReset(#[from] UsbResetError),
}

impl ServiceError {
    /// Create a not-initialized error.
    pub fn not_initialized(reason: impl Into<String>) -> Self {
        Self::NotInitialized {
            reason: reason.into(),
        }
    }

    /// The vendor code behind this error, if one exists.
    pub fn vendor_code(&self) -> Option<i32> {
        match self {
            Self::Device(error) => error.vendor_status().map(|status| status.code()),
            Self::CaptureFailed {
                last_vendor_code, ..
            } => *last_vendor_code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huella_device::VendorStatus;

    #[test]
    fn test_vendor_code_extraction() {
        let error: ServiceError = DeviceError::vendor("get_image", VendorStatus::AccessDenied).into();
        assert_eq!(error.vendor_code(), Some(2));

        let error = ServiceError::CaptureFailed {
            attempts: 3,
            last_vendor_code: Some(2),
        };
        assert_eq!(error.vendor_code(), Some(2));

        assert_eq!(ServiceError::DeviceBusy.vendor_code(), None);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ServiceError::InvalidDimensions {
                width: 0,
                height: 9000
            }
            .to_string(),
            "invalid sensor dimensions 0x9000"
        );
        assert_eq!(
            ServiceError::TemplateNotFound {
                id: "user-1".into()
            }
            .to_string(),
            "template not found: user-1"
        );
    }
}
