//! Error types for vendor device operations.
//!
//! The vendor SDK signals everything through an integer status code; this
//! module gives those codes a typed surface and wraps them in a structured
//! error so no raw code ever crosses the crate boundary unexplained.

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Vendor SDK status codes.
///
/// `Ok` (code 0) means success; every other code is a failure mode. The
/// variants cover the codes the recovery subsystem needs to distinguish;
/// anything else is carried through as [`VendorStatus::Unknown`].
///
/// [`VendorStatus::AccessDenied`] (code 2) is the load-bearing one: it is
/// the code a wedged USB device returns for every call, and it is the
/// trigger for the automatic recovery state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum VendorStatus {
    /// Operation succeeded (code 0).
    Ok,

    /// SDK instance creation failed (code 1).
    CreationFailed,

    /// Device access error (code 2). The transient-failure signature of a
    /// wedged reader; triggers automatic recovery.
    AccessDenied,

    /// Invalid device index (code 3).
    InvalidIndex,

    /// Device not found on the bus (code 4).
    DeviceNotFound,

    /// Device open failed (code 5).
    OpenFailed,

    /// Template data was rejected by the match routine (code 104).
    InvalidTemplate,

    /// Any other vendor code.
    Unknown(i32),
}

impl VendorStatus {
    /// Map a raw vendor code to a status.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::CreationFailed,
            2 => Self::AccessDenied,
            3 => Self::InvalidIndex,
            4 => Self::DeviceNotFound,
            5 => Self::OpenFailed,
            104 => Self::InvalidTemplate,
            other => Self::Unknown(other),
        }
    }

    /// The raw vendor code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CreationFailed => 1,
            Self::AccessDenied => 2,
            Self::InvalidIndex => 3,
            Self::DeviceNotFound => 4,
            Self::OpenFailed => 5,
            Self::InvalidTemplate => 104,
            Self::Unknown(code) => *code,
        }
    }

    /// Whether this status is the success code.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Whether this status is the device-access error that warrants
    /// automatic recovery.
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::AccessDenied)
    }
}

impl std::fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::CreationFailed => "creation failed",
            Self::AccessDenied => "device access error",
            Self::InvalidIndex => "invalid device index",
            Self::DeviceNotFound => "device not found",
            Self::OpenFailed => "device open failed",
            Self::InvalidTemplate => "invalid template data",
            Self::Unknown(_) => "unknown vendor error",
        };
        write!(f, "{} (code {})", name, self.code())
    }
}

/// Errors that can occur while talking to the fingerprint reader.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// A vendor SDK call returned a non-success status.
    #[error("{operation} failed: {status}")]
    Vendor {
        /// The SDK operation that failed.
        operation: &'static str,
        /// The vendor status it returned.
        status: VendorStatus,
    },

    /// No candidate device id could be opened.
    #[error("no device opened on any candidate id")]
    NoDeviceOpened,

    /// The device handle has been discarded and not yet recreated.
    #[error("no device handle: {reason}")]
    NoHandle { reason: String },

    /// The scanner backend went away (a mock channel closed, a worker died).
    #[error("scanner disconnected: {reason}")]
    Disconnected { reason: String },
}

impl DeviceError {
    /// Create a vendor error from an operation name and a raw code.
    pub fn vendor(operation: &'static str, status: VendorStatus) -> Self {
        Self::Vendor { operation, status }
    }

    /// Create a no-handle error.
    pub fn no_handle(reason: impl Into<String>) -> Self {
        Self::NoHandle {
            reason: reason.into(),
        }
    }

    /// Create a disconnected error.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    /// The vendor status carried by this error, if any.
    pub fn vendor_status(&self) -> Option<VendorStatus> {
        match self {
            Self::Vendor { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is the device-access failure that should trigger
    /// automatic recovery.
    pub fn is_access_error(&self) -> bool {
        self.vendor_status()
            .is_some_and(|status| status.is_access_error())
    }
}
