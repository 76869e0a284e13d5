//! Error bodies and HTTP status mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use huella_session::{ServiceError, SessionSnapshot};

/// An endpoint failure: the HTTP status to answer with and the JSON body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,

    pub error: String,

    /// Raw vendor code behind the failure, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Device-state context attached to failures, so operators can tell a
/// transient busy reader from one that has been escalating for a while.
#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub device_initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<i32>,
    pub operation_count: u32,
    pub recovery_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub suggestion: &'static str,
}

/// The HTTP status an error maps to.
fn http_status(error: &ServiceError) -> u16 {
    match error {
        ServiceError::DeviceBusy | ServiceError::RecoveryRateLimited => 503,
        ServiceError::TemplateNotFound { .. } => 404,
        ServiceError::InvalidDimensions { .. }
        | ServiceError::BufferTooLarge { .. }
        | ServiceError::Template(_) => 400,
        _ => 500,
    }
}

/// A short operator hint per failure class.
fn suggestion(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::DeviceBusy | ServiceError::RecoveryRateLimited => {
            "retry after a short pause; another operation or a recovery is in progress"
        }
        ServiceError::CaptureFailed { .. } => {
            "place the finger flat on the sensor and retry; check the reader if this persists"
        }
        ServiceError::NotInitialized { .. } | ServiceError::Device(_) => {
            "retry once; if the device stays down, use the reset endpoint"
        }
        ServiceError::UsbReset(_) => {
            "check that the reader is attached and the service may write its sysfs node"
        }
        ServiceError::TemplateNotFound { .. } => "enroll the template before comparing against it",
        ServiceError::InvalidDimensions { .. } | ServiceError::BufferTooLarge { .. } => {
            "the sensor reported nonsense geometry; reset the device"
        }
        ServiceError::Template(_) => "template data must be exactly the vendor template size",
    }
}

impl ApiError {
    /// Build the error body for a failed operation, attaching device
    /// diagnostics when a session snapshot is available.
    pub fn from_service(error: ServiceError, snapshot: Option<SessionSnapshot>) -> Self {
        let status = http_status(&error);
        let hint = suggestion(&error);
        let diagnostics = snapshot.map(|snapshot| Diagnostics {
            device_initialized: snapshot.initialized,
            device_id: snapshot.current_device_id,
            operation_count: snapshot.operation_count,
            recovery_attempts: snapshot.recovery_attempts,
            last_error: snapshot.last_error,
            timestamp: Utc::now(),
            suggestion: hint,
        });
        Self {
            status,
            error: error.to_string(),
            vendor_code: error.vendor_code(),
            diagnostics,
        }
    }

    /// A request-validation failure, no device involved.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            error: message.into(),
            vendor_code: None,
            diagnostics: None,
        }
    }

    /// A not-found failure, no device involved.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            error: message.into(),
            vendor_code: None,
            diagnostics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huella_core::TemplateError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(http_status(&ServiceError::DeviceBusy), 503);
        assert_eq!(
            http_status(&ServiceError::TemplateNotFound { id: "x".into() }),
            404
        );
        assert_eq!(
            http_status(&ServiceError::InvalidDimensions {
                width: 0,
                height: 0
            }),
            400
        );
        assert_eq!(
            http_status(&ServiceError::Template(TemplateError::WrongSize {
                expected: 400,
                actual: 3
            })),
            400
        );
        assert_eq!(
            http_status(&ServiceError::CaptureFailed {
                attempts: 3,
                last_vendor_code: Some(2)
            }),
            500
        );
    }

    #[test]
    fn test_body_carries_vendor_code_and_diagnostics() {
        let snapshot = SessionSnapshot {
            initialized: false,
            current_device_id: Some(0),
            operation_count: 12,
            recovery_attempts: 2,
            last_error: Some("get_image failed: device access error (code 2)".into()),
        };
        let body = ApiError::from_service(
            ServiceError::CaptureFailed {
                attempts: 3,
                last_vendor_code: Some(2),
            },
            Some(snapshot),
        );

        assert_eq!(body.status, 500);
        assert_eq!(body.vendor_code, Some(2));
        let diagnostics = body.diagnostics.unwrap();
        assert_eq!(diagnostics.recovery_attempts, 2);
        assert!(!diagnostics.device_initialized);
    }

    #[test]
    fn test_status_field_not_serialized() {
        let body = ApiError::bad_request("exactly one operand per template");
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("status"));
        assert!(json.contains("exactly one operand"));
    }
}
