//! Request and response bodies of the service endpoints.
//!
//! The wire contract keeps the Spanish field and message vocabulary the
//! deployed clients already speak (`mensaje`, `imagen`); field names on
//! request bodies are English. Binary payloads travel as standard base64.

use serde::{Deserialize, Serialize};

use huella_session::{CaptureOutcome, DeviceStatus, MatchOutcome};

use crate::codec;

/// Body of a capture request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureRequest {
    /// Build a template from the captured image.
    #[serde(default)]
    pub create_template: bool,

    /// Store the created template under this id.
    #[serde(default)]
    pub template_id: Option<String>,

    /// Also write the raw frame to the configured image directory.
    #[serde(default)]
    pub save_image: bool,
}

/// Body of a comparison request.
///
/// Each operand is either a stored template id or raw base64 template
/// data; exactly one of the pair must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub template1_id: Option<String>,

    #[serde(with = "codec::base64_bytes_opt", default)]
    pub template1_data: Option<Vec<u8>>,

    #[serde(default)]
    pub template2_id: Option<String>,

    #[serde(with = "codec::base64_bytes_opt", default)]
    pub template2_data: Option<Vec<u8>>,

    /// Vendor security level 1-9; defaults to 5.
    #[serde(default)]
    pub security_level: Option<u8>,
}

/// Body of an LED control request.
#[derive(Debug, Clone, Deserialize)]
pub struct LedRequest {
    /// Desired LED state.
    pub state: bool,
}

/// Generic acknowledgment body.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub mensaje: String,
}

/// Body of a successful capture.
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub mensaje: String,

    /// Raw grayscale frame, base64.
    #[serde(with = "codec::base64_bytes")]
    pub imagen: Vec<u8>,

    pub width: i64,
    pub height: i64,

    /// Template bytes, base64, when one was created.
    #[serde(with = "codec::base64_bytes_opt", skip_serializing_if = "Option::is_none")]
    pub template: Option<Vec<u8>>,

    /// Id the template was stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    /// Path the frame was saved to, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,

    /// Acquisition attempts the frame took.
    pub attempts: u32,

    /// Whether a preventive connection refresh is coming up soon.
    pub maintenance_due: bool,
}

/// Body of a comparison result.
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub mensaje: String,
    pub coinciden: bool,
    pub score: u32,
    pub security_level: u8,
}

/// Body of the template listing.
#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<String>,
    pub count: usize,
}

/// Body of a hardware reset result.
#[derive(Debug, Serialize)]
pub struct ForceResetResponse {
    pub mensaje: String,
    /// Whether the device came back up after the bus reset.
    pub device_ready: bool,
}

/// Body of the device status report.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub initialized: bool,
    pub responsive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    pub operation_count: u32,
    pub recovery_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<DeviceStatus> for StatusResponse {
    fn from(status: DeviceStatus) -> Self {
        Self {
            initialized: status.initialized,
            responsive: status.responsive,
            device_id: status.current_device_id,
            width: status.width,
            height: status.height,
            operation_count: status.operation_count,
            recovery_attempts: status.recovery_attempts,
            last_error: status.last_error,
        }
    }
}

impl CaptureResponse {
    pub(crate) fn from_outcome(outcome: CaptureOutcome, saved_to: Option<String>) -> Self {
        Self {
            mensaje: "Huella capturada exitosamente".to_string(),
            imagen: outcome.image,
            width: outcome.width,
            height: outcome.height,
            template: outcome.template.map(|template| template.to_vec()),
            template_id: outcome.template_stored,
            saved_to,
            attempts: outcome.attempts,
            maintenance_due: outcome.maintenance_due,
        }
    }
}

impl CompareResponse {
    pub(crate) fn from_outcome(outcome: MatchOutcome, level: u8) -> Self {
        let mensaje = if outcome.matched {
            "Las huellas coinciden".to_string()
        } else {
            "Las huellas no coinciden".to_string()
        };
        Self {
            mensaje,
            coinciden: outcome.matched,
            score: outcome.score,
            security_level: level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_request_defaults() {
        let request: CaptureRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.create_template);
        assert!(request.template_id.is_none());
        assert!(!request.save_image);
    }

    #[test]
    fn test_compare_request_accepts_base64_operands() {
        let json = r#"{
            "template1_id": "user-1",
            "template2_data": "AAAA",
            "security_level": 7
        }"#;
        let request: CompareRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.template1_id.as_deref(), Some("user-1"));
        assert_eq!(request.template2_data, Some(vec![0, 0, 0]));
        assert_eq!(request.security_level, Some(7));
    }

    #[test]
    fn test_capture_response_omits_absent_template() {
        let response = CaptureResponse {
            mensaje: "Huella capturada exitosamente".into(),
            imagen: vec![1, 2],
            width: 2,
            height: 1,
            template: None,
            template_id: None,
            saved_to: None,
            attempts: 1,
            maintenance_due: false,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("template"));
        assert!(json.contains("\"imagen\":\"AQI=\""));
    }
}
