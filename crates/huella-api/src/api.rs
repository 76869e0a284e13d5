//! Endpoint handlers over the device controller.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use huella_core::SecurityLevel;
use huella_device::ScannerFactory;
use huella_session::{CaptureOptions, DeviceController, ServiceError, TemplateSelector};
use huella_usb::UsbResetProvider;

use crate::error::ApiError;
use crate::types::{
    AckResponse, CaptureRequest, CaptureResponse, CompareRequest, CompareResponse,
    ForceResetResponse, LedRequest, StatusResponse, TemplatesResponse,
};

/// Default vendor security level when a comparison does not name one.
const DEFAULT_SECURITY_LEVEL: u8 = 5;

/// The service endpoints, transport-agnostic.
///
/// Each method is one endpoint body: it takes the deserialized request,
/// drives the [`DeviceController`], and returns either the response body
/// or an [`ApiError`] carrying the HTTP status and diagnostics. Mounting
/// these on an HTTP router is the binary's job; everything here is
/// testable without a socket.
pub struct Api<F: ScannerFactory, U: UsbResetProvider> {
    controller: Arc<DeviceController<F, U>>,
    image_dir: Option<PathBuf>,
}

impl<F: ScannerFactory, U: UsbResetProvider> Api<F, U> {
    /// Wrap a controller with no image directory configured.
    pub fn new(controller: Arc<DeviceController<F, U>>) -> Self {
        Self {
            controller,
            image_dir: None,
        }
    }

    /// Configure the directory captured frames may be saved to.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    /// The controller behind these endpoints.
    pub fn controller(&self) -> &Arc<DeviceController<F, U>> {
        &self.controller
    }

    fn fail(&self, error: ServiceError) -> ApiError {
        ApiError::from_service(error, self.controller.try_snapshot())
    }

    /// `POST /initialize`
    pub async fn initialize(&self) -> Result<AckResponse, ApiError> {
        let newly = self
            .controller
            .initialize()
            .await
            .map_err(|error| self.fail(error))?;
        let mensaje = if newly {
            "Dispositivo inicializado correctamente"
        } else {
            "El dispositivo ya estaba inicializado"
        };
        Ok(AckResponse {
            mensaje: mensaje.to_string(),
        })
    }

    /// `POST /led`
    pub async fn set_led(&self, request: LedRequest) -> Result<AckResponse, ApiError> {
        self.controller
            .set_led(request.state)
            .await
            .map_err(|error| self.fail(error))?;
        let mensaje = if request.state {
            "LED encendido"
        } else {
            "LED apagado"
        };
        Ok(AckResponse {
            mensaje: mensaje.to_string(),
        })
    }

    /// `POST /capturar-huella`
    pub async fn capture(&self, request: CaptureRequest) -> Result<CaptureResponse, ApiError> {
        let options = CaptureOptions {
            create_template: request.create_template || request.template_id.is_some(),
            template_id: request.template_id,
        };
        let outcome = self
            .controller
            .capture(&options)
            .await
            .map_err(|error| self.fail(error))?;

        let saved_to = if request.save_image {
            self.save_frame(&outcome.image).await
        } else {
            None
        };

        Ok(CaptureResponse::from_outcome(outcome, saved_to))
    }

    /// `POST /comparar-huellas`
    pub async fn compare(&self, request: CompareRequest) -> Result<CompareResponse, ApiError> {
        let first = operand(request.template1_id, request.template1_data, "template1")?;
        let second = operand(request.template2_id, request.template2_data, "template2")?;

        let ordinal = request.security_level.unwrap_or(DEFAULT_SECURITY_LEVEL);
        let level = SecurityLevel::from_ordinal(ordinal)
            .ok_or_else(|| ApiError::bad_request("security_level must be between 1 and 9"))?;

        let outcome = self
            .controller
            .compare(&first, &second, level)
            .await
            .map_err(|error| self.fail(error))?;
        Ok(CompareResponse::from_outcome(outcome, ordinal))
    }

    /// `GET /templates`
    pub fn list_templates(&self) -> TemplatesResponse {
        let templates = self.controller.templates().ids();
        let count = templates.len();
        TemplatesResponse { templates, count }
    }

    /// `DELETE /templates/{id}`
    pub fn delete_template(&self, id: &str) -> Result<AckResponse, ApiError> {
        if self.controller.templates().remove(id) {
            info!(template_id = %id, "template deleted");
            Ok(AckResponse {
                mensaje: format!("Template '{id}' eliminado"),
            })
        } else {
            Err(ApiError::not_found(format!("template not found: {id}")))
        }
    }

    /// `POST /reset-device`
    pub async fn reset_device(&self) -> Result<AckResponse, ApiError> {
        self.controller
            .reset_device()
            .await
            .map_err(|error| self.fail(error))?;
        Ok(AckResponse {
            mensaje: "Dispositivo reiniciado correctamente".to_string(),
        })
    }

    /// `POST /force-usb-reset`
    pub async fn force_usb_reset(&self) -> Result<ForceResetResponse, ApiError> {
        let device_ready = self
            .controller
            .force_usb_reset()
            .await
            .map_err(|error| self.fail(error))?;
        let mensaje = if device_ready {
            "Reset USB completado, dispositivo listo"
        } else {
            "Reset USB completado, el dispositivo no respondió"
        };
        Ok(ForceResetResponse {
            mensaje: mensaje.to_string(),
            device_ready,
        })
    }

    /// `GET /device-status`
    pub async fn device_status(&self) -> Result<StatusResponse, ApiError> {
        let status = self
            .controller
            .device_status()
            .await
            .map_err(|error| self.fail(error))?;
        Ok(StatusResponse::from(status))
    }

    /// Write a captured frame to the image directory. Failures are logged
    /// and swallowed; saving is a convenience, never part of the capture
    /// contract.
    async fn save_frame(&self, image: &[u8]) -> Option<String> {
        let dir = self.image_dir.as_ref()?;
        let path = dir.join(format!("huella_{}.raw", Utc::now().format("%Y%m%d_%H%M%S%3f")));
        match tokio::fs::write(&path, image).await {
            Ok(()) => {
                info!(path = %path.display(), bytes = image.len(), "frame saved");
                Some(path.display().to_string())
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "could not save frame");
                None
            }
        }
    }
}

fn operand(
    id: Option<String>,
    data: Option<Vec<u8>>,
    which: &str,
) -> Result<TemplateSelector, ApiError> {
    match (id, data) {
        (Some(id), None) => Ok(TemplateSelector::Stored(id)),
        (None, Some(data)) => Ok(TemplateSelector::Raw(data)),
        (Some(_), Some(_)) => Err(ApiError::bad_request(format!(
            "{which}: give either an id or raw data, not both"
        ))),
        (None, None) => Err(ApiError::bad_request(format!(
            "{which}: an id or raw data is required"
        ))),
    }
}
