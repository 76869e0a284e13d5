//! The capture pipeline: validate, acquire, template, store.

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use huella_core::constants::{MAX_IMAGE_BUFFER_BYTES, MAX_SENSOR_DIMENSION};
use huella_core::Template;
use huella_device::types::SensorInfo;
use huella_device::{FingerprintScanner, ScannerFactory};
use huella_usb::UsbResetProvider;

use crate::config::SessionConfig;
use crate::error::{Result, ServiceError};
use crate::recovery;
use crate::session::DeviceSession;
use crate::store::TemplateStore;

/// Captures within this many operations of the refresh threshold carry a
/// maintenance-due hint in their result.
const MAINTENANCE_WARNING_WINDOW: u32 = 10;

/// What a capture should do beyond acquiring the image.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Build a template from the captured image.
    pub create_template: bool,

    /// Store the template under this id (implies nothing if template
    /// creation is off or fails).
    pub template_id: Option<String>,
}

/// Result of a successful capture.
#[derive(Debug)]
pub struct CaptureOutcome {
    /// Raw grayscale frame, `width * height` bytes.
    pub image: Vec<u8>,

    /// Sensor width in pixels.
    pub width: i64,

    /// Sensor height in pixels.
    pub height: i64,

    /// Template built from the frame, when requested and successful.
    pub template: Option<Template>,

    /// Id the template was stored under, when storage happened.
    pub template_stored: Option<String>,

    /// Acquisition attempts the frame took.
    pub attempts: u32,

    /// Successful operations since the last preventive refresh.
    pub operation_count: u32,

    /// Whether a preventive refresh is coming up soon.
    pub maintenance_due: bool,
}

/// Run one full capture.
///
/// The pipeline: bring the device up if it is not, query and validate the
/// sensor geometry, switch the LED on, run the bounded acquisition loop,
/// switch the LED off, then optionally build and store a template.
///
/// Template creation and storage are non-fatal: a capture that produced a
/// good frame succeeds even if templating fails, with `template` left
/// empty. The LED is switched off on every exit path; a failure there is
/// logged, never surfaced.
pub(crate) async fn run<F, U>(
    factory: &F,
    usb: &U,
    config: &SessionConfig,
    store: &TemplateStore,
    session: &mut DeviceSession<F::Scanner>,
    options: &CaptureOptions,
) -> Result<CaptureOutcome>
where
    F: ScannerFactory,
    U: UsbResetProvider,
{
    if !session.initialized {
        info!("capture requested on uninitialized device, attempting recovery");
        recovery::auto_recover(factory, usb, config, session)
            .await
            .map_err(|error| ServiceError::not_initialized(error.to_string()))?;
    }

    let acquisition = acquire_frame(factory, usb, config, session).await;

    if let Some(scanner) = session.scanner.as_mut()
        && let Err(error) = scanner.set_led(false).await
    {
        warn!(%error, "could not switch LED off after capture");
    }

    let (image, info, attempts) = acquisition.inspect_err(|error| {
        session.record_error(error.to_string());
    })?;

    let mut template = None;
    let mut template_stored = None;
    if options.create_template {
        match session.scanner_mut()?.create_template(&image).await {
            Ok(created) => {
                if let Some(id) = &options.template_id {
                    store.insert(id, created.clone());
                    info!(template_id = %id, "template stored");
                    template_stored = Some(id.clone());
                }
                template = Some(created);
            }
            Err(error) => {
                warn!(%error, "template creation failed, returning capture without one");
            }
        }
    }

    session.record_success();

    Ok(CaptureOutcome {
        image,
        width: info.width,
        height: info.height,
        template,
        template_stored,
        attempts,
        operation_count: session.operation_count,
        maintenance_due: session.operation_count + MAINTENANCE_WARNING_WINDOW
            >= config.max_operations_before_refresh,
    })
}

/// Validate the sensor geometry and run the bounded acquisition loop.
async fn acquire_frame<F, U>(
    factory: &F,
    usb: &U,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<(Vec<u8>, SensorInfo, u32)>
where
    F: ScannerFactory,
    U: UsbResetProvider,
{
    let info = match session.scanner_mut()?.get_device_info().await {
        Ok(info) => info,
        Err(error) => {
            warn!(%error, "sensor geometry query failed, attempting recovery");
            recovery::auto_recover(factory, usb, config, session).await?;
            session.scanner_mut()?.get_device_info().await?
        }
    };

    // A wedged reader answers geometry queries with garbage; allocating
    // from it would mean a runaway buffer.
    if info.width <= 0
        || info.height <= 0
        || info.width > MAX_SENSOR_DIMENSION
        || info.height > MAX_SENSOR_DIMENSION
    {
        return Err(ServiceError::InvalidDimensions {
            width: info.width,
            height: info.height,
        });
    }
    let buffer_size = (info.width as usize) * (info.height as usize);
    if buffer_size > MAX_IMAGE_BUFFER_BYTES {
        return Err(ServiceError::BufferTooLarge {
            size: buffer_size,
            cap: MAX_IMAGE_BUFFER_BYTES,
        });
    }
    let mut image = vec![0u8; buffer_size];

    if let Err(error) = session.scanner_mut()?.set_led(true).await {
        warn!(%error, "could not switch LED on, capturing without it");
    }

    let started = Instant::now();
    let mut attempts = 0;
    let mut last_status = None;

    while attempts < config.capture_max_attempts {
        if started.elapsed() > config.capture_timeout_budget {
            warn!(attempts, "capture time budget exhausted");
            break;
        }
        attempts += 1;
        debug!(
            attempt = attempts,
            max = config.capture_max_attempts,
            "image acquisition attempt"
        );

        match session.scanner_mut()?.get_image(&mut image).await {
            Ok(()) => return Ok((image, info, attempts)),
            Err(error) if error.is_access_error() => {
                last_status = error.vendor_status();
                warn!(%error, "device access error mid-capture, attempting recovery");
                if let Err(recovery_error) =
                    recovery::auto_recover(factory, usb, config, session).await
                {
                    warn!(error = %recovery_error, "recovery failed, aborting capture");
                    break;
                }
                // Recovered: retry immediately, the recovery pauses were
                // spacing enough.
                continue;
            }
            Err(error) => {
                last_status = error.vendor_status();
                debug!(attempt = attempts, %error, "no usable frame");
            }
        }

        if attempts < config.capture_max_attempts {
            sleep(config.capture_attempt_spacing).await;
        }
    }

    Err(ServiceError::CaptureFailed {
        attempts,
        last_vendor_code: last_status.map(|status| status.code()),
    })
}
