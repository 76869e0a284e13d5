//! The device controller: operation gate, lifecycle, and public operations.

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use huella_core::{SecurityLevel, Template};
use huella_device::{FingerprintScanner, ScannerFactory};
use huella_usb::UsbResetProvider;

use crate::capture::{self, CaptureOptions, CaptureOutcome};
use crate::config::SessionConfig;
use crate::error::{Result, ServiceError};
use crate::maintenance;
use crate::recovery;
use crate::session::{self, DeviceSession, SessionSnapshot};
use crate::store::TemplateStore;

/// Which template a comparison operand refers to.
#[derive(Debug, Clone)]
pub enum TemplateSelector {
    /// A template previously stored under this id.
    Stored(String),

    /// Raw template bytes supplied by the caller.
    Raw(Vec<u8>),
}

/// Result of a template comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    /// Whether the vendor considers the two templates the same finger.
    pub matched: bool,

    /// Vendor similarity score; 0 for non-matches.
    pub score: u32,
}

/// Point-in-time device health report.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub initialized: bool,
    pub current_device_id: Option<i32>,
    /// Whether the device answered a live geometry probe.
    pub responsive: bool,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub operation_count: u32,
    pub recovery_attempts: u32,
    pub last_error: Option<String>,
}

/// Serializes access to one fingerprint reader and runs its lifecycle.
///
/// The controller owns the [`DeviceSession`] behind a single async mutex,
/// the operation gate. Every device-touching operation acquires the gate
/// with a bounded wait and rejects as [`ServiceError::DeviceBusy`] when the
/// wait expires, so a slow capture (or a multi-second recovery) makes
/// concurrent callers fail fast instead of piling up.
///
/// The template store sits outside the gate: listing and deleting
/// templates never waits on the device.
///
/// # Examples
///
/// ```
/// use huella_device::mock::MockScannerFactory;
/// use huella_session::{DeviceController, SessionConfig};
/// use huella_usb::MockUsbReset;
///
/// #[tokio::main]
/// async fn main() {
///     let (factory, _script) = MockScannerFactory::new();
///     let controller = DeviceController::new(
///         factory,
///         MockUsbReset::new(),
///         SessionConfig::default(),
///     );
///
///     assert!(controller.initialize().await.unwrap());
///     // A second initialize is a no-op.
///     assert!(!controller.initialize().await.unwrap());
/// }
/// ```
pub struct DeviceController<F: ScannerFactory, U: UsbResetProvider> {
    factory: F,
    usb: U,
    config: SessionConfig,
    session: Mutex<DeviceSession<F::Scanner>>,
    templates: TemplateStore,
}

impl<F: ScannerFactory, U: UsbResetProvider> DeviceController<F, U> {
    /// Create a controller over an uninitialized device.
    pub fn new(factory: F, usb: U, config: SessionConfig) -> Self {
        Self {
            factory,
            usb,
            config,
            session: Mutex::new(DeviceSession::new()),
            templates: TemplateStore::new(),
        }
    }

    /// The configuration this controller runs with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The template store, shared outside the operation gate.
    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Acquire the operation gate within the bounded wait.
    async fn gate(&self) -> Result<MutexGuard<'_, DeviceSession<F::Scanner>>> {
        timeout(self.config.gate_acquire_timeout, self.session.lock())
            .await
            .map_err(|_| ServiceError::DeviceBusy)
    }

    /// Acquire the gate and run preventive maintenance before handing the
    /// session to the operation body.
    async fn gate_with_maintenance(&self) -> Result<MutexGuard<'_, DeviceSession<F::Scanner>>> {
        let mut session = self.gate().await?;
        maintenance::maybe_run(&self.factory, &self.config, &mut session).await;
        Ok(session)
    }

    /// Bring the device up if it is not already.
    ///
    /// Returns `true` when the device was initialized by this call and
    /// `false` when it already was; repeated calls are harmless.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is busy or no candidate device id
    /// opens.
    pub async fn initialize(&self) -> Result<bool> {
        let mut session = self.gate().await?;
        if session.initialized {
            return Ok(false);
        }
        session::initialize(&self.factory, &self.config, &mut session, None).await?;
        Ok(true)
    }

    /// Switch the finger-detect LED.
    ///
    /// Initializes the device first when needed. A device access error
    /// triggers one recovery pass followed by a single retry.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is busy, the device cannot be
    /// brought up, or the LED call fails past recovery.
    pub async fn set_led(&self, on: bool) -> Result<()> {
        let mut session = self.gate_with_maintenance().await?;
        self.ensure_initialized(&mut session).await?;

        match session.scanner_mut()?.set_led(on).await {
            Ok(()) => {
                session.record_success();
                Ok(())
            }
            Err(error) if error.is_access_error() => {
                warn!(%error, "LED control hit a device access error, attempting recovery");
                recovery::auto_recover(&self.factory, &self.usb, &self.config, &mut session)
                    .await?;
                session.scanner_mut()?.set_led(on).await?;
                session.record_success();
                info!("LED control succeeded after recovery");
                Ok(())
            }
            Err(error) => {
                session.record_error(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Capture one fingerprint image, optionally templating and storing it.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is busy, the sensor geometry is
    /// rejected, or no usable frame arrives within the attempt and time
    /// budget. Template creation failures are not errors.
    pub async fn capture(&self, options: &CaptureOptions) -> Result<CaptureOutcome> {
        let mut session = self.gate_with_maintenance().await?;
        capture::run(
            &self.factory,
            &self.usb,
            &self.config,
            &self.templates,
            &mut session,
            options,
        )
        .await
    }

    /// Compare two templates at the given security level.
    ///
    /// Operands resolve before the gate is taken, so a missing stored id
    /// fails fast without touching the device.
    ///
    /// # Errors
    ///
    /// Returns an error when an operand does not resolve, the gate is
    /// busy, or the match call fails.
    pub async fn compare(
        &self,
        first: &TemplateSelector,
        second: &TemplateSelector,
        level: SecurityLevel,
    ) -> Result<MatchOutcome> {
        let first = self.resolve(first)?;
        let second = self.resolve(second)?;

        let mut session = self.gate_with_maintenance().await?;
        self.ensure_initialized(&mut session).await?;

        let scanner = session.scanner_mut()?;
        let matched = scanner.match_template(&first, &second, level).await?;
        let score = if matched {
            // The score call is best-effort; a match without a score is
            // still a match.
            scanner.get_matching_score(&first, &second).await.unwrap_or(0)
        } else {
            0
        };
        session.record_success();

        Ok(MatchOutcome { matched, score })
    }

    /// Full software reset: close, clear all lifecycle state, settle, and
    /// reinitialize.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is busy or reinitialization fails.
    pub async fn reset_device(&self) -> Result<()> {
        let mut session = self.gate().await?;
        info!("full device reset requested");

        session.close_current().await;
        session.scanner = None;
        session.initialized = false;
        session.current_device_id = None;
        session.recovery_attempts = 0;
        session.last_error = None;
        sleep(self.config.reset_pause).await;

        session::initialize(&self.factory, &self.config, &mut session, None).await
    }

    /// Operator-forced hardware USB reset, outside the escalation ladder.
    ///
    /// Returns whether the device came back up after the reset; a reset
    /// that worked but left the device unopenable reports `false` rather
    /// than an error, so the caller learns the bus reset itself succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is busy or the bus reset itself
    /// fails.
    pub async fn force_usb_reset(&self) -> Result<bool> {
        let mut session = self.gate().await?;
        warn!("forced hardware USB reset requested");

        self.usb
            .reset_device(self.config.usb_vendor_id, self.config.usb_product_id)
            .await?;

        session.scanner = None;
        session.initialized = false;
        session.recovery_attempts = 0;

        match session::initialize(&self.factory, &self.config, &mut session, None).await {
            Ok(()) => Ok(true),
            Err(error) => {
                warn!(%error, "device did not come back after forced USB reset");
                Ok(false)
            }
        }
    }

    /// Probe the device and report its health.
    ///
    /// An unresponsive device is reported, not an error: the point of the
    /// status call is to describe a sick device, not to fail on one.
    ///
    /// # Errors
    ///
    /// Returns an error only when the gate is busy.
    pub async fn device_status(&self) -> Result<DeviceStatus> {
        let mut session = self.gate().await?;

        let mut status = DeviceStatus {
            initialized: session.initialized,
            current_device_id: session.current_device_id,
            responsive: false,
            width: None,
            height: None,
            operation_count: session.operation_count,
            recovery_attempts: session.recovery_attempts,
            last_error: session.last_error.clone(),
        };

        if session.initialized
            && let Some(scanner) = session.scanner.as_mut()
        {
            match scanner.get_device_info().await {
                Ok(info) => {
                    status.responsive = true;
                    status.width = Some(info.width);
                    status.height = Some(info.height);
                }
                Err(error) => {
                    status.last_error = Some(error.to_string());
                }
            }
        }

        Ok(status)
    }

    /// Non-blocking snapshot of the session counters for diagnostics.
    ///
    /// Returns `None` while the gate is held, rather than waiting on it;
    /// diagnostics must never queue behind a slow capture.
    pub fn try_snapshot(&self) -> Option<SessionSnapshot> {
        self.session
            .try_lock()
            .ok()
            .map(|session| session.snapshot())
    }

    async fn ensure_initialized(
        &self,
        session: &mut DeviceSession<F::Scanner>,
    ) -> Result<()> {
        if session.initialized {
            return Ok(());
        }
        session::initialize(&self.factory, &self.config, session, None)
            .await
            .map_err(|error| ServiceError::not_initialized(error.to_string()))
    }

    fn resolve(&self, selector: &TemplateSelector) -> Result<Template> {
        match selector {
            TemplateSelector::Stored(id) => {
                self.templates
                    .get(id)
                    .ok_or_else(|| ServiceError::TemplateNotFound { id: id.clone() })
            }
            TemplateSelector::Raw(bytes) => Template::from_bytes(bytes).map_err(Into::into),
        }
    }
}
