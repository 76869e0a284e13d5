//! Tiered automatic recovery.
//!
//! Every entry goes through [`auto_recover`]; there is no way to invoke a
//! tier directly. The escalation ladder is driven by the session's
//! consecutive-attempt counter:
//!
//! | attempt | tier     | action                                              |
//! |---------|----------|-----------------------------------------------------|
//! | 1       | basic    | close, settle 2s, reinitialize                      |
//! | 2       | extended | close, discard handle, settle 5s, rebuild + reinit  |
//! | 3       | deep     | discard handle, settle 8s, up to 3 spaced reinits   |
//! | beyond  | hardware | USB deauthorize/reauthorize, then reinitialize      |
//!
//! Two guard rails sit in front of the ladder: a spacing window that
//! refuses back-to-back attempts (a wedged device answering every call
//! with the access error would otherwise spin the ladder dry in
//! milliseconds), and the attempt cap that hands over to the hardware
//! tier. The counter restarts from zero after the hardware tier whatever
//! its outcome, so software recovery gets a fresh ladder against the
//! re-enumerated device.

use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use huella_device::{DeviceError, ScannerFactory};
use huella_usb::UsbResetProvider;

use crate::config::SessionConfig;
use crate::error::{Result, ServiceError};
use crate::session::{self, DeviceSession};

/// The recovery tier that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryLevel {
    Basic,
    Extended,
    Deep,
    Hardware,
}

impl std::fmt::Display for RecoveryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Extended => "extended",
            Self::Deep => "deep",
            Self::Hardware => "hardware",
        };
        f.write_str(name)
    }
}

/// Run one recovery attempt at the tier the escalation counter selects.
///
/// Returns the tier that brought the device back, or an error when the
/// attempt was rate-limited or the tier itself failed. A failed tier
/// leaves the counter advanced, so the next invocation escalates.
///
/// # Errors
///
/// [`ServiceError::RecoveryRateLimited`] inside the spacing window;
/// otherwise whatever the failing tier surfaced.
pub(crate) async fn auto_recover<F, U>(
    factory: &F,
    usb: &U,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<RecoveryLevel>
where
    F: ScannerFactory,
    U: UsbResetProvider,
{
    let now = Instant::now();
    if let Some(last) = session.last_error_time
        && now.duration_since(last) < config.recovery_spacing
    {
        debug!("recovery requested inside the spacing window, suppressed");
        return Err(ServiceError::RecoveryRateLimited);
    }

    if session.recovery_attempts >= config.max_recovery_attempts {
        return hardware_reset(factory, usb, config, session).await;
    }

    session.recovery_attempts += 1;
    session.last_error_time = Some(now);

    let level = match session.recovery_attempts {
        1 => RecoveryLevel::Basic,
        2 => RecoveryLevel::Extended,
        _ => RecoveryLevel::Deep,
    };
    info!(%level, attempt = session.recovery_attempts, "automatic recovery");

    let outcome = match level {
        RecoveryLevel::Basic => basic(factory, config, session).await,
        RecoveryLevel::Extended => extended(factory, config, session).await,
        _ => deep(factory, config, session).await,
    };

    match outcome {
        Ok(()) => {
            session.recovery_attempts = 0;
            info!(%level, "recovery succeeded");
            Ok(level)
        }
        Err(error) => {
            // Spacing counts from the end of a failed attempt; a tier's own
            // settle pauses must not eat the anti-thrash window.
            session.last_error_time = Some(Instant::now());
            warn!(%level, %error, "recovery tier failed");
            Err(error)
        }
    }
}

/// Basic tier: release and reopen the device on the existing handle.
async fn basic<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<()> {
    session.close_current().await;
    session.initialized = false;
    sleep(config.basic_recovery_pause).await;
    session::initialize(factory, config, session, None).await
}

/// Extended tier: discard the handle entirely and rebuild it from the
/// factory after a longer settle pause.
async fn extended<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<()> {
    session.close_current().await;
    session.scanner = None;
    session.initialized = false;
    sleep(config.extended_recovery_pause).await;
    session::initialize(factory, config, session, None).await
}

/// Deep tier: discard the handle, clear the error state, take the longest
/// settle pause, then make several spaced reinitialization tries.
async fn deep<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<()> {
    session.close_current().await;
    session.scanner = None;
    session.initialized = false;
    session.last_error = None;
    sleep(config.deep_recovery_pause).await;

    let mut last_error: Option<ServiceError> = None;
    for attempt in 1..=config.deep_recovery_inner_tries {
        sleep(config.deep_recovery_inner_spacing).await;
        debug!(
            attempt,
            tries = config.deep_recovery_inner_tries,
            "deep recovery reinitialization try"
        );
        match session::initialize(factory, config, session, None).await {
            Ok(()) => return Ok(()),
            Err(error) => {
                debug!(attempt, %error, "deep recovery try failed");
                // A half-built handle from a failed try must not leak into
                // the next one.
                session.scanner = None;
                last_error = Some(error);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DeviceError::NoDeviceOpened.into()))
}

/// Hardware tier: force the kernel to drop and re-enumerate the physical
/// device, then reinitialize from a fresh handle.
async fn hardware_reset<F, U>(
    factory: &F,
    usb: &U,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<RecoveryLevel>
where
    F: ScannerFactory,
    U: UsbResetProvider,
{
    warn!(
        attempts = session.recovery_attempts,
        "software recovery exhausted, escalating to hardware USB reset"
    );
    session.last_error_time = Some(Instant::now());
    // The ladder restarts from zero after the hardware tier, whatever
    // happens next.
    session.recovery_attempts = 0;

    match usb
        .reset_device(config.usb_vendor_id, config.usb_product_id)
        .await
    {
        Ok(()) => {
            session.scanner = None;
            session.initialized = false;
            session::initialize(factory, config, session, None).await?;
            info!("hardware USB reset recovered the device");
            Ok(RecoveryLevel::Hardware)
        }
        Err(error) => {
            warn!(%error, "hardware USB reset failed");
            session.record_error(error.to_string());
            Err(error.into())
        }
    }
}
