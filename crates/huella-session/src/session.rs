//! Device session state and the initialization sequence.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use huella_device::{DeviceError, FingerprintScanner, ScannerFactory};

use crate::config::SessionConfig;
use crate::error::Result;

/// Mutable state of one device connection.
///
/// Owned by the controller behind the operation gate; every field mutation
/// happens with the gate held, which is what makes the counters and
/// timestamps trustworthy.
#[derive(Debug)]
pub struct DeviceSession<S: FingerprintScanner> {
    /// The vendor handle. `None` after a recovery tier discards it and
    /// before the next reinitialization recreates it.
    pub(crate) scanner: Option<S>,

    /// Whether the create/init/open sequence has completed.
    pub(crate) initialized: bool,

    /// Device id the reader last answered on.
    pub(crate) current_device_id: Option<i32>,

    /// Human-readable description of the last failure.
    pub(crate) last_error: Option<String>,

    /// Successful operations since the last preventive refresh.
    pub(crate) operation_count: u32,

    /// When the last operation succeeded; drives the idle health probe.
    pub(crate) last_successful_operation: Instant,

    /// Consecutive recovery attempts; selects the escalation tier.
    pub(crate) recovery_attempts: u32,

    /// When recovery last ran; drives the rate-limit spacing.
    pub(crate) last_error_time: Option<Instant>,
}

/// Point-in-time copy of the session counters, safe to serialize into
/// status payloads and error diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub initialized: bool,
    pub current_device_id: Option<i32>,
    pub operation_count: u32,
    pub recovery_attempts: u32,
    pub last_error: Option<String>,
}

impl<S: FingerprintScanner> DeviceSession<S> {
    pub(crate) fn new() -> Self {
        Self {
            scanner: None,
            initialized: false,
            current_device_id: None,
            last_error: None,
            operation_count: 0,
            last_successful_operation: Instant::now(),
            recovery_attempts: 0,
            last_error_time: None,
        }
    }

    /// Record a successful device operation: bump the refresh counter,
    /// stamp the idle clock, and clear the recovery escalation.
    pub(crate) fn record_success(&mut self) {
        self.operation_count += 1;
        self.last_successful_operation = Instant::now();
        self.recovery_attempts = 0;
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// The live scanner handle, or an error while a recovery tier has it
    /// discarded.
    pub(crate) fn scanner_mut(&mut self) -> Result<&mut S> {
        self.scanner
            .as_mut()
            .ok_or_else(|| DeviceError::no_handle("handle discarded during recovery").into())
    }

    /// Close the current device if a handle exists. Close failures are
    /// logged and swallowed; the handle is about to be rebuilt anyway.
    pub(crate) async fn close_current(&mut self) {
        if let Some(scanner) = self.scanner.as_mut()
            && let Err(error) = scanner.close_device().await
        {
            debug!(%error, "close_device failed during teardown");
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            initialized: self.initialized,
            current_device_id: self.current_device_id,
            operation_count: self.operation_count,
            recovery_attempts: self.recovery_attempts,
            last_error: self.last_error.clone(),
        }
    }
}

/// Run the full initialization sequence: create the SDK instance,
/// initialize it in the configured mode, then probe the candidate device
/// ids in order until one opens.
///
/// `preferred` is tried first when given; preventive refreshes pass the id
/// the reader last answered on so a refresh does not silently migrate to a
/// different device.
///
/// On success the session is marked initialized and its error state
/// cleared; on failure it is marked uninitialized and the error recorded.
pub(crate) async fn initialize<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
    preferred: Option<i32>,
) -> Result<()> {
    match open_sequence(factory, config, session, preferred).await {
        Ok(device_id) => {
            session.initialized = true;
            session.current_device_id = Some(device_id);
            session.last_error = None;
            session.last_successful_operation = Instant::now();
            info!(device_id, "device initialized");
            Ok(())
        }
        Err(error) => {
            session.initialized = false;
            session.record_error(error.to_string());
            Err(error)
        }
    }
}

async fn open_sequence<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
    preferred: Option<i32>,
) -> Result<i32> {
    let scanner = session
        .scanner
        .get_or_insert_with(|| factory.create_scanner());

    scanner.create().await?;
    scanner.init(config.init_mode).await?;

    let mut candidates: Vec<i32> = Vec::with_capacity(config.candidate_device_ids.len() + 1);
    if let Some(id) = preferred {
        candidates.push(id);
    }
    for &id in &config.candidate_device_ids {
        if !candidates.contains(&id) {
            candidates.push(id);
        }
    }

    for id in candidates {
        match scanner.open_device(id).await {
            Ok(()) => return Ok(id),
            Err(error) => debug!(device_id = id, %error, "candidate device id did not open"),
        }
    }

    Err(DeviceError::NoDeviceOpened.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use huella_device::mock::MockScannerFactory;

    #[tokio::test]
    async fn test_initialize_probes_candidates_in_order() {
        let (factory, script) = MockScannerFactory::new();
        script.set_open_ids(vec![1]);
        let config = SessionConfig::default();
        let mut session = DeviceSession::new();

        initialize(&factory, &config, &mut session, None)
            .await
            .unwrap();

        assert!(session.initialized);
        assert_eq!(session.current_device_id, Some(1));
        assert_eq!(
            script.calls(),
            vec!["create", "init(1)", "open_device(0)", "open_device(1)"]
        );
    }

    #[tokio::test]
    async fn test_initialize_prefers_known_device_id() {
        let (factory, script) = MockScannerFactory::new();
        script.set_open_ids(vec![0, 1]);
        let config = SessionConfig::default();
        let mut session = DeviceSession::new();

        initialize(&factory, &config, &mut session, Some(1))
            .await
            .unwrap();

        assert_eq!(session.current_device_id, Some(1));
        assert_eq!(script.count_calls("open_device(0)"), 0);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_no_candidate_opens() {
        let (factory, script) = MockScannerFactory::new();
        script.set_open_ids(vec![]);
        let config = SessionConfig::default();
        let mut session = DeviceSession::new();

        let error = initialize(&factory, &config, &mut session, None)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ServiceError::Device(DeviceError::NoDeviceOpened)
        ));
        assert!(!session.initialized);
        assert!(session.last_error.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_serializes_counters() {
        let (factory, _script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = DeviceSession::new();
        initialize(&factory, &config, &mut session, None)
            .await
            .unwrap();

        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["initialized"], true);
        assert_eq!(json["current_device_id"], 0);
        assert_eq!(json["recovery_attempts"], 0);
    }

    #[tokio::test]
    async fn test_record_success_resets_escalation() {
        let (factory, _script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = DeviceSession::new();
        initialize(&factory, &config, &mut session, None)
            .await
            .unwrap();

        session.recovery_attempts = 2;
        session.record_success();

        assert_eq!(session.recovery_attempts, 0);
        assert_eq!(session.operation_count, 1);
    }
}
