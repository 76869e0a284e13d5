//! Preventive maintenance: periodic refresh and idle health probing.
//!
//! Runs at the start of every gated operation, before the operation body.
//! Two independent triggers:
//!
//! - the reader degrades after long uninterrupted use, so the connection is
//!   rebuilt once the successful-operation counter reaches its threshold;
//! - a reader idle past the health threshold may have wedged silently, so
//!   it is probed with a cheap geometry query and refreshed only when the
//!   probe fails.
//!
//! Maintenance is advisory: a failed refresh is logged and swallowed, and
//! the operation that triggered it proceeds to fail (or recover) on its
//! own terms.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use huella_device::{FingerprintScanner, ScannerFactory};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::{self, DeviceSession};

/// Run preventive maintenance if either trigger fires. Returns whether
/// anything was done.
pub(crate) async fn maybe_run<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> bool {
    if session.operation_count >= config.max_operations_before_refresh {
        info!(
            operations = session.operation_count,
            "preventive maintenance: operation threshold reached, refreshing connection"
        );
        if let Err(error) = refresh_connection(factory, config, session).await {
            warn!(%error, "preventive refresh failed; the next operation will surface the fault");
        }
        session.operation_count = 0;
        return true;
    }

    if session.last_successful_operation.elapsed() > config.device_health_threshold {
        debug!("preventive maintenance: idle threshold exceeded, probing device");
        if health_probe(session).await {
            debug!("idle device answered the health probe");
            return false;
        }
        warn!("idle device failed the health probe, refreshing connection");
        if let Err(error) = refresh_connection(factory, config, session).await {
            warn!(%error, "refresh after failed health probe also failed");
        }
        return true;
    }

    false
}

/// Cheap liveness probe against the open device.
async fn health_probe<S: FingerprintScanner>(session: &mut DeviceSession<S>) -> bool {
    if !session.initialized {
        return false;
    }
    match session.scanner.as_mut() {
        Some(scanner) => scanner.get_device_info().await.is_ok(),
        None => false,
    }
}

/// Tear down and rebuild the device connection from a fresh handle,
/// preferring the device id the reader last answered on.
pub(crate) async fn refresh_connection<F: ScannerFactory>(
    factory: &F,
    config: &SessionConfig,
    session: &mut DeviceSession<F::Scanner>,
) -> Result<()> {
    session.close_current().await;
    session.scanner = None;
    session.initialized = false;
    sleep(config.refresh_pause).await;

    let preferred = session.current_device_id;
    session::initialize(factory, config, session, preferred).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use huella_device::VendorStatus;
    use huella_device::mock::MockScannerFactory;
    use std::time::Duration;

    async fn initialized_session(
        factory: &MockScannerFactory,
        config: &SessionConfig,
    ) -> DeviceSession<<MockScannerFactory as ScannerFactory>::Scanner> {
        let mut session = DeviceSession::new();
        session::initialize(factory, config, &mut session, None)
            .await
            .unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_trigger_no_work() {
        let (factory, script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = initialized_session(&factory, &config).await;
        script.clear_calls();

        assert!(!maybe_run(&factory, &config, &mut session).await);
        assert!(script.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_threshold_triggers_refresh_and_resets_counter() {
        let (factory, script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = initialized_session(&factory, &config).await;
        session.operation_count = config.max_operations_before_refresh;
        let created_before = script.scanners_created();

        assert!(maybe_run(&factory, &config, &mut session).await);

        assert_eq!(session.operation_count, 0);
        assert!(session.initialized);
        // The refresh rebuilds the handle from scratch.
        assert_eq!(script.scanners_created(), created_before + 1);

        // Second pass: counter is back under the threshold, nothing runs.
        script.clear_calls();
        assert!(!maybe_run(&factory, &config, &mut session).await);
        assert!(script.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_device_probed_not_refreshed_when_healthy() {
        let (factory, script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = initialized_session(&factory, &config).await;

        tokio::time::advance(config.device_health_threshold + Duration::from_secs(1)).await;
        script.clear_calls();

        assert!(!maybe_run(&factory, &config, &mut session).await);
        assert_eq!(script.calls(), vec!["get_device_info"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_device_failing_probe_gets_refreshed() {
        let (factory, script) = MockScannerFactory::new();
        let config = SessionConfig::default();
        let mut session = initialized_session(&factory, &config).await;

        tokio::time::advance(config.device_health_threshold + Duration::from_secs(1)).await;
        script.queue_device_info_failures(VendorStatus::AccessDenied, 1);
        let created_before = script.scanners_created();

        assert!(maybe_run(&factory, &config, &mut session).await);

        assert!(session.initialized);
        assert_eq!(script.scanners_created(), created_before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_prefers_current_device_id() {
        let (factory, script) = MockScannerFactory::new();
        script.set_open_ids(vec![1]);
        let config = SessionConfig::default();
        let mut session = initialized_session(&factory, &config).await;
        assert_eq!(session.current_device_id, Some(1));
        session.operation_count = config.max_operations_before_refresh;
        script.clear_calls();

        assert!(maybe_run(&factory, &config, &mut session).await);

        // The known-good id is probed first; id 0 is never retried.
        assert_eq!(script.count_calls("open_device(1)"), 1);
        assert_eq!(script.count_calls("open_device(0)"), 0);
    }
}
