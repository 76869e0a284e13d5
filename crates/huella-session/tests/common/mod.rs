//! Shared test rig for session integration tests.

use std::sync::Once;

use huella_device::mock::{MockScannerFactory, MockScript};
use huella_session::{DeviceController, SessionConfig};
use huella_usb::MockUsbReset;

pub type MockController = DeviceController<MockScannerFactory, MockUsbReset>;

static TRACING: Once = Once::new();

/// Route tracing output through the test harness, once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Build a controller over scripted mocks with the production config.
pub fn controller() -> (MockController, MockScript, MockUsbReset) {
    init_tracing();
    let (factory, script) = MockScannerFactory::new();
    let usb = MockUsbReset::new();
    let controller = DeviceController::new(factory, usb.clone(), SessionConfig::default());
    (controller, script, usb)
}
