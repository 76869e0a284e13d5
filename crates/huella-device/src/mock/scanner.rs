//! Scripted mock fingerprint scanner.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use huella_core::{SecurityLevel, Template};

use crate::error::{DeviceError, Result, VendorStatus};
use crate::traits::{FingerprintScanner, ScannerFactory};
use crate::types::SensorInfo;

/// Default sensor geometry reported by the mock (matches the real reader).
const DEFAULT_SENSOR: SensorInfo = SensorInfo {
    width: 258,
    height: 336,
};

/// Default similarity score reported for matching templates.
const DEFAULT_MATCH_SCORE: u32 = 173;

#[derive(Debug)]
struct ScriptState {
    /// Device ids that `open_device` accepts.
    open_ok_ids: Vec<i32>,

    /// Remaining `create` calls that fail before succeeding.
    fail_create_remaining: u32,

    /// Remaining `init` calls that fail before succeeding.
    fail_init_remaining: u32,

    /// Sensor geometry reported by `get_device_info`.
    sensor: SensorInfo,

    /// Queued `get_device_info` failures, consumed first.
    device_info_failures: VecDeque<VendorStatus>,

    /// Queued `set_led` failures, consumed first.
    led_failures: VecDeque<VendorStatus>,

    /// Queued `get_image` failures, consumed first.
    get_image_failures: VecDeque<VendorStatus>,

    /// Byte the mock fills captured images with.
    image_fill: u8,

    /// Queued `create_template` failures, consumed first.
    create_template_failures: VecDeque<VendorStatus>,

    /// Byte the mock fills created templates with.
    template_fill: u8,

    /// Queued `match_template` failures, consumed first.
    match_failures: VecDeque<VendorStatus>,

    /// Overrides the byte-equality match result when set.
    forced_match: Option<bool>,

    /// Score reported by `get_matching_score`.
    match_score: u32,

    /// Artificial latency inside every device call.
    op_delay: Duration,

    /// Every call made against any scanner sharing this script, in order.
    calls: Vec<String>,

    /// Device calls currently in flight.
    in_flight: u32,

    /// High-water mark of concurrent device calls.
    max_in_flight: u32,

    /// Scanner handles created by the factory.
    scanners_created: u32,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            open_ok_ids: vec![0],
            fail_create_remaining: 0,
            fail_init_remaining: 0,
            sensor: DEFAULT_SENSOR,
            device_info_failures: VecDeque::new(),
            led_failures: VecDeque::new(),
            get_image_failures: VecDeque::new(),
            image_fill: 0x7F,
            create_template_failures: VecDeque::new(),
            template_fill: 0x5A,
            match_failures: VecDeque::new(),
            forced_match: None,
            match_score: DEFAULT_MATCH_SCORE,
            op_delay: Duration::ZERO,
            calls: Vec::new(),
            in_flight: 0,
            max_in_flight: 0,
            scanners_created: 0,
        }
    }
}

/// Handle for scripting a [`MockScanner`] and inspecting its call history.
///
/// The script is shared by every scanner a [`MockScannerFactory`] produces,
/// so recovery tiers that discard and recreate the handle keep running
/// against the same scripted behavior and the same call log.
///
/// # Examples
///
/// ```
/// use huella_device::mock::MockScanner;
/// use huella_device::traits::FingerprintScanner;
/// use huella_device::error::VendorStatus;
///
/// #[tokio::main]
/// async fn main() {
///     let (mut scanner, script) = MockScanner::new();
///     script.queue_get_image_failures(VendorStatus::AccessDenied, 1);
///
///     scanner.create().await.unwrap();
///     scanner.init(1).await.unwrap();
///     scanner.open_device(0).await.unwrap();
///
///     let mut buffer = vec![0u8; 16];
///     assert!(scanner.get_image(&mut buffer).await.is_err());
///     assert!(scanner.get_image(&mut buffer).await.is_ok());
///
///     assert_eq!(script.count_calls("get_image"), 2);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    state: Arc<Mutex<ScriptState>>,
}

impl MockScript {
    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        // A panicked test thread must not wedge every other test using the
        // same script.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set which device ids `open_device` accepts.
    pub fn set_open_ids(&self, ids: Vec<i32>) {
        self.lock().open_ok_ids = ids;
    }

    /// Make the next `count` calls to `create` fail.
    pub fn fail_creates(&self, count: u32) {
        self.lock().fail_create_remaining = count;
    }

    /// Make the next `count` calls to `init` fail.
    pub fn fail_inits(&self, count: u32) {
        self.lock().fail_init_remaining = count;
    }

    /// Set the sensor geometry reported by `get_device_info`.
    pub fn set_sensor(&self, width: i64, height: i64) {
        self.lock().sensor = SensorInfo::new(width, height);
    }

    /// Queue `count` failures with the given status for `get_device_info`.
    pub fn queue_device_info_failures(&self, status: VendorStatus, count: u32) {
        let mut state = self.lock();
        for _ in 0..count {
            state.device_info_failures.push_back(status);
        }
    }

    /// Queue `count` failures with the given status for `set_led`.
    pub fn queue_led_failures(&self, status: VendorStatus, count: u32) {
        let mut state = self.lock();
        for _ in 0..count {
            state.led_failures.push_back(status);
        }
    }

    /// Queue `count` failures with the given status for `get_image`.
    pub fn queue_get_image_failures(&self, status: VendorStatus, count: u32) {
        let mut state = self.lock();
        for _ in 0..count {
            state.get_image_failures.push_back(status);
        }
    }

    /// Queue `count` failures with the given status for `create_template`.
    pub fn queue_create_template_failures(&self, status: VendorStatus, count: u32) {
        let mut state = self.lock();
        for _ in 0..count {
            state.create_template_failures.push_back(status);
        }
    }

    /// Queue `count` failures with the given status for `match_template`.
    pub fn queue_match_failures(&self, status: VendorStatus, count: u32) {
        let mut state = self.lock();
        for _ in 0..count {
            state.match_failures.push_back(status);
        }
    }

    /// Override the byte-equality match result, or clear the override.
    pub fn force_match(&self, matched: Option<bool>) {
        self.lock().forced_match = matched;
    }

    /// Set the score `get_matching_score` reports.
    pub fn set_match_score(&self, score: u32) {
        self.lock().match_score = score;
    }

    /// Set the byte created templates are filled with.
    pub fn set_template_fill(&self, fill: u8) {
        self.lock().template_fill = fill;
    }

    /// Add artificial latency to every device call.
    ///
    /// Used with the in-flight counter to detect overlapping calls under
    /// concurrent load.
    pub fn set_op_delay(&self, delay: Duration) {
        self.lock().op_delay = delay;
    }

    /// Every device call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of logged calls starting with `prefix`.
    ///
    /// Call entries include arguments, e.g. `set_led(false)` or
    /// `open_device(1)`, so a prefix of `"set_led"` counts both LED states
    /// while `"set_led(false)"` counts only switch-offs.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// High-water mark of concurrent device calls.
    pub fn max_in_flight(&self) -> u32 {
        self.lock().max_in_flight
    }

    /// Number of scanner handles the factory has produced.
    pub fn scanners_created(&self) -> u32 {
        self.lock().scanners_created
    }
}

/// Mock fingerprint scanner driven by a shared [`MockScript`].
#[derive(Debug)]
pub struct MockScanner {
    script: MockScript,
    created: bool,
    opened_id: Option<i32>,
}

impl MockScanner {
    /// Create a standalone mock scanner and its script handle.
    pub fn new() -> (Self, MockScript) {
        let script = MockScript::default();
        let scanner = Self::with_script(script.clone());
        (scanner, script)
    }

    fn with_script(script: MockScript) -> Self {
        Self {
            script,
            created: false,
            opened_id: None,
        }
    }

    /// The device id this handle currently has open, if any.
    pub fn opened_id(&self) -> Option<i32> {
        self.opened_id
    }

    /// Run one scripted device call: mark it in flight, apply the scripted
    /// latency, resolve the outcome, and log it.
    async fn run_call<T>(
        &self,
        call: String,
        outcome: impl FnOnce(&mut ScriptState) -> Result<T>,
    ) -> Result<T> {
        let delay = {
            let mut state = self.script.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.op_delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.script.lock();
        let result = outcome(&mut state);
        state.calls.push(call);
        state.in_flight -= 1;
        result
    }
}

impl FingerprintScanner for MockScanner {
    async fn create(&mut self) -> Result<()> {
        let result = self
            .run_call("create".to_string(), |state| {
                if state.fail_create_remaining > 0 {
                    state.fail_create_remaining -= 1;
                    return Err(DeviceError::vendor("create", VendorStatus::CreationFailed));
                }
                Ok(())
            })
            .await;
        if result.is_ok() {
            self.created = true;
        }
        result
    }

    async fn init(&mut self, mode: u32) -> Result<()> {
        self.run_call(format!("init({mode})"), |state| {
            if state.fail_init_remaining > 0 {
                state.fail_init_remaining -= 1;
                return Err(DeviceError::vendor("init", VendorStatus::AccessDenied));
            }
            Ok(())
        })
        .await
    }

    async fn open_device(&mut self, device_id: i32) -> Result<()> {
        let result = self
            .run_call(format!("open_device({device_id})"), |state| {
                if state.open_ok_ids.contains(&device_id) {
                    Ok(())
                } else {
                    Err(DeviceError::vendor("open_device", VendorStatus::OpenFailed))
                }
            })
            .await;
        if result.is_ok() {
            self.opened_id = Some(device_id);
        }
        result
    }

    async fn close_device(&mut self) -> Result<()> {
        self.opened_id = None;
        self.run_call("close_device".to_string(), |_| Ok(())).await
    }

    async fn get_device_info(&mut self) -> Result<SensorInfo> {
        self.run_call("get_device_info".to_string(), |state| {
            if let Some(status) = state.device_info_failures.pop_front() {
                return Err(DeviceError::vendor("get_device_info", status));
            }
            Ok(state.sensor)
        })
        .await
    }

    async fn set_led(&mut self, on: bool) -> Result<()> {
        self.run_call(format!("set_led({on})"), |state| {
            if let Some(status) = state.led_failures.pop_front() {
                return Err(DeviceError::vendor("set_led", status));
            }
            Ok(())
        })
        .await
    }

    async fn get_image(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.run_call("get_image".to_string(), |state| {
            if let Some(status) = state.get_image_failures.pop_front() {
                return Err(DeviceError::vendor("get_image", status));
            }
            buffer.fill(state.image_fill);
            Ok(())
        })
        .await
    }

    async fn create_template(&mut self, _image: &[u8]) -> Result<Template> {
        self.run_call("create_template".to_string(), |state| {
            if let Some(status) = state.create_template_failures.pop_front() {
                return Err(DeviceError::vendor("create_template", status));
            }
            let bytes = vec![state.template_fill; Template::size()];
            Template::from_bytes(&bytes)
                .map_err(|_| DeviceError::vendor("create_template", VendorStatus::InvalidTemplate))
        })
        .await
    }

    async fn match_template(
        &mut self,
        first: &Template,
        second: &Template,
        level: SecurityLevel,
    ) -> Result<bool> {
        // Byte-by-byte comparison stands in for the vendor's matching
        // algorithm, which is opaque.
        let equal = first == second;
        self.run_call(format!("match_template({level})"), move |state| {
            if let Some(status) = state.match_failures.pop_front() {
                return Err(DeviceError::vendor("match_template", status));
            }
            Ok(state.forced_match.unwrap_or(equal))
        })
        .await
    }

    async fn get_matching_score(&mut self, _first: &Template, _second: &Template) -> Result<u32> {
        self.run_call("get_matching_score".to_string(), |state| {
            Ok(state.match_score)
        })
        .await
    }
}

/// Factory producing [`MockScanner`] handles that share one script.
#[derive(Debug, Clone, Default)]
pub struct MockScannerFactory {
    script: MockScript,
}

impl MockScannerFactory {
    /// Create a factory and the script handle controlling every scanner it
    /// will produce.
    pub fn new() -> (Self, MockScript) {
        let script = MockScript::default();
        (
            Self {
                script: script.clone(),
            },
            script,
        )
    }
}

impl ScannerFactory for MockScannerFactory {
    type Scanner = MockScanner;

    fn create_scanner(&self) -> MockScanner {
        self.script.lock().scanners_created += 1;
        MockScanner::with_script(self.script.clone())
    }
}
