//! Tunable parameters for the device lifecycle.

use std::time::Duration;

use huella_core::constants::READER_USB_VENDOR_ID;

/// Configuration for the session layer.
///
/// The defaults reproduce the timing profile the reader family is known to
/// need in the field: recovery pauses long enough for the hardware to settle,
/// a refresh every 50 operations, and a health probe after 5 minutes of
/// idleness. Tests shorten nothing here; they run under a paused tokio clock
/// instead, so the production timings are what gets exercised.
///
/// # Examples
///
/// ```
/// use huella_session::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default();
/// assert_eq!(config.max_recovery_attempts, 3);
/// assert_eq!(config.recovery_spacing, Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device ids probed, in order, when opening the reader.
    pub candidate_device_ids: Vec<i32>,

    /// Vendor SDK init mode for this reader family.
    pub init_mode: u32,

    /// How long a caller waits for the operation gate before the request is
    /// rejected as busy.
    pub gate_acquire_timeout: Duration,

    /// Software recovery attempts before escalating to the hardware tier.
    pub max_recovery_attempts: u32,

    /// Minimum spacing between recovery attempts.
    pub recovery_spacing: Duration,

    /// Settle pause in the basic recovery tier.
    pub basic_recovery_pause: Duration,

    /// Settle pause in the extended recovery tier.
    pub extended_recovery_pause: Duration,

    /// Settle pause in the deep recovery tier.
    pub deep_recovery_pause: Duration,

    /// Reinitialization tries inside the deep tier.
    pub deep_recovery_inner_tries: u32,

    /// Spacing before each deep-tier reinitialization try.
    pub deep_recovery_inner_spacing: Duration,

    /// Successful operations before a preventive connection refresh.
    pub max_operations_before_refresh: u32,

    /// Idle time after which the device is health-probed before use.
    pub device_health_threshold: Duration,

    /// Settle pause inside a preventive connection refresh.
    pub refresh_pause: Duration,

    /// Settle pause inside an explicit full reset.
    pub reset_pause: Duration,

    /// Image acquisition attempts per capture.
    pub capture_max_attempts: u32,

    /// Pause between image acquisition attempts.
    pub capture_attempt_spacing: Duration,

    /// Wall-clock budget for the whole acquisition loop.
    pub capture_timeout_budget: Duration,

    /// USB vendor id used to locate the reader for hardware resets.
    pub usb_vendor_id: u16,

    /// Optional USB product id filter for hardware resets.
    pub usb_product_id: Option<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            candidate_device_ids: vec![0, 1],
            init_mode: 1,
            gate_acquire_timeout: Duration::from_secs(5),
            max_recovery_attempts: 3,
            recovery_spacing: Duration::from_secs(3),
            basic_recovery_pause: Duration::from_secs(2),
            extended_recovery_pause: Duration::from_secs(5),
            deep_recovery_pause: Duration::from_secs(8),
            deep_recovery_inner_tries: 3,
            deep_recovery_inner_spacing: Duration::from_secs(2),
            max_operations_before_refresh: 50,
            device_health_threshold: Duration::from_secs(300),
            refresh_pause: Duration::from_secs(1),
            reset_pause: Duration::from_secs(2),
            capture_max_attempts: 3,
            capture_attempt_spacing: Duration::from_secs(1),
            capture_timeout_budget: Duration::from_secs(10),
            usb_vendor_id: READER_USB_VENDOR_ID,
            usb_product_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_profile() {
        let config = SessionConfig::default();
        assert_eq!(config.candidate_device_ids, vec![0, 1]);
        assert_eq!(config.init_mode, 1);
        assert_eq!(config.max_operations_before_refresh, 50);
        assert_eq!(config.device_health_threshold, Duration::from_secs(300));
        assert_eq!(config.capture_max_attempts, 3);
        assert_eq!(config.capture_timeout_budget, Duration::from_secs(10));
        assert_eq!(config.usb_vendor_id, 0x1162);
    }
}
