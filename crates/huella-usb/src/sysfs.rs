//! Linux sysfs implementation of the USB reset provider.

use std::path::PathBuf;
use std::time::Duration;

use rusb::UsbContext;
use tracing::{info, warn};

use crate::{Result, UsbResetError, UsbResetProvider};

/// Pause after deauthorizing the device, letting the kernel tear it down.
const DEAUTHORIZE_PAUSE: Duration = Duration::from_secs(2);

/// Pause after reauthorizing, letting the device re-enumerate.
const REAUTHORIZE_PAUSE: Duration = Duration::from_secs(5);

/// USB reset via the sysfs `authorized` flag.
///
/// Locates the reader on the bus with `rusb`, derives its sysfs port name
/// from the bus and port-chain numbers, and writes `0` then `1` to
/// `/sys/bus/usb/devices/<port>/authorized`. Deauthorizing makes the kernel
/// detach the device exactly as if it had been unplugged; reauthorizing
/// triggers a fresh enumeration.
///
/// Requires write access to sysfs (typically a udev rule granting the
/// service user ownership of the reader's `authorized` attribute).
#[derive(Debug, Clone)]
pub struct SysfsUsbReset {
    sysfs_root: PathBuf,
    deauthorize_pause: Duration,
    reauthorize_pause: Duration,
}

impl SysfsUsbReset {
    /// Create a provider using the standard sysfs location and pauses.
    pub fn new() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys/bus/usb/devices"),
            deauthorize_pause: DEAUTHORIZE_PAUSE,
            reauthorize_pause: REAUTHORIZE_PAUSE,
        }
    }

    /// Override the sysfs root (for tests against a temp directory).
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Override the deauthorize/reauthorize pauses.
    pub fn with_pauses(mut self, deauthorize: Duration, reauthorize: Duration) -> Self {
        self.deauthorize_pause = deauthorize;
        self.reauthorize_pause = reauthorize;
        self
    }

    /// Find the sysfs port name (`bus-port.port...`) of the first attached
    /// device matching the filter.
    fn find_port_name(&self, vendor_id: u16, product_id: Option<u16>) -> Result<String> {
        let devices = rusb::GlobalContext::default().devices()?;

        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };
            if descriptor.vendor_id() != vendor_id {
                continue;
            }
            if let Some(pid) = product_id
                && descriptor.product_id() != pid
            {
                continue;
            }

            let ports = device.port_numbers()?;
            if ports.is_empty() {
                // Root hubs have no port chain; a reader is never one.
                continue;
            }
            let chain = ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(".");
            return Ok(format!("{}-{}", device.bus_number(), chain));
        }

        Err(UsbResetError::device_not_found(vendor_id, product_id))
    }

    async fn write_authorized(&self, port: &str, value: &str) -> Result<()> {
        let path = self.sysfs_root.join(port).join("authorized");
        tokio::fs::write(&path, value)
            .await
            .map_err(|source| UsbResetError::Authorize {
                path: path.display().to_string(),
                source,
            })
    }
}

impl Default for SysfsUsbReset {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbResetProvider for SysfsUsbReset {
    async fn reset_device(&self, vendor_id: u16, product_id: Option<u16>) -> Result<()> {
        let port = self.find_port_name(vendor_id, product_id)?;
        info!(port = %port, vendor_id = format!("{vendor_id:04x}"), "hardware USB reset");

        self.write_authorized(&port, "0").await?;
        tokio::time::sleep(self.deauthorize_pause).await;

        if let Err(error) = self.write_authorized(&port, "1").await {
            // The device is now deauthorized; surface the failure loudly,
            // it needs operator attention.
            warn!(port = %port, error = %error, "device left deauthorized");
            return Err(error);
        }
        tokio::time::sleep(self.reauthorize_pause).await;

        info!(port = %port, "hardware USB reset complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_authorized_missing_port_fails() {
        let provider = SysfsUsbReset::new().with_sysfs_root("/nonexistent-sysfs-root");
        let error = provider.write_authorized("1-4", "0").await.unwrap_err();
        assert!(matches!(error, UsbResetError::Authorize { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_round_trip_against_temp_sysfs() {
        let root = std::env::temp_dir().join(format!("huella-sysfs-{}", std::process::id()));
        let port_dir = root.join("1-4");
        std::fs::create_dir_all(&port_dir).unwrap();
        std::fs::write(port_dir.join("authorized"), "1").unwrap();

        let provider = SysfsUsbReset::new()
            .with_sysfs_root(&root)
            .with_pauses(Duration::from_millis(1), Duration::from_millis(1));

        provider.write_authorized("1-4", "0").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(port_dir.join("authorized")).unwrap(),
            "0"
        );

        provider.write_authorized("1-4", "1").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(port_dir.join("authorized")).unwrap(),
            "1"
        );

        std::fs::remove_dir_all(&root).ok();
    }
}
