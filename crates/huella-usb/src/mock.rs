//! Mock USB reset provider for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Result, UsbResetError, UsbResetProvider};

#[derive(Debug, Default)]
struct MockState {
    fail_with: Option<String>,
    calls: Vec<(u16, Option<u16>)>,
}

/// Scripted USB reset provider.
///
/// Records every reset request and succeeds unless scripted to fail.
///
/// # Examples
///
/// ```
/// use huella_usb::{MockUsbReset, UsbResetProvider};
///
/// #[tokio::main]
/// async fn main() {
///     let provider = MockUsbReset::new();
///     provider.reset_device(0x1162, None).await.unwrap();
///     assert_eq!(provider.call_count(), 1);
///
///     provider.fail_with("bus stuck");
///     assert!(provider.reset_device(0x1162, None).await.is_err());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockUsbReset {
    state: Arc<Mutex<MockState>>,
}

impl MockUsbReset {
    /// Create a provider that succeeds on every reset.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make subsequent resets fail with the given message.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().fail_with = Some(message.into());
    }

    /// Make subsequent resets succeed again.
    pub fn succeed(&self) {
        self.lock().fail_with = None;
    }

    /// Every reset request made so far.
    pub fn calls(&self) -> Vec<(u16, Option<u16>)> {
        self.lock().calls.clone()
    }

    /// Number of reset requests made so far.
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }
}

impl UsbResetProvider for MockUsbReset {
    async fn reset_device(&self, vendor_id: u16, product_id: Option<u16>) -> Result<()> {
        let mut state = self.lock();
        state.calls.push((vendor_id, product_id));
        match &state.fail_with {
            Some(message) => Err(UsbResetError::Failed(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let provider = MockUsbReset::new();
        provider.reset_device(0x1162, Some(0x2200)).await.unwrap();
        provider.reset_device(0x1162, None).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec![(0x1162, Some(0x2200)), (0x1162, None)]
        );
    }

    #[tokio::test]
    async fn test_mock_scripted_failure_and_recovery() {
        let provider = MockUsbReset::new();
        provider.fail_with("bus stuck");
        assert!(provider.reset_device(0x1162, None).await.is_err());

        provider.succeed();
        assert!(provider.reset_device(0x1162, None).await.is_ok());
        assert_eq!(provider.call_count(), 2);
    }
}
