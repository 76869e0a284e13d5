//! Vendor scanner trait definitions.
//!
//! These traits are the seam between the lifecycle logic in
//! `huella-session` and the foreign vendor SDK. The session layer only ever
//! sees this contract, so the same recovery and capture code runs against a
//! production FFI binding and against the scripted mock in
//! [`crate::mock`].
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT); the `async_trait` macro is not needed. A production
//! implementation wraps its blocking FFI calls in `spawn_blocking` so the
//! session layer can await them without stalling the runtime.

#![allow(async_fn_in_trait)]

use huella_core::{SecurityLevel, Template};

use crate::error::Result;
use crate::types::SensorInfo;

/// One vendor SDK handle to a fingerprint reader.
///
/// The method set mirrors the vendor SDK one-to-one: a handle must be
/// `create`d, then `init`ialized, then `open_device`d before any capture or
/// match call. Every method returns `Result` rather than a raw vendor code;
/// non-success codes arrive as
/// [`DeviceError::Vendor`](crate::error::DeviceError::Vendor).
///
/// Handles are single-owner and not internally synchronized. The hardware
/// cannot serve concurrent calls; serialization is the operation gate's job
/// in `huella-session`, and implementations may assume at most one call is
/// in flight.
///
/// # Examples
///
/// ```no_run
/// use huella_device::traits::FingerprintScanner;
/// use huella_device::error::Result;
///
/// async fn probe<S: FingerprintScanner>(scanner: &mut S) -> Result<()> {
///     let info = scanner.get_device_info().await?;
///     println!("sensor: {}", info);
///     Ok(())
/// }
/// ```
pub trait FingerprintScanner: Send {
    /// Create the underlying SDK instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor library cannot allocate its state.
    async fn create(&mut self) -> Result<()>;

    /// Initialize the SDK in the given device mode.
    ///
    /// The reader family served here uses mode 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK rejects the mode or is not created.
    async fn init(&mut self, mode: u32) -> Result<()>;

    /// Open the physical device at the given index.
    ///
    /// Readers enumerate at different indices depending on bus topology, so
    /// callers probe a candidate list in order.
    ///
    /// # Errors
    ///
    /// Returns an error if no reader answers at this index.
    async fn open_device(&mut self, device_id: i32) -> Result<()>;

    /// Close the currently open device.
    ///
    /// Closing an already-closed device is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK reports a failure while releasing the
    /// device.
    async fn close_device(&mut self) -> Result<()>;

    /// Query the sensor geometry.
    ///
    /// Doubles as the cheap liveness probe used by preventive maintenance:
    /// a healthy reader answers immediately, a wedged one returns the
    /// access-error status.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not answer.
    async fn get_device_info(&mut self) -> Result<SensorInfo>;

    /// Switch the reader's finger-detect LED on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the device does not answer.
    async fn set_led(&mut self, on: bool) -> Result<()>;

    /// Acquire one image frame into `buffer`.
    ///
    /// The buffer must be exactly `width * height` bytes as reported by
    /// [`get_device_info`](Self::get_device_info). The call blocks until a
    /// finger is read or the device gives up on the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable frame was acquired; the access-error
    /// status indicates a wedged device rather than a missing finger.
    async fn get_image(&mut self, buffer: &mut [u8]) -> Result<()>;

    /// Build a fingerprint template from a captured image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has no usable features or the device
    /// does not answer.
    async fn create_template(&mut self, image: &[u8]) -> Result<Template>;

    /// Compare two templates at the given security level.
    ///
    /// Returns whether the vendor considers them the same finger. The match
    /// routine is device-bound: it fails when no device is open.
    ///
    /// # Errors
    ///
    /// Returns an error if either template is rejected or the device does
    /// not answer.
    async fn match_template(
        &mut self,
        first: &Template,
        second: &Template,
        level: SecurityLevel,
    ) -> Result<bool>;

    /// Retrieve the numeric similarity score for two templates.
    ///
    /// Only meaningful after [`match_template`](Self::match_template)
    /// reported a match; callers use 0 for non-matches.
    ///
    /// # Errors
    ///
    /// Returns an error if either template is rejected or the device does
    /// not answer.
    async fn get_matching_score(&mut self, first: &Template, second: &Template) -> Result<u32>;
}

/// Factory recreating scanner handles from scratch.
///
/// The extended and deep recovery tiers do not merely reinitialize a
/// handle, they discard the handle object entirely and build a new one;
/// this trait is what lets the session layer do that without knowing the
/// concrete scanner type.
pub trait ScannerFactory: Send + Sync {
    /// The scanner type this factory produces.
    type Scanner: FingerprintScanner;

    /// Build a fresh, uncreated scanner handle.
    fn create_scanner(&self) -> Self::Scanner;
}
