//! Policy constants shared across the Huella workspace.
//!
//! These values bound what the service will accept from the device and the
//! caller. They are derived from the vendor SDK's documented limits and from
//! the operational experience that shaped the recovery subsystem: a corrupt
//! driver can report nonsensical sensor geometry, so every dimension the
//! device claims is checked against these caps before memory is allocated.

// ============================================================================
// Vendor template format
// ============================================================================

/// Size in bytes of a vendor SG400 fingerprint template.
///
/// The template is an opaque, fixed-size feature blob produced by the vendor
/// SDK. Huella never parses it; the only invariant enforced is the size.
///
/// # Examples
///
/// ```
/// use huella_core::constants::SG400_TEMPLATE_SIZE;
/// use huella_core::Template;
///
/// let template = Template::from_bytes(&[0u8; SG400_TEMPLATE_SIZE]).unwrap();
/// assert_eq!(template.as_bytes().len(), SG400_TEMPLATE_SIZE);
/// ```
pub const SG400_TEMPLATE_SIZE: usize = 400;

// ============================================================================
// USB identification
// ============================================================================

/// USB vendor id of the fingerprint reader family.
///
/// Used by the emergency reset path to locate the physical device on the
/// bus when the SDK-level recovery tiers have been exhausted.
pub const READER_USB_VENDOR_ID: u16 = 0x1162;

// ============================================================================
// Capture safety caps
// ============================================================================

/// Upper bound on either sensor dimension reported by the device.
///
/// A width or height of zero, a negative value, or anything above this cap
/// indicates corrupt driver state rather than a transient fault, and the
/// capture is rejected without retry.
pub const MAX_SENSOR_DIMENSION: i64 = 1000;

/// Hard cap on the capture image buffer, in bytes.
///
/// Guards against runaway allocation if the device reports dimensions that
/// individually pass [`MAX_SENSOR_DIMENSION`] but multiply out to an
/// unreasonable buffer.
pub const MAX_IMAGE_BUFFER_BYTES: usize = 1_000_000;
