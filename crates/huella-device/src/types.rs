//! Common types shared by scanner implementations.

/// Sensor geometry reported by the device.
///
/// The raw values are signed because the vendor SDK reports them through
/// C `long` out-parameters and a corrupt driver has been observed returning
/// zero or garbage; validation against the caps in
/// [`huella_core::constants`] belongs to the capture pipeline, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorInfo {
    /// Image width in pixels.
    pub width: i64,

    /// Image height in pixels.
    pub height: i64,
}

impl SensorInfo {
    /// Create sensor info from raw device-reported dimensions.
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// The image buffer size these dimensions imply, when both are positive.
    pub fn buffer_size(&self) -> Option<usize> {
        if self.width > 0 && self.height > 0 {
            Some((self.width as usize) * (self.height as usize))
        } else {
            None
        }
    }
}

impl std::fmt::Display for SensorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size() {
        assert_eq!(SensorInfo::new(258, 336).buffer_size(), Some(258 * 336));
        assert_eq!(SensorInfo::new(0, 336).buffer_size(), None);
        assert_eq!(SensorInfo::new(258, -1).buffer_size(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SensorInfo::new(258, 336).to_string(), "258x336");
    }
}
