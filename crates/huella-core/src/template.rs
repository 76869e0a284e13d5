//! Opaque fingerprint template blob with a fixed-size invariant.

use serde::{Deserialize, Serialize};

use crate::constants::SG400_TEMPLATE_SIZE;

/// Errors produced when constructing a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The input is not exactly the vendor template size.
    #[error("template must be exactly {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },
}

/// A vendor fingerprint template.
///
/// Templates are fixed-size binary feature representations produced by the
/// vendor SDK from a captured image. Huella treats them as opaque: the only
/// invariant enforced is that a template is exactly
/// [`SG400_TEMPLATE_SIZE`](crate::constants::SG400_TEMPLATE_SIZE) bytes.
/// The bytes are never interpreted beyond being handed back to the SDK's
/// match routine.
///
/// # Examples
///
/// ```
/// use huella_core::Template;
///
/// let template = Template::from_bytes(&[0u8; 400]).unwrap();
/// assert_eq!(template.as_bytes().len(), 400);
///
/// // Anything that is not exactly 400 bytes is rejected.
/// assert!(Template::from_bytes(&[0u8; 399]).is_err());
/// assert!(Template::from_bytes(&[0u8; 401]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Template {
    bytes: Box<[u8; SG400_TEMPLATE_SIZE]>,
}

impl Template {
    /// Construct a template from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::WrongSize`] if the slice is not exactly
    /// the vendor template size.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let fixed: [u8; SG400_TEMPLATE_SIZE] =
            bytes.try_into().map_err(|_| TemplateError::WrongSize {
                expected: SG400_TEMPLATE_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self {
            bytes: Box::new(fixed),
        })
    }

    /// Construct an all-zero template.
    ///
    /// Useful as a neutral operand in tests and diagnostics; the vendor
    /// match routine treats it as a valid (non-matching) template.
    pub fn zeroed() -> Self {
        Self {
            bytes: Box::new([0u8; SG400_TEMPLATE_SIZE]),
        }
    }

    /// The fixed template size in bytes.
    pub const fn size() -> usize {
        SG400_TEMPLATE_SIZE
    }

    /// Borrow the raw template bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    /// Copy the template into an owned byte vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

impl TryFrom<Vec<u8>> for Template {
    type Error = TemplateError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(&value)
    }
}

impl From<Template> for Vec<u8> {
    fn from(template: Template) -> Self {
        template.to_vec()
    }
}

// A derived Debug would dump all 400 bytes; the blob is opaque anyway.
impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Template({} bytes)", SG400_TEMPLATE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_template_round_trip() {
        let mut raw = vec![0u8; SG400_TEMPLATE_SIZE];
        raw[0] = 0xAB;
        raw[399] = 0xCD;

        let template = Template::from_bytes(&raw).unwrap();
        assert_eq!(template.as_bytes(), &raw[..]);
        assert_eq!(template.to_vec(), raw);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(399)]
    #[case(401)]
    #[case(4096)]
    fn test_template_rejects_wrong_sizes(#[case] len: usize) {
        let result = Template::from_bytes(&vec![0u8; len]);
        assert_eq!(
            result,
            Err(TemplateError::WrongSize {
                expected: SG400_TEMPLATE_SIZE,
                actual: len
            })
        );
    }

    #[test]
    fn test_template_zeroed() {
        let template = Template::zeroed();
        assert!(template.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_template_equality_is_byte_equality() {
        let a = Template::zeroed();
        let mut raw = vec![0u8; SG400_TEMPLATE_SIZE];
        raw[17] = 1;
        let b = Template::from_bytes(&raw).unwrap();

        assert_eq!(a, Template::zeroed());
        assert_ne!(a, b);
    }

    #[test]
    fn test_template_debug_does_not_dump_bytes() {
        let template = Template::zeroed();
        assert_eq!(format!("{:?}", template), "Template(400 bytes)");
    }

    #[test]
    fn test_template_serde_round_trip() {
        let template = Template::zeroed();
        let json = serde_json::to_string(&template).unwrap();
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(template, back);
    }

    #[test]
    fn test_template_serde_rejects_wrong_size() {
        let json = serde_json::to_string(&vec![0u8; 10]).unwrap();
        let result: Result<Template, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }
}
