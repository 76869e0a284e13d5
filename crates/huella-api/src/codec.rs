//! Serde helpers for binary payloads in JSON bodies.

use base64::engine::general_purpose::{GeneralPurpose, STANDARD};

const ENGINE: GeneralPurpose = STANDARD;

/// Serialize/deserialize `Vec<u8>` as standard base64.
///
/// Use with `#[serde(with = "codec::base64_bytes")]`.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::ENGINE;
    use base64::Engine;

    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ENGINE.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        ENGINE.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

/// Serialize/deserialize `Option<Vec<u8>>` as optional base64.
///
/// Use with `#[serde(with = "codec::base64_bytes_opt", default)]`.
pub mod base64_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::ENGINE;
    use base64::Engine;

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&ENGINE.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|encoded| ENGINE.decode(encoded.as_bytes()).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        #[serde(with = "super::base64_bytes")]
        data: Vec<u8>,
        #[serde(with = "super::base64_bytes_opt", default)]
        extra: Option<Vec<u8>>,
    }

    #[test]
    fn test_base64_round_trip() {
        let payload = Payload {
            data: vec![0, 1, 2, 255],
            extra: Some(vec![42]),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"AAEC/w==\""));

        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_optional_field_defaults_to_none() {
        let back: Payload = serde_json::from_str(r#"{"data":""}"#).unwrap();
        assert_eq!(back.data, Vec::<u8>::new());
        assert_eq!(back.extra, None);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result: Result<Payload, _> = serde_json::from_str(r#"{"data":"not base64!!"}"#);
        assert!(result.is_err());
    }
}
