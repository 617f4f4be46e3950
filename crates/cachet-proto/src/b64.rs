//! Serde adapters for base64-encoded byte fields.
//!
//! The wire is JSON; byte fields (keys, ciphertexts, signed blobs) travel
//! as standard-alphabet base64 strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a byte slice as a base64 string.
pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Deserialize a base64 string into bytes.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper {
        #[serde(with = "super")]
        data: Vec<u8>,
    }

    #[test]
    fn roundtrip() {
        let original = Wrapper {
            data: vec![0, 1, 2, 255],
        };
        let js = serde_json::to_string(&original).unwrap();
        assert_eq!(js, r#"{"data":"AAEC/w=="}"#);
        assert_eq!(serde_json::from_str::<Wrapper>(&js).unwrap(), original);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"data":"!!!"}"#).is_err());
    }
}
