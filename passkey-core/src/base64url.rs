//! Unpadded base64url helpers and serde adapters for binary WebAuthn fields.
//!
//! Browsers emit unpadded base64url; padded input is tolerated on decode.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, with or without trailing padding.
pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))
}

pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&encode(bytes))
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<Vec<u8>>,
{
    let s = String::deserialize(deserializer)?;
    let bytes = decode(&s).map_err(D::Error::custom)?;
    T::try_from(bytes).map_err(|_| D::Error::custom("unexpected byte length"))
}

/// Adapter for optional binary fields.
pub mod option {
    use super::*;

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_some(&encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => decode(&s).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tolerates_padding() {
        assert_eq!(decode("AQI").unwrap(), vec![1, 2]);
        assert_eq!(decode("AQI=").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_url_safe_alphabet() {
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert!(decode("+/8").is_err());
    }

    #[test]
    fn test_serde_fixed_length() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Fixed {
            #[serde(with = "crate::base64url")]
            aaguid: [u8; 4],
        }

        let json = serde_json::to_string(&Fixed { aaguid: [1, 2, 3, 4] }).unwrap();
        assert_eq!(json, r#"{"aaguid":"AQIDBA"}"#);
        assert!(serde_json::from_str::<Fixed>(r#"{"aaguid":"AQI"}"#).is_err());
    }
}
