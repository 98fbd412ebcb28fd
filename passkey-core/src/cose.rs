//! COSE_Key decoding (RFC 9052 / RFC 9053) for the two supported key families.

use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::cbor::{CborReader, DecodeError, MajorType, MapKey};
use crate::error::{CeremonyError, Result};

/// COSE key type label
const LABEL_KTY: i64 = 1;
/// COSE algorithm label
const LABEL_ALG: i64 = 3;
/// EC2 curve / RSA modulus label
const LABEL_CRV_OR_N: i64 = -1;
/// EC2 x coordinate / RSA exponent label
const LABEL_X_OR_E: i64 = -2;
/// EC2 y coordinate label
const LABEL_Y: i64 = -3;

const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;
const CURVE_P256: i64 = 1;

/// Byte length of a P-256 field element.
pub const P256_COORDINATE_LEN: usize = 32;

/// Signature algorithms accepted for new credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CoseAlgorithm {
    /// ECDSA with P-256 and SHA-256
    Es256,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    Rs256,
}

impl CoseAlgorithm {
    /// All supported algorithms, in order of preference.
    pub const SUPPORTED: [CoseAlgorithm; 2] = [CoseAlgorithm::Es256, CoseAlgorithm::Rs256];

    /// COSE algorithm identifier.
    pub const fn id(self) -> i64 {
        match self {
            Self::Es256 => -7,
            Self::Rs256 => -257,
        }
    }

    pub fn from_id(id: i64) -> Result<Self> {
        match id {
            -7 => Ok(Self::Es256),
            -257 => Ok(Self::Rs256),
            other => Err(CeremonyError::UnsupportedAlgorithm(other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
            Self::Rs256 => "RS256",
        }
    }
}

impl TryFrom<i64> for CoseAlgorithm {
    type Error = CeremonyError;

    fn try_from(id: i64) -> Result<Self> {
        Self::from_id(id)
    }
}

impl From<CoseAlgorithm> for i64 {
    fn from(alg: CoseAlgorithm) -> Self {
        alg.id()
    }
}

/// Elliptic curves accepted for EC2 keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcCurve {
    #[serde(rename = "P-256")]
    P256,
}

/// A credential public key as carried in authenticator data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum CoseKey {
    /// Uncompressed elliptic-curve point
    #[serde(rename = "EC2")]
    Ec2 {
        curve: EcCurve,
        #[serde(with = "base64url")]
        x: [u8; P256_COORDINATE_LEN],
        #[serde(with = "base64url")]
        y: [u8; P256_COORDINATE_LEN],
    },
    /// RSA modulus and public exponent, big-endian
    #[serde(rename = "RSA")]
    Rsa {
        #[serde(with = "base64url")]
        n: Vec<u8>,
        #[serde(with = "base64url")]
        e: Vec<u8>,
    },
}

/// Value of a COSE key parameter, as far as this decoder cares.
#[derive(Debug, Clone, Copy)]
enum Param<'a> {
    Int(i64),
    Bytes(&'a [u8]),
    Other,
}

impl CoseKey {
    /// Decode a COSE_Key map occupying the whole of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let params = read_params(bytes).map_err(|e| malformed(e.to_string()))?;
        let int = |label: i64, name: &str| match lookup(&params, label) {
            Some(Param::Int(v)) => Ok(v),
            Some(_) => Err(malformed(format!("{name} is not an integer"))),
            None => Err(malformed(format!("missing {name}"))),
        };
        let bytes_param = |label: i64, name: &str| match lookup(&params, label) {
            Some(Param::Bytes(v)) if !v.is_empty() => Ok(v),
            Some(Param::Bytes(_)) => Err(malformed(format!("{name} is empty"))),
            Some(_) => Err(malformed(format!("{name} is not a byte string"))),
            None => Err(malformed(format!("missing {name}"))),
        };
        let declared_alg = match lookup(&params, LABEL_ALG) {
            Some(Param::Int(alg)) => Some(alg),
            Some(_) => return Err(malformed("alg is not an integer".into())),
            None => None,
        };

        let key = match int(LABEL_KTY, "kty")? {
            KTY_EC2 => {
                let crv = int(LABEL_CRV_OR_N, "crv")?;
                if crv != CURVE_P256 {
                    return Err(malformed(format!("unsupported curve {crv}")));
                }
                let x = coordinate(bytes_param(LABEL_X_OR_E, "x")?, "x")?;
                let y = coordinate(bytes_param(LABEL_Y, "y")?, "y")?;
                CoseKey::Ec2 {
                    curve: EcCurve::P256,
                    x,
                    y,
                }
            }
            KTY_RSA => CoseKey::Rsa {
                n: bytes_param(LABEL_CRV_OR_N, "n")?.to_vec(),
                e: bytes_param(LABEL_X_OR_E, "e")?.to_vec(),
            },
            other => return Err(malformed(format!("unsupported key type {other}"))),
        };

        if let Some(alg) = declared_alg {
            if alg != key.algorithm().id() {
                return Err(CeremonyError::UnsupportedAlgorithm(alg));
            }
        }
        Ok(key)
    }

    /// Algorithm implied by the key type and curve.
    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            CoseKey::Ec2 { .. } => CoseAlgorithm::Es256,
            CoseKey::Rsa { .. } => CoseAlgorithm::Rs256,
        }
    }

    /// SEC1 uncompressed encoding (`0x04 || x || y`) of an EC2 key.
    pub fn sec1_uncompressed(&self) -> Option<Vec<u8>> {
        match self {
            CoseKey::Ec2 { x, y, .. } => {
                let mut point = Vec::with_capacity(1 + 2 * P256_COORDINATE_LEN);
                point.push(0x04);
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                Some(point)
            }
            CoseKey::Rsa { .. } => None,
        }
    }
}

fn malformed(message: String) -> CeremonyError {
    CeremonyError::MalformedCoseKey(message)
}

fn coordinate(bytes: &[u8], name: &str) -> Result<[u8; P256_COORDINATE_LEN]> {
    bytes.try_into().map_err(|_| {
        malformed(format!(
            "{name} must be {P256_COORDINATE_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

fn lookup<'a>(params: &[(i64, Param<'a>)], label: i64) -> Option<Param<'a>> {
    params
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, value)| *value)
}

#[derive(Debug, thiserror::Error)]
enum ParamError {
    #[error(transparent)]
    Cbor(#[from] DecodeError),

    #[error("label {0} appears more than once")]
    DuplicateLabel(i64),
}

fn read_params(bytes: &[u8]) -> std::result::Result<Vec<(i64, Param<'_>)>, ParamError> {
    let mut reader = CborReader::new(bytes);
    let entries = reader.read_map_len()?;
    let mut params = Vec::with_capacity(entries.min(8));

    for _ in 0..entries {
        let label = match reader.read_key()? {
            MapKey::Int(label) => label,
            MapKey::Text(_) => {
                reader.skip_item()?;
                continue;
            }
        };
        let value = match reader.peek_major()? {
            MajorType::Unsigned | MajorType::Negative => Param::Int(reader.read_int()?),
            MajorType::Bytes => Param::Bytes(reader.read_bytes()?),
            _ => {
                reader.skip_item()?;
                Param::Other
            }
        };
        if params.iter().any(|(l, _)| *l == label) {
            return Err(ParamError::DuplicateLabel(label));
        }
        params.push((label, value));
    }
    reader.finish()?;

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value;

    fn int(v: i64) -> Value {
        Value::Integer(v.into())
    }

    fn encode(entries: Vec<(Value, Value)>) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(&Value::Map(entries), &mut buf).unwrap();
        buf
    }

    fn ec2_entries(x: Vec<u8>, y: Vec<u8>) -> Vec<(Value, Value)> {
        vec![
            (int(1), int(2)),
            (int(3), int(-7)),
            (int(-1), int(1)),
            (int(-2), Value::Bytes(x)),
            (int(-3), Value::Bytes(y)),
        ]
    }

    #[test]
    fn test_decode_ec2() {
        let key = CoseKey::decode(&encode(ec2_entries(vec![0x11; 32], vec![0x22; 32]))).unwrap();
        assert_eq!(
            key,
            CoseKey::Ec2 {
                curve: EcCurve::P256,
                x: [0x11; 32],
                y: [0x22; 32]
            }
        );
        assert_eq!(key.algorithm(), CoseAlgorithm::Es256);
        let sec1 = key.sec1_uncompressed().unwrap();
        assert_eq!(sec1.len(), 65);
        assert_eq!(sec1[0], 0x04);
    }

    #[test]
    fn test_decode_rsa() {
        let n = vec![0xC5; 256];
        let bytes = encode(vec![
            (int(1), int(3)),
            (int(3), int(-257)),
            (int(-1), Value::Bytes(n.clone())),
            (int(-2), Value::Bytes(vec![0x01, 0x00, 0x01])),
        ]);
        let key = CoseKey::decode(&bytes).unwrap();
        assert_eq!(
            key,
            CoseKey::Rsa {
                n,
                e: vec![0x01, 0x00, 0x01]
            }
        );
        assert_eq!(key.algorithm(), CoseAlgorithm::Rs256);
        assert!(key.sec1_uncompressed().is_none());
    }

    #[test]
    fn test_alg_label_is_optional() {
        let mut entries = ec2_entries(vec![1; 32], vec![2; 32]);
        entries.remove(1);
        assert!(CoseKey::decode(&encode(entries)).is_ok());
    }

    #[test]
    fn test_unsupported_key_types() {
        for kty in [0, 1, 4, -1] {
            let bytes = encode(vec![
                (int(1), int(kty)),
                (int(-1), int(6)),
                (int(-2), Value::Bytes(vec![0; 32])),
            ]);
            assert!(
                matches!(CoseKey::decode(&bytes), Err(CeremonyError::MalformedCoseKey(_))),
                "kty {kty} must be rejected"
            );
        }
    }

    #[test]
    fn test_ec2_coordinate_lengths() {
        for (x_len, y_len) in [(31, 32), (32, 33), (33, 33), (0, 32)] {
            let bytes = encode(ec2_entries(vec![1; x_len], vec![2; y_len]));
            assert!(
                matches!(CoseKey::decode(&bytes), Err(CeremonyError::MalformedCoseKey(_))),
                "x={x_len} y={y_len} must be rejected"
            );
        }
    }

    #[test]
    fn test_ec2_wrong_curve() {
        let mut entries = ec2_entries(vec![1; 32], vec![2; 32]);
        entries[2] = (int(-1), int(2));
        assert!(matches!(
            CoseKey::decode(&encode(entries)),
            Err(CeremonyError::MalformedCoseKey(m)) if m.contains("curve")
        ));
    }

    #[test]
    fn test_declared_algorithm_must_match_key_type() {
        let mut entries = ec2_entries(vec![1; 32], vec![2; 32]);
        entries[1] = (int(3), int(-257));
        assert_eq!(
            CoseKey::decode(&encode(entries)),
            Err(CeremonyError::UnsupportedAlgorithm(-257))
        );

        let bytes = encode(vec![
            (int(1), int(3)),
            (int(3), int(-37)),
            (int(-1), Value::Bytes(vec![0xC5; 128])),
            (int(-2), Value::Bytes(vec![3])),
        ]);
        assert_eq!(
            CoseKey::decode(&bytes),
            Err(CeremonyError::UnsupportedAlgorithm(-37))
        );
    }

    #[test]
    fn test_missing_kty_and_duplicates() {
        let mut entries = ec2_entries(vec![1; 32], vec![2; 32]);
        entries.remove(0);
        assert!(matches!(
            CoseKey::decode(&encode(entries)),
            Err(CeremonyError::MalformedCoseKey(m)) if m.contains("kty")
        ));

        let mut entries = ec2_entries(vec![1; 32], vec![2; 32]);
        entries.push((int(-2), Value::Bytes(vec![3; 32])));
        assert!(matches!(
            CoseKey::decode(&encode(entries)),
            Err(CeremonyError::MalformedCoseKey(_))
        ));
    }

    #[test]
    fn test_not_a_map() {
        assert!(matches!(
            CoseKey::decode(&[0x42, 0x01, 0x02]),
            Err(CeremonyError::MalformedCoseKey(_))
        ));
    }

    #[test]
    fn test_algorithm_ids() {
        assert_eq!(CoseAlgorithm::from_id(-7).unwrap(), CoseAlgorithm::Es256);
        assert_eq!(CoseAlgorithm::from_id(-257).unwrap(), CoseAlgorithm::Rs256);
        assert_eq!(
            CoseAlgorithm::from_id(-8),
            Err(CeremonyError::UnsupportedAlgorithm(-8))
        );
        assert_eq!(serde_json::to_string(&CoseAlgorithm::Rs256).unwrap(), "-257");
    }

    #[test]
    fn test_key_json_shape() {
        let key = CoseKey::Rsa {
            n: vec![1, 2],
            e: vec![1, 0, 1],
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["kty"], "RSA");
        assert_eq!(json["e"], "AQAB");
        let back: CoseKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
    }
}
