//! Software authenticator for driving ceremonies end to end.

#![allow(dead_code)]

use ciborium::value::Value;
use p256::ecdsa::signature::Signer as _;
use rand::rngs::OsRng;
use rsa::signature::SignatureEncoding as _;
use rsa::traits::PublicKeyParts as _;
use sha2::{Digest, Sha256};

use passkey_core::base64url;
use passkey_core::types::{AssertionResponse, AttestationResponse};
use passkey_core::{
    AuthenticationResponse, CreationOptions, RegistrationResponse, RelyingParty,
    RelyingPartyConfig, RequestOptions,
};

pub const RP_ID: &str = "example.com";
pub const ORIGIN: &str = "https://example.com";

pub const FLAG_UP: u8 = 0x01;
pub const FLAG_UV: u8 = 0x04;
pub const FLAG_AT: u8 = 0x40;

pub fn config() -> RelyingPartyConfig {
    RelyingPartyConfig::new(RP_ID, "Example", [ORIGIN]).unwrap()
}

pub fn relying_party() -> RelyingParty {
    RelyingParty::in_memory(config())
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("passkey_core=debug,passkey::security=warn")
        .with_test_writer()
        .try_init();
}

pub enum KeyPair {
    Es256(p256::ecdsa::SigningKey),
    Rs256 {
        signing_key: rsa::pkcs1v15::SigningKey<Sha256>,
        public_key: rsa::RsaPublicKey,
    },
}

impl KeyPair {
    pub fn es256() -> Self {
        KeyPair::Es256(p256::ecdsa::SigningKey::random(&mut OsRng))
    }

    pub fn rs256() -> Self {
        let private = rsa::RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        KeyPair::Rs256 {
            public_key: private.to_public_key(),
            signing_key: rsa::pkcs1v15::SigningKey::<Sha256>::new(private),
        }
    }

    /// COSE_Key encoding of the public half.
    pub fn cose_key(&self) -> Vec<u8> {
        let map = match self {
            KeyPair::Es256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                Value::Map(vec![
                    (int(1), int(2)),
                    (int(3), int(-7)),
                    (int(-1), int(1)),
                    (int(-2), Value::Bytes(point.x().unwrap().to_vec())),
                    (int(-3), Value::Bytes(point.y().unwrap().to_vec())),
                ])
            }
            KeyPair::Rs256 { public_key, .. } => Value::Map(vec![
                (int(1), int(3)),
                (int(3), int(-257)),
                (int(-1), Value::Bytes(public_key.n().to_bytes_be())),
                (int(-2), Value::Bytes(public_key.e().to_bytes_be())),
            ]),
        };
        cbor(&map)
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            KeyPair::Es256(key) => {
                let sig: p256::ecdsa::Signature = key.sign(message);
                sig.to_der().as_bytes().to_vec()
            }
            KeyPair::Rs256 { signing_key, .. } => signing_key.sign(message).to_vec(),
        }
    }
}

pub fn int(v: i64) -> Value {
    Value::Integer(v.into())
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn cbor(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).unwrap();
    buf
}

pub fn client_data(ceremony_type: &str, challenge: &str, origin: &str) -> Vec<u8> {
    serde_json::json!({
        "type": ceremony_type,
        "challenge": challenge,
        "origin": origin,
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}

pub fn attestation_object(auth_data: &[u8]) -> Vec<u8> {
    cbor(&Value::Map(vec![
        (text("fmt"), text("none")),
        (text("attStmt"), Value::Map(vec![])),
        (text("authData"), Value::Bytes(auth_data.to_vec())),
    ]))
}

pub fn registration_response(
    credential_id: &[u8],
    client_data_json: &[u8],
    attestation_object: &[u8],
) -> RegistrationResponse {
    RegistrationResponse {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        credential_type: "public-key".to_string(),
        response: AttestationResponse {
            client_data_json: base64url::encode(client_data_json),
            attestation_object: base64url::encode(attestation_object),
            transports: vec!["internal".to_string()],
        },
    }
}

pub fn assertion_response(
    credential_id: &[u8],
    client_data_json: &[u8],
    authenticator_data: &[u8],
    signature: &[u8],
    user_handle: Option<&[u8]>,
) -> AuthenticationResponse {
    AuthenticationResponse {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        credential_type: "public-key".to_string(),
        response: AssertionResponse {
            client_data_json: base64url::encode(client_data_json),
            authenticator_data: base64url::encode(authenticator_data),
            signature: base64url::encode(signature),
            user_handle: user_handle.map(base64url::encode),
        },
    }
}

/// A single-credential authenticator.
pub struct SoftAuthenticator {
    pub key: KeyPair,
    pub credential_id: Vec<u8>,
    pub aaguid: [u8; 16],
    pub rp_id: String,
    pub origin: String,
}

impl SoftAuthenticator {
    pub fn new(key: KeyPair) -> Self {
        let mut credential_id = vec![0u8; 32];
        rand::RngCore::fill_bytes(&mut OsRng, &mut credential_id);
        Self {
            key,
            credential_id,
            aaguid: [0x2a; 16],
            rp_id: RP_ID.to_string(),
            origin: ORIGIN.to_string(),
        }
    }

    pub fn es256() -> Self {
        Self::new(KeyPair::es256())
    }

    pub fn rs256() -> Self {
        Self::new(KeyPair::rs256())
    }

    /// Authenticator data header plus, when `AT` is in `flags`, the attested
    /// credential block.
    pub fn auth_data(&self, flags: u8, sign_count: u32) -> Vec<u8> {
        self.auth_data_with_key(flags, sign_count, &self.key.cose_key())
    }

    pub fn auth_data_with_key(&self, flags: u8, sign_count: u32, cose_key: &[u8]) -> Vec<u8> {
        let mut data = Sha256::digest(self.rp_id.as_bytes()).to_vec();
        data.push(flags);
        data.extend_from_slice(&sign_count.to_be_bytes());
        if flags & FLAG_AT != 0 {
            data.extend_from_slice(&self.aaguid);
            data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(&self.credential_id);
            data.extend_from_slice(cose_key);
        }
        data
    }

    /// Answer creation options the way a browser and authenticator would.
    pub fn register(&self, options: &CreationOptions) -> RegistrationResponse {
        self.register_with(options, FLAG_UP | FLAG_UV | FLAG_AT, 0)
    }

    pub fn register_with(
        &self,
        options: &CreationOptions,
        flags: u8,
        sign_count: u32,
    ) -> RegistrationResponse {
        let client_data_json = client_data("webauthn.create", &options.challenge, &self.origin);
        let attestation = attestation_object(&self.auth_data(flags, sign_count));
        registration_response(&self.credential_id, &client_data_json, &attestation)
    }

    /// Produce a signed assertion for `challenge`.
    pub fn assert(&self, challenge: &str, sign_count: u32) -> AuthenticationResponse {
        let client_data_json = client_data("webauthn.get", challenge, &self.origin);
        let auth_data = self.auth_data(FLAG_UP | FLAG_UV, sign_count);
        self.assert_parts(&client_data_json, &auth_data)
    }

    /// Sign arbitrary client data and authenticator data.
    pub fn assert_parts(&self, client_data_json: &[u8], auth_data: &[u8]) -> AuthenticationResponse {
        let mut message = auth_data.to_vec();
        message.extend_from_slice(&Sha256::digest(client_data_json));
        let signature = self.key.sign(&message);
        assertion_response(
            &self.credential_id,
            client_data_json,
            auth_data,
            &signature,
            None,
        )
    }

    pub fn assert_options(&self, options: &RequestOptions, sign_count: u32) -> AuthenticationResponse {
        self.assert(&options.challenge, sign_count)
    }
}

/// Register `authenticator` for `user_id` with a zero sign counter.
pub async fn register(rp: &RelyingParty, authenticator: &SoftAuthenticator, user_id: &[u8]) {
    let options = rp
        .begin_registration(passkey_core::NewUser {
            id: user_id.to_vec(),
            name: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
        })
        .await
        .unwrap();
    rp.finish_registration(&authenticator.register(&options))
        .await
        .unwrap();
}
