//! Signed callback tokens for the platform
//!
//! The token is a JWT-shaped string `header.payload.signature` where every
//! segment is unpadded base64url, the signature is HMAC-SHA-512 over
//! `header.payload` and the payload embeds the merchant's private key
//! encrypted with AES-256-CBC (PKCS#7) under the server signing key.

use aes::Aes256;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use thiserror::Error;

use super::Status;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha512 = Hmac<Sha512>;

pub const SIGN_KEY_LENGTH: usize = 32;
pub const IV_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("signing key must be {SIGN_KEY_LENGTH} bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("initialization vector must be {IV_LENGTH} bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("failed to serialize token segment: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature mismatch")]
    BadSignature,

    #[error("failed to decrypt secure block")]
    Decryption,
}

/// Callback body relayed to the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallbackPayload {
    pub status: Status,
    pub currency: String,
    /// Amount in minor units
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecureBlock {
    pub encrypted_data: String,
    pub iv_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub payload: CallbackPayload,
    pub secure: SecureBlock,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

fn generate_iv() -> [u8; IV_LENGTH] {
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

fn encrypt_merchant_key(
    merchant_key: &str,
    sign_key: &[u8],
    iv: &[u8],
) -> Result<SecureBlock, SignError> {
    if sign_key.len() != SIGN_KEY_LENGTH {
        return Err(SignError::InvalidKeyLength(sign_key.len()));
    }
    let encryptor = Aes256CbcEnc::new_from_slices(sign_key, iv)
        .map_err(|_| SignError::InvalidIvLength(iv.len()))?;

    let cipher_text = encryptor.encrypt_padded_vec_mut::<Pkcs7>(merchant_key.as_bytes());

    Ok(SecureBlock {
        encrypted_data: STANDARD.encode(cipher_text),
        iv_value: STANDARD.encode(iv),
    })
}

fn mac(sign_key: &[u8]) -> Result<HmacSha512, SignError> {
    HmacSha512::new_from_slice(sign_key).map_err(|_| SignError::InvalidKeyLength(sign_key.len()))
}

fn encode_token<T: Serialize>(claims: &T, sign_key: &[u8]) -> Result<String, SignError> {
    let header = TokenHeader {
        alg: "HS512".to_string(),
        typ: "JWT".to_string(),
    };

    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let message = format!("{}.{}", header, payload);

    let mut mac = mac(sign_key)?;
    mac.update(message.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", message, signature))
}

/// Sign a callback payload, embedding the encrypted merchant key.
pub fn sign(
    payload: CallbackPayload,
    merchant_private_key: &str,
    sign_key: &[u8],
) -> Result<String, SignError> {
    let iv = generate_iv();
    let secure = encrypt_merchant_key(merchant_private_key, sign_key, &iv)?;

    encode_token(&TokenClaims { payload, secure }, sign_key)
}

/// Check the signature of a token and decode its claims.
pub fn verify(token: &str, sign_key: &[u8]) -> Result<TokenClaims, SignError> {
    let mut segments = token.split('.');
    let (header, payload, signature) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(h), Some(p), Some(s), None) => (h, p, s),
        _ => return Err(SignError::Malformed("expected three segments".to_string())),
    };

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| SignError::Malformed(e.to_string()))?;

    let mut mac = mac(sign_key)?;
    mac.update(format!("{}.{}", header, payload).as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| SignError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| SignError::Malformed(e.to_string()))?;
    Ok(serde_json::from_slice(&payload)?)
}

/// Recover the merchant key from a secure block.
pub fn decrypt_secure_block(block: &SecureBlock, sign_key: &[u8]) -> Result<String, SignError> {
    if sign_key.len() != SIGN_KEY_LENGTH {
        return Err(SignError::InvalidKeyLength(sign_key.len()));
    }
    let iv = STANDARD
        .decode(&block.iv_value)
        .map_err(|e| SignError::Malformed(e.to_string()))?;
    let cipher_text = STANDARD
        .decode(&block.encrypted_data)
        .map_err(|e| SignError::Malformed(e.to_string()))?;

    let decryptor = Aes256CbcDec::new_from_slices(sign_key, &iv)
        .map_err(|_| SignError::InvalidIvLength(iv.len()))?;
    let plain = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&cipher_text)
        .map_err(|_| SignError::Decryption)?;

    String::from_utf8(plain).map_err(|_| SignError::Decryption)
}
