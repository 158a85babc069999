//! QR token codec.
//!
//! A QR token authenticated-encrypts the pair `"{ticket_id}:{owner_counter}"`
//! and packages it as `"bae:{base64 ciphertext}:{nonce}"`. Because the owner
//! counter is bound into the ciphertext, every previously issued token becomes
//! invalid the moment a ticket is re-personalized, without any server-side
//! revocation list.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Wire prefix for QR payloads.
const QR_PREFIX: &str = "bae";

/// AES-GCM nonce length (96 bits).
const NONCE_LEN: usize = 12;

/// Nonces are printable: 12 letters drawn from "bae", so the token stays a
/// plain ASCII string a QR scanner can hand over verbatim.
const NONCE_ALPHABET: &[u8; 3] = b"bae";

#[derive(Clone)]
pub struct QrCodec {
    cipher: Aes256Gcm,
}

impl QrCodec {
    /// Build a codec from a 32-byte AES-256 key.
    pub fn new(key: &[u8]) -> Result<Self, AppError> {
        if key.len() != 32 {
            return Err(AppError::InternalServerError(
                "QR key must be exactly 32 bytes (256 bits)".to_string(),
            ));
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
            AppError::InternalServerError(format!("failed to initialize AES-256-GCM: {e}"))
        })?;
        Ok(Self { cipher })
    }

    fn random_nonce() -> [u8; NONCE_LEN] {
        let mut rng = rand::thread_rng();
        let mut nonce = [0u8; NONCE_LEN];
        for byte in &mut nonce {
            *byte = NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())];
        }
        nonce
    }

    /// Encrypt (ticket id, owner counter) into a QR token string.
    pub fn encode(&self, ticket_id: Uuid, owner_counter: i32) -> Result<String, AppError> {
        let nonce_bytes = Self::random_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = format!("{ticket_id}:{owner_counter}");

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::InternalServerError(format!("QR encryption failed: {e}")))?;

        // Nonce bytes are ASCII by construction
        let nonce_str = std::str::from_utf8(&nonce_bytes)
            .map_err(|e| AppError::InternalServerError(format!("QR nonce not ASCII: {e}")))?
            .to_string();

        Ok(format!("{QR_PREFIX}:{}:{nonce_str}", BASE64.encode(ciphertext)))
    }

    /// Decrypt a QR token back into (ticket id, owner counter).
    ///
    /// Every structural or cryptographic mismatch surfaces as `InvalidToken`;
    /// the caller cannot distinguish a tampered ciphertext from a malformed
    /// string, which is intentional.
    pub fn decode(&self, token: &str) -> Result<(Uuid, i32), AppError> {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() != 3 {
            return Err(AppError::InvalidToken(
                "token must have three components".to_string(),
            ));
        }
        if parts[0] != QR_PREFIX {
            return Err(AppError::InvalidToken(format!(
                "token must start with the {QR_PREFIX}: protocol"
            )));
        }

        let ciphertext = BASE64
            .decode(parts[1])
            .map_err(|_| AppError::InvalidToken("ciphertext is not valid base64".to_string()))?;

        let nonce_bytes = parts[2].as_bytes();
        if nonce_bytes.len() != NONCE_LEN {
            return Err(AppError::InvalidToken("nonce has wrong length".to_string()));
        }
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| AppError::InvalidToken("token failed authentication".to_string()))?;

        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| AppError::InvalidToken("payload is not UTF-8".to_string()))?;

        let (id_part, counter_part) = plaintext
            .split_once(':')
            .ok_or_else(|| AppError::InvalidToken("payload is malformed".to_string()))?;

        let ticket_id = Uuid::parse_str(id_part)
            .map_err(|_| AppError::InvalidToken("payload does not contain a ticket id".to_string()))?;
        let owner_counter: i32 = counter_part
            .parse()
            .map_err(|_| AppError::InvalidToken("payload does not contain a counter".to_string()))?;

        Ok((ticket_id, owner_counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QrCodec {
        QrCodec::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.encode(id, 3).unwrap();
        assert!(token.starts_with("bae:"));
        assert_eq!(codec.decode(&token).unwrap(), (id, 3));
    }

    #[test]
    fn test_nonce_is_drawn_from_bae_alphabet() {
        let codec = codec();
        let token = codec.encode(Uuid::new_v4(), 0).unwrap();
        let nonce = token.rsplit(':').next().unwrap();
        assert_eq!(nonce.len(), 12);
        assert!(nonce.chars().all(|c| matches!(c, 'b' | 'a' | 'e')));
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        let codec = codec();
        let token = codec.encode(Uuid::new_v4(), 0).unwrap();
        let bad = token.replacen("bae:", "foo:", 1);
        assert!(matches!(
            codec.decode(&bad),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_part_count() {
        let codec = codec();
        assert!(matches!(
            codec.decode("bae:onlytwo"),
            Err(AppError::InvalidToken(_))
        ));
        assert!(matches!(
            codec.decode("bae:a:b:c"),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_tampered_ciphertext() {
        let codec = codec();
        let token = codec.encode(Uuid::new_v4(), 1).unwrap();
        let parts: Vec<&str> = token.split(':').collect();
        let mut ciphertext = BASE64.decode(parts[1]).unwrap();
        ciphertext[0] ^= 0x01;
        let tampered = format!("bae:{}:{}", BASE64.encode(ciphertext), parts[2]);
        assert!(matches!(
            codec.decode(&tampered),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_key() {
        let token = codec().encode(Uuid::new_v4(), 1).unwrap();
        let other = QrCodec::new(&[8u8; 32]).unwrap();
        assert!(matches!(
            other.decode(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_counter_is_bound_into_token() {
        let codec = codec();
        let id = Uuid::new_v4();
        let old = codec.encode(id, 0).unwrap();
        let new = codec.encode(id, 1).unwrap();
        assert_ne!(old, new);
        assert_eq!(codec.decode(&old).unwrap().1, 0);
        assert_eq!(codec.decode(&new).unwrap().1, 1);
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(QrCodec::new(&[0u8; 16]).is_err());
    }
}
