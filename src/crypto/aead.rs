/*!
AES-256-GCM authenticated encryption.

Fixed sizes throughout: 32-byte key, 12-byte nonce, 16-byte tag, no
additional authenticated data. Encryption appends the tag to the
ciphertext; decryption expects it there. The caller owns nonce
selection.
*/

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::{
    constants::sizes::aes,
    error::{crypto_err, Result},
};

/// AES-256-GCM cipher bound to one key
pub struct AeadCipher {
    cipher: Aes256Gcm,
}

impl AeadCipher {
    /// Create a cipher from a 32-byte key
    pub fn new(key: &[u8; aes::KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Encrypt `plaintext` under `nonce`, returning ciphertext with the
    /// 16-byte tag appended. The output is `plaintext.len() + 16` bytes.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
        if nonce.len() != aes::NONCE_SIZE {
            return crypto_err("nonce must be 12 bytes");
        }
        self.cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| crate::error::Error::Crypto("encryption failed".into()))
    }

    /// Decrypt `ciphertext_and_tag` under `nonce`.
    ///
    /// Wrong key, wrong nonce, and tampered ciphertext all fail with the
    /// same opaque error kind.
    pub fn decrypt(&self, ciphertext_and_tag: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
        if nonce.len() != aes::NONCE_SIZE {
            return crypto_err("nonce must be 12 bytes");
        }
        if ciphertext_and_tag.len() < aes::TAG_SIZE {
            return crypto_err("input too short");
        }
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext_and_tag)
            .map_err(|_| crate::error::Error::Crypto("decryption failed".into()))
    }

    /// Draw a fresh random 12-byte nonce from the system CSPRNG
    pub fn random_nonce() -> [u8; aes::NONCE_SIZE] {
        let mut nonce = [0u8; aes::NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}
