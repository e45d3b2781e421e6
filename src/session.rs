/*!
The post-handshake session.

A `Session` holds the 32-byte AEAD key derived by the handshake and
turns application plaintext into `Envelope`-wrapped `ChatMessage`
frames and back. The key is zeroized when the session is dropped.
*/

use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::Zeroizing;

use crate::{
    constants::{sizes::aes, VERSION},
    crypto::aead::AeadCipher,
    error::Result,
    wire::{self, ChatMessage, Envelope},
};

/// Current wall clock in whole seconds; informational fields only
pub(crate) fn now_seconds() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(_) => 0,
    }
}

/// An established session bound to one channel
pub struct Session {
    key: Zeroizing<[u8; aes::KEY_SIZE]>,
    cipher: AeadCipher,
}

impl Session {
    /// Install a derived 32-byte session key
    pub fn new(key: [u8; aes::KEY_SIZE]) -> Self {
        let key = Zeroizing::new(key);
        let cipher = AeadCipher::new(&key);
        Self { key, cipher }
    }

    /// The raw session key; test-only access
    #[cfg(test)]
    pub(crate) fn key_bytes(&self) -> &[u8; aes::KEY_SIZE] {
        &self.key
    }

    /// Encrypt a plaintext into one ready-to-send frame.
    ///
    /// Draws a fresh random nonce, wraps the ciphertext in a
    /// `ChatMessage`, and the chat message in an `Envelope`.
    pub fn encrypt_application(
        &self,
        plaintext: &[u8],
        sender_id: &str,
        to_username: &str,
    ) -> Result<Vec<u8>> {
        let nonce = AeadCipher::random_nonce();
        let ct_tag = self.cipher.encrypt(plaintext, &nonce)?;

        let inner = ChatMessage {
            sender_id: sender_id.to_string(),
            timestamp_unix: now_seconds(),
            nonce: nonce.to_vec(),
            encrypted_content: ct_tag,
        };

        let envelope = Envelope {
            version: VERSION,
            to_username: to_username.to_string(),
            client_timestamp: now_seconds(),
            payload_e2e: wire::encode(&inner),
        };

        Ok(wire::encode(&envelope))
    }

    /// Parse and decrypt one received frame.
    ///
    /// The envelope's `version` and `to_username` are routing metadata
    /// and are not validated here. A failure affects this frame only;
    /// the session stays usable.
    pub fn decrypt_application(&self, frame: &[u8]) -> Result<Vec<u8>> {
        let envelope: Envelope = wire::decode(frame)?;
        let inner: ChatMessage = wire::decode(&envelope.payload_e2e)?;
        self.cipher.decrypt(&inner.encrypted_content, &inner.nonce)
    }
}
