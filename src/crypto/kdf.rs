/*!
Key derivation: HKDF-SHA-256 and PBKDF2-HMAC-SHA-256.

HKDF turns the KEM shared secret into the session key; PBKDF2 turns
the profile password into the identity-file encryption key.
*/

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    constants::sizes::aes,
    error::{crypto_err, Result},
};

/// RFC 5869 extract-and-expand with SHA-256
pub fn hkdf_sha256(ikm: &[u8], salt: &[u8], info: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let mut okm = vec![0u8; out_len];
    let hkdf = Hkdf::<Sha256>::new(Some(salt), ikm);
    hkdf.expand(info, &mut okm)
        .map_err(|e| crate::error::Error::Crypto(format!("HKDF derivation failed: {}", e)))?;
    Ok(okm)
}

/// Derive a 32-byte AES key from a password and salt
pub fn pbkdf2_sha256(
    password: &str,
    salt: &[u8],
    iters: u32,
) -> Result<Zeroizing<[u8; aes::KEY_SIZE]>> {
    if iters == 0 {
        return crypto_err("PBKDF2 iteration count must be nonzero");
    }
    let mut key = Zeroizing::new([0u8; aes::KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iters, key.as_mut_slice());
    Ok(key)
}
