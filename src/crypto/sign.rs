/*!
Ed25519 signatures over raw 32-byte keys.

The wire carries public keys as raw 32-byte strings and signatures as
raw 64-byte strings, so both operations work on plain slices.
Verification returns a boolean; callers map `false` to a single
signature-failure error kind with no discriminating detail.
*/

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::constants::sizes::ed25519;

/// Sign `msg` with a raw 32-byte Ed25519 seed
pub fn sign(seed: &[u8; ed25519::SECRET_KEY_BYTES], msg: &[u8]) -> [u8; ed25519::SIGNATURE_BYTES] {
    let key = SigningKey::from_bytes(seed);
    key.sign(msg).to_bytes()
}

/// Verify `sig` over `msg` under a raw 32-byte Ed25519 public key.
///
/// Any malformed key or signature verifies as `false`.
pub fn verify(public_key: &[u8], msg: &[u8], sig: &[u8]) -> bool {
    let Ok(pub_bytes) = <&[u8; ed25519::PUBLIC_KEY_BYTES]>::try_from(public_key) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(pub_bytes) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(sig) else {
        return false;
    };
    key.verify(msg, &signature).is_ok()
}
