/*!
Post-quantum key encapsulation using Kyber-512.

The handshake exchanges KEM values as opaque byte strings, so this
wrapper accepts and returns raw bytes and validates sizes at the
boundary. Decapsulation uses the scheme's implicit rejection: a
corrupted ciphertext yields a pseudo-random shared secret rather than
an error, and the mismatch is caught downstream by signature binding
or AEAD tag failure.
*/

use pqcrypto_kyber::kyber512;
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SharedSecret as _};
use zeroize::Zeroizing;

use crate::{
    constants::sizes::kyber,
    error::{crypto_err, Result},
};

/// A KEM keypair generated fresh for one handshake
pub struct KemKeypair {
    public_key: kyber512::PublicKey,
    secret_key: kyber512::SecretKey,
}

impl KemKeypair {
    /// The public key as raw bytes, ready for the wire
    pub fn public_key_bytes(&self) -> &[u8] {
        self.public_key.as_bytes()
    }
}

/// Kyber-512 KEM operations
pub struct Kem;

impl Kem {
    /// Generate a fresh Kyber keypair
    pub fn keypair() -> KemKeypair {
        let (public_key, secret_key) = kyber512::keypair();
        KemKeypair {
            public_key,
            secret_key,
        }
    }

    /// Encapsulate to a peer's public key, returning the ciphertext to
    /// send and the locally-known shared secret
    pub fn encapsulate(peer_pk: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
        let pk = kyber512::PublicKey::from_bytes(peer_pk)
            .map_err(|_| crate::error::Error::Crypto("peer KEM public key size mismatch".into()))?;
        let (shared_secret, ciphertext) = kyber512::encapsulate(&pk);
        Ok((
            ciphertext.as_bytes().to_vec(),
            Zeroizing::new(shared_secret.as_bytes().to_vec()),
        ))
    }

    /// Decapsulate a received ciphertext with our secret key
    pub fn decapsulate(ciphertext: &[u8], keypair: &KemKeypair) -> Result<Zeroizing<Vec<u8>>> {
        let ct = kyber512::Ciphertext::from_bytes(ciphertext)
            .map_err(|_| crate::error::Error::Crypto("KEM ciphertext size mismatch".into()))?;
        let shared_secret = kyber512::decapsulate(&ct, &keypair.secret_key);
        Ok(Zeroizing::new(shared_secret.as_bytes().to_vec()))
    }

    /// Assert the sizes the rest of the protocol assumes. Wrong-sized
    /// wire values never reach `encapsulate`/`decapsulate` internals.
    pub fn check_sizes() -> Result<()> {
        if kyber512::public_key_bytes() != kyber::PUBLIC_KEY_BYTES
            || kyber512::secret_key_bytes() != kyber::SECRET_KEY_BYTES
            || kyber512::ciphertext_bytes() != kyber::CIPHERTEXT_BYTES
            || kyber512::shared_secret_bytes() != kyber::SHARED_SECRET_BYTES
        {
            return crypto_err("Kyber512 parameter sizes do not match protocol constants");
        }
        Ok(())
    }
}
