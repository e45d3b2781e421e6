/*!
The long-lived signing identity and its password-protected on-disk form.

File format (binary, big-endian lengths):

```text
magic[8] = "E2EEID01"
u32 version = 1
u32 pbkdf2_iters
u32 salt_len (16)  + salt
u32 nonce_len (12) + nonce
u32 pub_len (32)   + Ed25519 public key
u32 ct_len         + ct||tag  (GCM tag appended)
```

The private seed is encrypted with AES-256-GCM under a PBKDF2-derived
key, so a wrong password and a tampered file fail the same way: the
GCM tag does not verify.
*/

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{
    constants::{profile, sizes::aes, sizes::ed25519},
    crypto::{aead::AeadCipher, kdf::pbkdf2_sha256, sign},
    error::{identity_err, Error, Result},
};

/// A long-lived Ed25519 signing identity.
///
/// The private seed lives inside the `SigningKey`, which zeroizes it on
/// drop. It never leaves memory in cleartext except inside the
/// AEAD-encrypted blob written by [`create_profile`].
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a fresh identity without touching the filesystem
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    fn from_seed(seed: [u8; ed25519::SECRET_KEY_BYTES]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// The raw 32-byte Ed25519 public key
    pub fn public_key_bytes(&self) -> [u8; ed25519::PUBLIC_KEY_BYTES] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign `msg` with the identity's private key
    pub fn sign(&self, msg: &[u8]) -> [u8; ed25519::SIGNATURE_BYTES] {
        sign::sign(&self.signing_key.to_bytes(), msg)
    }

    /// Hex fingerprint of this identity's public key
    pub fn fingerprint(&self) -> String {
        fingerprint_hex(&self.public_key_bytes())
    }
}

/// Verify `sig` over `msg` under a raw 32-byte public key
pub fn verify(public_key: &[u8], msg: &[u8], sig: &[u8]) -> bool {
    sign::verify(public_key, msg, sig)
}

/// SHA-256 of a raw signing public key, rendered as 64 lowercase hex chars
pub fn fingerprint_hex(public_key: &[u8]) -> String {
    hex::encode(Sha256::digest(public_key))
}

/// The 16-character prefix commonly shown to users
pub fn short_fingerprint(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(16)]
}

/// Generate a fresh identity and write it password-encrypted to `path`.
///
/// Fails if `path` already exists.
pub fn create_profile(path: &Path, password: &str) -> Result<Identity> {
    let identity = Identity::generate();

    let mut salt = [0u8; profile::SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let aes_key = pbkdf2_sha256(password, &salt, profile::PBKDF2_ITERS)?;

    let nonce = AeadCipher::random_nonce();
    let ct = AeadCipher::new(&aes_key).encrypt(&identity.signing_key.to_bytes(), &nonce)?;

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| Error::Identity(format!("create profile {}: {}", path.display(), e)))?;
    let mut w = BufWriter::new(file);

    w.write_all(profile::MAGIC)?;
    w.write_u32::<BigEndian>(profile::VERSION)?;
    w.write_u32::<BigEndian>(profile::PBKDF2_ITERS)?;

    w.write_u32::<BigEndian>(salt.len() as u32)?;
    w.write_all(&salt)?;

    w.write_u32::<BigEndian>(nonce.len() as u32)?;
    w.write_all(&nonce)?;

    let pub_bytes = identity.public_key_bytes();
    w.write_u32::<BigEndian>(pub_bytes.len() as u32)?;
    w.write_all(&pub_bytes)?;

    w.write_u32::<BigEndian>(ct.len() as u32)?;
    w.write_all(&ct)?;
    w.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(identity)
}

/// Read and decrypt an identity file.
///
/// Rejects unknown magic or version and out-of-bounds field lengths.
/// A GCM tag failure on the private-key blob returns
/// [`Error::IdentityAuth`], covering both a wrong password and a
/// tampered file.
pub fn load_profile(path: &Path, password: &str) -> Result<Identity> {
    let file = File::open(path)
        .map_err(|e| Error::Identity(format!("open profile {}: {}", path.display(), e)))?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 8];
    r.read_exact(&mut magic)?;
    if &magic != profile::MAGIC {
        return identity_err("bad magic");
    }
    let version = r.read_u32::<BigEndian>()?;
    if version != profile::VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let iters = r.read_u32::<BigEndian>()?;

    let salt_len = r.read_u32::<BigEndian>()? as usize;
    if salt_len == 0 || salt_len > profile::MAX_SALT_LEN {
        return identity_err("profile corrupt (salt)");
    }
    let mut salt = vec![0u8; salt_len];
    r.read_exact(&mut salt)?;

    let nonce_len = r.read_u32::<BigEndian>()? as usize;
    if nonce_len != aes::NONCE_SIZE {
        return identity_err("profile corrupt (nonce)");
    }
    let mut nonce = vec![0u8; nonce_len];
    r.read_exact(&mut nonce)?;

    let pub_len = r.read_u32::<BigEndian>()? as usize;
    if pub_len != ed25519::PUBLIC_KEY_BYTES {
        return identity_err("profile corrupt (pub)");
    }
    let mut pub_bytes = [0u8; ed25519::PUBLIC_KEY_BYTES];
    r.read_exact(&mut pub_bytes)?;

    let ct_len = r.read_u32::<BigEndian>()? as usize;
    if ct_len < aes::TAG_SIZE || ct_len > profile::MAX_CT_LEN {
        return identity_err("profile corrupt (ct)");
    }
    let mut ct = vec![0u8; ct_len];
    r.read_exact(&mut ct)?;

    let aes_key = pbkdf2_sha256(password, &salt, iters)?;
    let seed_bytes = AeadCipher::new(&aes_key)
        .decrypt(&ct, &nonce)
        .map_err(|_| Error::IdentityAuth)?;
    let seed: [u8; ed25519::SECRET_KEY_BYTES] = seed_bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::Identity("profile corrupt (seed length)".into()))?;

    // A public key that does not match the decrypted seed means the
    // plaintext fields were edited; treat it like any other tampering.
    let identity = Identity::from_seed(seed);
    if identity.public_key_bytes() != pub_bytes {
        return Err(Error::IdentityAuth);
    }
    Ok(identity)
}

/// Load the identity at `path`, or create it if the file is missing.
///
/// Returns the identity and whether it was freshly created.
pub fn load_or_create(path: &Path, password: &str) -> Result<(Identity, bool)> {
    if path.exists() {
        Ok((load_profile(path, password)?, false))
    } else {
        Ok((create_profile(path, password)?, true))
    }
}
