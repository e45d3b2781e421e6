/*!
Constants for the E2EE messaging core.

This module contains the protocol version, fixed sizes for every
primitive, the domain-separation strings, and the identity-file
parameters. The byte-string literals are part of the wire protocol and
must not be altered.
*/

/// Protocol version carried in handshake records and envelopes
pub const VERSION: u32 = 1;

/// Size constants for the protocol
pub mod sizes {
    /// AES-256-GCM constants
    pub mod aes {
        /// Size of the AES-256 key in bytes
        pub const KEY_SIZE: usize = 32;

        /// Size of the GCM nonce in bytes
        pub const NONCE_SIZE: usize = 12;

        /// Size of the GCM authentication tag in bytes
        pub const TAG_SIZE: usize = 16;
    }

    /// CRYSTALS-Kyber (Kyber512) constants
    pub mod kyber {
        /// Size of Kyber public key in bytes
        pub const PUBLIC_KEY_BYTES: usize = 800;

        /// Size of Kyber secret key in bytes
        pub const SECRET_KEY_BYTES: usize = 1632;

        /// Size of Kyber ciphertext in bytes
        pub const CIPHERTEXT_BYTES: usize = 768;

        /// Size of Kyber shared secret in bytes
        pub const SHARED_SECRET_BYTES: usize = 32;
    }

    /// Ed25519 constants
    pub mod ed25519 {
        /// Size of an Ed25519 public key in bytes
        pub const PUBLIC_KEY_BYTES: usize = 32;

        /// Size of an Ed25519 private seed in bytes
        pub const SECRET_KEY_BYTES: usize = 32;

        /// Size of an Ed25519 signature in bytes
        pub const SIGNATURE_BYTES: usize = 64;
    }
}

/// Salt for HKDF session-key derivation
pub const HKDF_SALT: &[u8] = b"E2EE-v1";

/// Info string for HKDF session-key derivation
pub const HKDF_INFO_AES: &[u8] = b"AES-256-GCM";

/// Domain-separation prefix for the client handshake signature
pub const SIG_PREFIX_CLIENT: &[u8] = b"E2EE-HANDSHAKE-v1|client|";

/// Domain-separation prefix for the server handshake signature
pub const SIG_PREFIX_SERVER: &[u8] = b"E2EE-HANDSHAKE-v1|server|";

/// Identity-file parameters
pub mod profile {
    /// File magic at offset zero
    pub const MAGIC: &[u8; 8] = b"E2EEID01";

    /// Identity-file format version
    pub const VERSION: u32 = 1;

    /// Canonical PBKDF2-HMAC-SHA-256 iteration count for new files
    pub const PBKDF2_ITERS: u32 = 200_000;

    /// Salt length drawn for new files
    pub const SALT_LEN: usize = 16;

    /// Largest salt length a reader accepts
    pub const MAX_SALT_LEN: usize = 1024;

    /// Largest private-key ciphertext a reader accepts
    pub const MAX_CT_LEN: usize = 4096;
}

/// Largest frame the length-prefixed adapter will read (16 MiB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
