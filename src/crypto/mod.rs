/*!
Cryptographic primitives for the E2EE messaging core.

This module provides the four primitives the protocol is built on:
AES-256-GCM authenticated encryption, the Kyber-512 key-encapsulation
mechanism, Ed25519 signatures over raw keys, and the HKDF/PBKDF2 key
derivation functions.
*/

pub mod aead;
pub mod kdf;
pub mod kem;
pub mod sign;

// Re-export commonly used items
pub use aead::AeadCipher;
pub use kdf::{hkdf_sha256, pbkdf2_sha256};
pub use kem::Kem;
