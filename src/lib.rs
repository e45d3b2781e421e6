/*!
# E2EE Core

A peer-to-peer end-to-end encrypted messaging core. Two endpoints, each
holding a long-lived Ed25519 identity, establish a mutually
authenticated session over an untrusted byte-frame channel using a
post-quantum KEM (Kyber-512), then exchange AES-256-GCM encrypted
messages.

## Overview

This library provides:

- A password-protected on-disk identity store (PBKDF2 + AES-256-GCM)
- A two-message mutually authenticated KEM handshake with signature
  binding of both identities to the exchange
- An AEAD session layer wrapping application plaintext into
  relay-routable envelopes
- Trust-on-first-use fingerprint pinning for relayed peers

Transports are external: the engine is generic over a pair of blocking
frame operations and assumes only in-order, reliable delivery of opaque
byte frames.

## Example

```rust
use e2ee_core::{ConnectionEngine, Identity, Result};
use e2ee_core::transport::{memory_pair, FrameTransport};

fn main() -> Result<()> {
    let (mut client_channel, mut server_channel) = memory_pair();
    let mut client = ConnectionEngine::new(Identity::generate());
    let mut server = ConnectionEngine::new(Identity::generate());

    // Each side drives its end of the channel; the client speaks first.
    let server_side = std::thread::spawn(move || -> Result<Vec<u8>> {
        server.run_server_handshake(&mut server_channel)?;
        let frame = server_channel.recv_frame()?;
        server.decrypt_message(&frame)
    });

    let server_fingerprint = client.run_client_handshake(&mut client_channel)?;
    assert_eq!(server_fingerprint.len(), 64);

    let frame = client.encrypt_message(b"hello loopback", "alice", "bob")?;
    client_channel.send_frame(&frame)?;

    let plaintext = server_side.join().unwrap()?;
    assert_eq!(plaintext, b"hello loopback");
    Ok(())
}
```
*/

// Public modules
pub mod constants;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod identity;
pub mod pins;
pub mod session;
pub mod transport;
pub mod wire;

// Re-export commonly used types for convenience
pub use engine::{ConnectionEngine, HandshakeState};
pub use error::{Error, Result};
pub use identity::{fingerprint_hex, short_fingerprint, Identity};
pub use pins::{PinOutcome, PinStore};
pub use session::Session;
pub use transport::FrameTransport;

// Export protocol version
/// The current version of the protocol
pub use constants::VERSION;
