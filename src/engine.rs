/*!
The connection engine: the two-message authenticated handshake and the
message phase behind it.

The client always speaks first. Each side signs the KEM values with its
long-lived identity key under a role-separated prefix, which binds the
identity to this exact exchange; verifying the peer's signature is the
only authentication step. On success both sides hold the same HKDF
derived AES-256-GCM key and expose the peer's fingerprint.

The engine is generic over [`FrameTransport`] and drives exactly one
channel. Any handshake failure is terminal for the engine; the caller
must discard the channel.
*/

use std::path::Path;

use crate::{
    constants::{HKDF_INFO_AES, HKDF_SALT, SIG_PREFIX_CLIENT, SIG_PREFIX_SERVER, sizes::aes, VERSION},
    crypto::{kdf::hkdf_sha256, kem::Kem},
    error::{protocol_err, Error, Result},
    identity::{self, Identity},
    session::Session,
    transport::FrameTransport,
    wire::{self, HandshakeHello, HandshakeResponse},
};

/// Handshake progress for one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No handshake attempted yet
    Idle,
    /// Waiting on the peer's handshake message
    AwaitingPeerMessage,
    /// Peer verified, deriving the session key
    Deriving,
    /// Session established; messages may flow
    Ready,
    /// Handshake failed; the engine and channel are dead
    Failed,
}

/// Role-separated signature input: prefix || a || b
fn sig_input(prefix: &[u8], a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + a.len() + b.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// HKDF the KEM shared secret down to the 32-byte session key
fn derive_session_key(shared_secret: &[u8]) -> Result<[u8; aes::KEY_SIZE]> {
    let okm = hkdf_sha256(shared_secret, HKDF_SALT, HKDF_INFO_AES, aes::KEY_SIZE)?;
    okm.as_slice()
        .try_into()
        .map_err(|_| Error::Crypto("session key derivation returned wrong length".into()))
}

/// One endpoint's engine: identity, handshake state, and session
pub struct ConnectionEngine {
    identity: Identity,
    state: HandshakeState,
    session: Option<Session>,
    peer_fingerprint: Option<String>,
}

impl ConnectionEngine {
    /// Build an engine around an already-loaded identity
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            state: HandshakeState::Idle,
            session: None,
            peer_fingerprint: None,
        }
    }

    /// Load the identity profile at `path`, creating it if missing, and
    /// build an engine around it. Returns the engine and whether the
    /// profile was freshly created.
    pub fn with_profile(path: &Path, password: &str) -> Result<(Self, bool)> {
        let (identity, created) = identity::load_or_create(path, password)?;
        Ok((Self::new(identity), created))
    }

    /// The local identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current handshake state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the session is established
    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// The peer's fingerprint, available once the handshake succeeded
    pub fn peer_fingerprint(&self) -> Option<&str> {
        self.peer_fingerprint.as_deref()
    }

    /// The established session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require_idle(&self) -> Result<()> {
        if self.state != HandshakeState::Idle {
            return protocol_err("handshake already attempted on this engine");
        }
        Ok(())
    }

    fn finish(&mut self, peer_pub: &[u8], key: [u8; aes::KEY_SIZE]) -> String {
        let fingerprint = identity::fingerprint_hex(peer_pub);
        self.session = Some(Session::new(key));
        self.peer_fingerprint = Some(fingerprint.clone());
        self.state = HandshakeState::Ready;
        log::info!(
            "session established, peer fingerprint {}",
            identity::short_fingerprint(&fingerprint)
        );
        fingerprint
    }

    /// Run the client role: send `HandshakeHello`, receive and verify
    /// `HandshakeResponse`, derive the session key.
    ///
    /// Returns the server's fingerprint. Any failure is terminal.
    pub fn run_client_handshake<T: FrameTransport>(&mut self, transport: &mut T) -> Result<String> {
        self.require_idle()?;
        match self.client_handshake_inner(transport) {
            Ok(fingerprint) => Ok(fingerprint),
            Err(e) => {
                self.state = HandshakeState::Failed;
                self.session = None;
                Err(e)
            }
        }
    }

    fn client_handshake_inner<T: FrameTransport>(&mut self, transport: &mut T) -> Result<String> {
        let kem_keypair = Kem::keypair();
        let kem_pub = kem_keypair.public_key_bytes().to_vec();

        let client_sig = self
            .identity
            .sign(&sig_input(SIG_PREFIX_CLIENT, &kem_pub, &[]));

        let hello = HandshakeHello {
            version: VERSION,
            kem_public_key: kem_pub.clone(),
            identity_pub: self.identity.public_key_bytes().to_vec(),
            identity_sig: client_sig.to_vec(),
        };
        transport.send_frame(&wire::encode(&hello))?;
        self.state = HandshakeState::AwaitingPeerMessage;

        let frame = transport.recv_frame()?;
        let resp: HandshakeResponse = wire::decode(&frame)?;

        let server_sig_input = sig_input(SIG_PREFIX_SERVER, &resp.kem_ciphertext, &kem_pub);
        if !identity::verify(&resp.identity_pub, &server_sig_input, &resp.identity_sig) {
            return Err(Error::SignatureVerify);
        }

        self.state = HandshakeState::Deriving;
        let shared_secret = Kem::decapsulate(&resp.kem_ciphertext, &kem_keypair)?;
        let key = derive_session_key(&shared_secret)?;

        Ok(self.finish(&resp.identity_pub, key))
    }

    /// Run the server role: receive and verify `HandshakeHello`, send
    /// `HandshakeResponse`, derive the session key.
    ///
    /// Returns the client's fingerprint. Any failure is terminal, and
    /// nothing is sent after a verification failure.
    pub fn run_server_handshake<T: FrameTransport>(&mut self, transport: &mut T) -> Result<String> {
        self.require_idle()?;
        match self.server_handshake_inner(transport) {
            Ok(fingerprint) => Ok(fingerprint),
            Err(e) => {
                self.state = HandshakeState::Failed;
                self.session = None;
                Err(e)
            }
        }
    }

    fn server_handshake_inner<T: FrameTransport>(&mut self, transport: &mut T) -> Result<String> {
        self.state = HandshakeState::AwaitingPeerMessage;
        let frame = transport.recv_frame()?;
        let hello: HandshakeHello = wire::decode(&frame)?;

        let client_sig_input = sig_input(SIG_PREFIX_CLIENT, &hello.kem_public_key, &[]);
        if !identity::verify(&hello.identity_pub, &client_sig_input, &hello.identity_sig) {
            return Err(Error::SignatureVerify);
        }

        let (kem_ciphertext, shared_secret) = Kem::encapsulate(&hello.kem_public_key)?;

        let server_sig = self.identity.sign(&sig_input(
            SIG_PREFIX_SERVER,
            &kem_ciphertext,
            &hello.kem_public_key,
        ));

        let resp = HandshakeResponse {
            version: VERSION,
            kem_ciphertext,
            identity_pub: self.identity.public_key_bytes().to_vec(),
            identity_sig: server_sig.to_vec(),
        };
        transport.send_frame(&wire::encode(&resp))?;

        self.state = HandshakeState::Deriving;
        let key = derive_session_key(&shared_secret)?;

        Ok(self.finish(&hello.identity_pub, key))
    }

    fn ready_session(&self) -> Result<&Session> {
        if self.state != HandshakeState::Ready {
            return protocol_err("session not ready");
        }
        self.session
            .as_ref()
            .ok_or_else(|| Error::Protocol("session not ready".into()))
    }

    /// Encrypt one application message into a ready-to-send frame
    pub fn encrypt_message(
        &self,
        plaintext: &[u8],
        sender_id: &str,
        to_username: &str,
    ) -> Result<Vec<u8>> {
        self.ready_session()?
            .encrypt_application(plaintext, sender_id, to_username)
    }

    /// Parse and decrypt one received frame.
    ///
    /// A failure here affects this frame only; the session stays usable.
    pub fn decrypt_message(&self, frame: &[u8]) -> Result<Vec<u8>> {
        self.ready_session()?.decrypt_application(frame)
    }
}
