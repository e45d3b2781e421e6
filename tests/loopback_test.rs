//! End-to-end scenarios over in-memory channels: the full loopback
//! round-trip, every tampered-handshake case, channel loss, and the
//! TOFU pinning flow.

use std::collections::VecDeque;
use std::thread;

use e2ee_core::{
    constants::SIG_PREFIX_SERVER,
    crypto::Kem,
    transport::{memory_pair, FrameTransport, MemoryTransport},
    wire::{self, HandshakeHello, HandshakeResponse},
    ConnectionEngine, Error, Identity, PinOutcome, PinStore, Result,
};

/// A transport scripted from pre-recorded frames; records what the
/// engine tries to send.
struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
}

impl ScriptedTransport {
    fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            incoming: frames.into(),
            sent: Vec::new(),
        }
    }
}

impl FrameTransport for ScriptedTransport {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Vec<u8>> {
        self.incoming
            .pop_front()
            .ok_or_else(|| Error::Transport("script exhausted".into()))
    }
}

fn loopback_engines() -> (ConnectionEngine, ConnectionEngine, MemoryTransport, MemoryTransport) {
    let (ct, st) = memory_pair();
    (
        ConnectionEngine::new(Identity::generate()),
        ConnectionEngine::new(Identity::generate()),
        ct,
        st,
    )
}

/// Capture the HandshakeHello a real client emits, then fail its
/// channel so the thread unwinds cleanly.
fn capture_client_hello() -> HandshakeHello {
    let mut client = ConnectionEngine::new(Identity::generate());
    let (mut ct, mut harness) = memory_pair();

    let client_side = thread::spawn(move || client.run_client_handshake(&mut ct));
    let frame = harness.recv_frame().unwrap();
    drop(harness);
    assert!(client_side.join().unwrap().is_err());

    wire::decode(&frame).unwrap()
}

#[test]
fn test_loopback_round_trip() {
    let (mut client, mut server, mut ct, mut st) = loopback_engines();

    let client_fp = client.identity().fingerprint();
    let server_fp = server.identity().fingerprint();

    let server_side = thread::spawn(move || -> Result<(ConnectionEngine, String, Vec<u8>)> {
        let peer = server.run_server_handshake(&mut st)?;
        let frame = st.recv_frame()?;
        let plain = server.decrypt_message(&frame)?;
        Ok((server, peer, plain))
    });

    let observed_server_fp = client.run_client_handshake(&mut ct).unwrap();
    let frame = client
        .encrypt_message(b"hello loopback", "alice", "bob")
        .unwrap();
    ct.send_frame(&frame).unwrap();

    let (server, observed_client_fp, plain) = server_side.join().unwrap().unwrap();

    assert_eq!(plain, b"hello loopback");
    assert_eq!(observed_server_fp, server_fp);
    assert_eq!(observed_client_fp, client_fp);
    assert_eq!(client.peer_fingerprint(), Some(server_fp.as_str()));
    assert_eq!(server.peer_fingerprint(), Some(client_fp.as_str()));
}

#[test]
fn test_tampered_kem_public_key_rejected_silently() {
    let mut hello = capture_client_hello();
    hello.kem_public_key[100] ^= 0x01;

    let mut server = ConnectionEngine::new(Identity::generate());
    let mut transport = ScriptedTransport::new(vec![wire::encode(&hello)]);

    let result = server.run_server_handshake(&mut transport);
    assert!(matches!(result, Err(Error::SignatureVerify)));
    assert!(transport.sent.is_empty(), "server must send nothing");
}

#[test]
fn test_tampered_client_signature_rejected() {
    let mut hello = capture_client_hello();
    hello.identity_sig[7] ^= 0x01;

    let mut server = ConnectionEngine::new(Identity::generate());
    let mut transport = ScriptedTransport::new(vec![wire::encode(&hello)]);

    assert!(matches!(
        server.run_server_handshake(&mut transport),
        Err(Error::SignatureVerify)
    ));
    assert!(transport.sent.is_empty());
}

#[test]
fn test_substituted_client_identity_rejected() {
    let mut hello = capture_client_hello();
    hello.identity_pub = Identity::generate().public_key_bytes().to_vec();

    let mut server = ConnectionEngine::new(Identity::generate());
    let mut transport = ScriptedTransport::new(vec![wire::encode(&hello)]);

    assert!(matches!(
        server.run_server_handshake(&mut transport),
        Err(Error::SignatureVerify)
    ));
    assert!(transport.sent.is_empty());
}

/// Play the server role by hand, optionally corrupting the response
/// before it goes out, and return what the client made of it.
fn run_client_against_tampered_server(
    tamper: impl FnOnce(&mut HandshakeResponse),
) -> Result<String> {
    let mut client = ConnectionEngine::new(Identity::generate());
    let (mut ct, mut harness) = memory_pair();

    let client_side = thread::spawn(move || {
        let result = client.run_client_handshake(&mut ct);
        (client, result)
    });

    let server_identity = Identity::generate();
    let hello: HandshakeHello = wire::decode(&harness.recv_frame().unwrap()).unwrap();

    let (kem_ciphertext, _shared_secret) = Kem::encapsulate(&hello.kem_public_key).unwrap();
    let mut sig_input = SIG_PREFIX_SERVER.to_vec();
    sig_input.extend_from_slice(&kem_ciphertext);
    sig_input.extend_from_slice(&hello.kem_public_key);

    let mut resp = HandshakeResponse {
        version: 1,
        kem_ciphertext,
        identity_pub: server_identity.public_key_bytes().to_vec(),
        identity_sig: server_identity.sign(&sig_input).to_vec(),
    };
    tamper(&mut resp);
    harness.send_frame(&wire::encode(&resp)).unwrap();

    let (_client, result) = client_side.join().unwrap();
    result
}

#[test]
fn test_honest_manual_server_accepted() {
    // Control case: the hand-rolled server above is a valid peer.
    let result = run_client_against_tampered_server(|_| {});
    assert_eq!(result.unwrap().len(), 64);
}

#[test]
fn test_tampered_kem_ciphertext_rejected() {
    let result = run_client_against_tampered_server(|resp| {
        resp.kem_ciphertext[5] ^= 0x01;
    });
    assert!(matches!(result, Err(Error::SignatureVerify)));
}

#[test]
fn test_tampered_server_signature_rejected() {
    let result = run_client_against_tampered_server(|resp| {
        resp.identity_sig[20] ^= 0x01;
    });
    assert!(matches!(result, Err(Error::SignatureVerify)));
}

#[test]
fn test_substituted_server_identity_rejected() {
    let result = run_client_against_tampered_server(|resp| {
        resp.identity_pub = Identity::generate().public_key_bytes().to_vec();
    });
    assert!(matches!(result, Err(Error::SignatureVerify)));
}

#[test]
fn test_channel_close_mid_handshake() {
    let mut client = ConnectionEngine::new(Identity::generate());
    let (mut ct, harness) = memory_pair();

    // The peer vanishes after the hello goes out, before any response.
    drop(harness);
    let result = client.run_client_handshake(&mut ct);
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[test]
fn test_garbage_frame_leaves_session_usable() {
    let (mut client, mut server, mut ct, mut st) = loopback_engines();

    let server_side = thread::spawn(move || {
        server.run_server_handshake(&mut st).unwrap();
        (server, st)
    });
    client.run_client_handshake(&mut ct).unwrap();
    let (server, mut st) = server_side.join().unwrap();

    // A relay injects noise: parse failure for that frame only.
    assert!(matches!(
        server.decrypt_message(&[0xFFu8; 41]),
        Err(Error::Parse(_))
    ));

    let frame = client.encrypt_message(b"still alive", "alice", "bob").unwrap();
    ct.send_frame(&frame).unwrap();
    let frame = st.recv_frame().unwrap();
    assert_eq!(server.decrypt_message(&frame).unwrap(), b"still alive");
}

#[test]
fn test_tofu_pin_flow() {
    let dir = tempfile::tempdir().unwrap();
    let pins = PinStore::new(dir.path().join("pins.txt"));

    // First connect: handshake succeeds, fingerprint gets pinned.
    let (mut client, mut server, mut ct, mut st) = loopback_engines();
    let server_side = thread::spawn(move || server.run_server_handshake(&mut st).unwrap());
    let first_fp = client.run_client_handshake(&mut ct).unwrap();
    server_side.join().unwrap();
    assert_eq!(
        pins.check_and_pin("127.0.0.1:8080", "alice", &first_fp).unwrap(),
        PinOutcome::Pinned
    );

    // Second connect: a different peer answers in the same room.
    let (mut client, mut imposter, mut ct, mut st) = loopback_engines();
    let server_side = thread::spawn(move || imposter.run_server_handshake(&mut st).unwrap());
    let second_fp = client.run_client_handshake(&mut ct).unwrap();
    server_side.join().unwrap();

    assert_ne!(first_fp, second_fp);
    let before = std::fs::read_to_string(pins.path()).unwrap();
    assert!(matches!(
        pins.check_and_pin("127.0.0.1:8080", "alice", &second_fp),
        Err(Error::PinMismatch { .. })
    ));
    assert_eq!(std::fs::read_to_string(pins.path()).unwrap(), before);
}
