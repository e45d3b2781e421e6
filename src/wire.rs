/*!
Wire records for the handshake and message phases.

All four records are protobuf messages so that any implementation with
a compatible schema round-trips them; unknown fields are ignored on
decode. Field tags are fixed by the protocol and must not change.
*/

use prost::Message;

use crate::error::Result;

/// First handshake message, client to server
#[derive(Clone, PartialEq, Message)]
pub struct HandshakeHello {
    /// Protocol version, currently 1
    #[prost(uint32, tag = "1")]
    pub version: u32,
    /// The client's fresh KEM public key
    #[prost(bytes = "vec", tag = "2")]
    pub kem_public_key: Vec<u8>,
    /// The client's long-lived Ed25519 public key (32 bytes)
    #[prost(bytes = "vec", tag = "3")]
    pub identity_pub: Vec<u8>,
    /// Ed25519 signature binding the client identity to the KEM key (64 bytes)
    #[prost(bytes = "vec", tag = "4")]
    pub identity_sig: Vec<u8>,
}

/// Second handshake message, server to client
#[derive(Clone, PartialEq, Message)]
pub struct HandshakeResponse {
    /// Protocol version, currently 1
    #[prost(uint32, tag = "1")]
    pub version: u32,
    /// KEM ciphertext encapsulated to the client's KEM public key
    #[prost(bytes = "vec", tag = "2")]
    pub kem_ciphertext: Vec<u8>,
    /// The server's long-lived Ed25519 public key (32 bytes)
    #[prost(bytes = "vec", tag = "3")]
    pub identity_pub: Vec<u8>,
    /// Ed25519 signature binding the server identity to the exchange (64 bytes)
    #[prost(bytes = "vec", tag = "4")]
    pub identity_sig: Vec<u8>,
}

/// Encrypted application message, opaque to anyone without the session key
#[derive(Clone, PartialEq, Message)]
pub struct ChatMessage {
    /// Sender identifier chosen by the sending application
    #[prost(string, tag = "1")]
    pub sender_id: String,
    /// Sender clock in whole seconds, informational only
    #[prost(int64, tag = "2")]
    pub timestamp_unix: i64,
    /// The 12-byte AEAD nonce for this message
    #[prost(bytes = "vec", tag = "3")]
    pub nonce: Vec<u8>,
    /// AES-256-GCM ciphertext with the 16-byte tag appended
    #[prost(bytes = "vec", tag = "4")]
    pub encrypted_content: Vec<u8>,
}

/// Outer routing envelope, intentionally readable by relays
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    /// Protocol version, currently 1
    #[prost(uint32, tag = "1")]
    pub version: u32,
    /// Recipient hint for relay routing; not authenticated
    #[prost(string, tag = "2")]
    pub to_username: String,
    /// Sender clock in whole seconds, informational only
    #[prost(int64, tag = "3")]
    pub client_timestamp: i64,
    /// Serialized `ChatMessage`
    #[prost(bytes = "vec", tag = "4")]
    pub payload_e2e: Vec<u8>,
}

/// Serialize a wire record to bytes
pub fn encode<M: Message>(msg: &M) -> Vec<u8> {
    msg.encode_to_vec()
}

/// Parse a wire record from bytes
pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M> {
    Ok(M::decode(bytes)?)
}
