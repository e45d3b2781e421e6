/*!
Trust-on-first-use fingerprint pinning for relayed peers.

Pins live in a plain text file, one record per line:

```text
<relay-host-with-port>#<room-name> <fingerprint-hex>
```

The store is append-only. The first successful handshake against a
(host, room) pair records the peer's fingerprint; every later connect
must present the same one. A mismatch aborts the connection and never
touches the file; re-pinning requires the user to delete the line.
*/

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{protocol_err, Error, Result};

/// Outcome of a successful pin check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// First contact: the fingerprint was recorded
    Pinned,
    /// The fingerprint matches the stored pin
    Matched,
}

/// Append-only pin file keyed by `(relay host, room)`
pub struct PinStore {
    path: PathBuf,
}

fn pin_key(host: &str, room: &str) -> String {
    format!("{}#{}", host, room)
}

fn valid_fingerprint(fingerprint: &str) -> bool {
    fingerprint.len() == 64
        && fingerprint
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

impl PinStore {
    /// Open a pin store backed by `path`; the file need not exist yet
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the pinned fingerprint for a (host, room) pair.
    ///
    /// A missing file means no pins at all. Malformed lines are skipped.
    pub fn lookup(&self, host: &str, room: &str) -> Result<Option<String>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let key = pin_key(host, room);
        for line in BufReader::new(file).lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(k), Some(v)) if k == key && valid_fingerprint(v) => {
                    return Ok(Some(v.to_string()));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Check an observed fingerprint against the store, pinning it on
    /// first contact.
    ///
    /// Returns [`PinOutcome::Pinned`] when no pin existed,
    /// [`PinOutcome::Matched`] on equality, and a pin-mismatch error on
    /// difference. The store is never mutated on mismatch.
    pub fn check_and_pin(&self, host: &str, room: &str, fingerprint: &str) -> Result<PinOutcome> {
        if !valid_fingerprint(fingerprint) {
            return protocol_err("fingerprint must be 64 lowercase hex characters");
        }
        match self.lookup(host, room)? {
            None => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                writeln!(file, "{} {}", pin_key(host, room), fingerprint)?;
                log::info!("pinned peer for {}#{}", host, room);
                Ok(PinOutcome::Pinned)
            }
            Some(pinned) if pinned == fingerprint => Ok(PinOutcome::Matched),
            Some(pinned) => {
                log::warn!(
                    "peer fingerprint changed for {}#{}; refusing to talk",
                    host,
                    room
                );
                Err(Error::PinMismatch {
                    pinned,
                    observed: fingerprint.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FP1: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const FP2: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn store(dir: &tempfile::TempDir) -> PinStore {
        PinStore::new(dir.path().join("pins.txt"))
    }

    #[test]
    fn test_first_contact_pins() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        assert_eq!(pins.lookup("127.0.0.1:8080", "alice").unwrap(), None);
        assert_eq!(
            pins.check_and_pin("127.0.0.1:8080", "alice", FP1).unwrap(),
            PinOutcome::Pinned
        );
        assert_eq!(
            pins.lookup("127.0.0.1:8080", "alice").unwrap().as_deref(),
            Some(FP1)
        );
    }

    #[test]
    fn test_repeat_connects_are_idempotent() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        pins.check_and_pin("relay:443", "room", FP1).unwrap();
        for _ in 0..3 {
            assert_eq!(
                pins.check_and_pin("relay:443", "room", FP1).unwrap(),
                PinOutcome::Matched
            );
        }

        let contents = std::fs::read_to_string(pins.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert_eq!(contents, format!("relay:443#room {}\n", FP1));
    }

    #[test]
    fn test_mismatch_aborts_without_mutation() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        pins.check_and_pin("127.0.0.1:8080", "alice", FP1).unwrap();
        let before = std::fs::read_to_string(pins.path()).unwrap();

        let result = pins.check_and_pin("127.0.0.1:8080", "alice", FP2);
        match result {
            Err(Error::PinMismatch { pinned, observed }) => {
                assert_eq!(pinned, FP1);
                assert_eq!(observed, FP2);
            }
            other => panic!("expected PinMismatch, got {:?}", other),
        }

        let after = std::fs::read_to_string(pins.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rooms_are_independent() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        pins.check_and_pin("relay:443", "alice", FP1).unwrap();
        assert_eq!(
            pins.check_and_pin("relay:443", "bob", FP2).unwrap(),
            PinOutcome::Pinned
        );
        assert_eq!(
            pins.check_and_pin("other:443", "alice", FP2).unwrap(),
            PinOutcome::Pinned
        );
    }

    #[test]
    fn test_invalid_fingerprints_rejected() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        assert!(pins.check_and_pin("relay:443", "room", "abc").is_err());
        let upper = FP1.to_uppercase();
        assert!(pins.check_and_pin("relay:443", "room", &upper).is_err());
        assert!(!pins.path().exists());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempdir().unwrap();
        let pins = store(&dir);

        std::fs::write(
            pins.path(),
            format!("not-a-record\nrelay:443#room {}\n", FP1),
        )
        .unwrap();
        assert_eq!(
            pins.lookup("relay", "443#room").unwrap(),
            None,
            "key parsing must not confuse separators"
        );
        assert_eq!(pins.lookup("relay:443", "room").unwrap().as_deref(), Some(FP1));
    }
}
