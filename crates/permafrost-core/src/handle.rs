use std::fmt;

use serde::de::{Deserializer, Error as DeError, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Content-derived 64-bit identity of a description. The archive's primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(u64);

/// An opaque 64-bit object token.
///
/// A handle occupies one of three spaces over an object's lifetime: the
/// application space (tokens passed to `record_*`, meaningful only to the
/// driver that produced them), the archive space (frozen descriptions carry
/// referent fingerprints encoded as handles), and the driver space (handles
/// returned by a creator at replay). The type does not distinguish the
/// spaces; the recorder and replayer keep them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Fingerprint {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Encode this fingerprint as an archive-space handle.
    pub fn as_handle(self) -> Handle {
        Handle(self.0)
    }
}

impl Handle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn null() -> Self {
        Self(0)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Reinterpret an archive-space handle as the fingerprint it encodes.
    pub fn as_fingerprint(self) -> Fingerprint {
        Fingerprint(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

// Both types serialize as 16-digit uppercase hex strings, the key and
// reference encoding used throughout the archive format.

fn parse_hex64<E: DeError>(value: &str) -> Result<u64, E> {
    if value.len() != 16 {
        return Err(E::custom(format!(
            "expected 16 hex digits, got {:?}",
            value
        )));
    }
    u64::from_str_radix(value, 16)
        .map_err(|_| E::custom(format!("invalid hex value {:?}", value)))
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:016X}", self.0))
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Fingerprint;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 16-digit hex string")
            }

            fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
                parse_hex64(value).map(Fingerprint)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:016X}", self.0))
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Handle;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 16-digit hex string")
            }

            fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
                parse_hex64(value).map(Handle)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_displays_as_padded_hex() {
        assert_eq!(Fingerprint::new(0xAB).to_string(), "00000000000000AB");
        assert_eq!(
            Fingerprint::new(u64::MAX).to_string(),
            "FFFFFFFFFFFFFFFF"
        );
    }

    #[test]
    fn handle_hex_round_trip() {
        let handle = Handle::new(0x0123_4567_89AB_CDEF);
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"0123456789ABCDEF\"");
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn short_hex_is_rejected() {
        assert!(serde_json::from_str::<Handle>("\"AB\"").is_err());
    }

    #[test]
    fn null_handle() {
        assert!(Handle::null().is_null());
        assert!(!Handle::new(1).is_null());
    }
}
