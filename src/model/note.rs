use std::time::{SystemTime, UNIX_EPOCH};

/// The context a note is attached to.
///
/// The wire format and the host both speak raw `u32` keys; inside the core
/// the "no specific quest" case is a distinct variant so a real quest id can
/// never collide with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    /// A concrete quest id from the host's world data.
    Quest(u32),
    /// The reserved general context ("no specific quest").
    General,
}

/// Raw key value that marks "invalid" in the host's key domain.
pub const INVALID_RAW_KEY: u32 = 0;

/// Raw key value the wire format uses for the general context.
pub const GENERAL_RAW_KEY: u32 = u32::MAX;

impl ContextKey {
    /// Decode a raw key from the host or the wire. `0` is the explicit
    /// invalid marker and has no `ContextKey` representation.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            INVALID_RAW_KEY => None,
            GENERAL_RAW_KEY => Some(ContextKey::General),
            id => Some(ContextKey::Quest(id)),
        }
    }

    /// Encode for the wire / host APIs.
    pub fn to_raw(self) -> u32 {
        match self {
            ContextKey::Quest(id) => id,
            ContextKey::General => GENERAL_RAW_KEY,
        }
    }

    /// The concrete quest id, if any.
    pub fn quest_id(self) -> Option<u32> {
        match self {
            ContextKey::Quest(id) => Some(id),
            ContextKey::General => None,
        }
    }
}

/// A single user-authored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Sanitized note body. Never empty while stored.
    pub text: String,
    /// Seconds since the Unix epoch at creation/last write. Opaque to the
    /// core: persisted and restored verbatim, never interpreted.
    pub timestamp: u64,
}

impl Note {
    pub fn new(text: String) -> Self {
        Self {
            text,
            timestamp: now_timestamp(),
        }
    }
}

/// Current wall-clock stamp for new notes.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Strip embedded NULs and truncate to `max_len` bytes on a char boundary.
pub fn sanitize_text(raw: &str, max_len: usize) -> String {
    let mut text: String = if raw.contains('\0') {
        raw.chars().filter(|&c| c != '\0').collect()
    } else {
        raw.to_string()
    };

    if text.len() > max_len {
        let mut cut = max_len;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_round_trip() {
        assert_eq!(ContextKey::from_raw(0), None);
        assert_eq!(ContextKey::from_raw(1001), Some(ContextKey::Quest(1001)));
        assert_eq!(ContextKey::from_raw(u32::MAX), Some(ContextKey::General));
        assert_eq!(ContextKey::General.to_raw(), u32::MAX);
        assert_eq!(ContextKey::Quest(7).to_raw(), 7);
    }

    #[test]
    fn sanitize_strips_nuls_and_truncates_on_boundary() {
        assert_eq!(sanitize_text("a\0b\0c", 64), "abc");

        // "éé" is 4 bytes; a 3-byte cap must not split the second char.
        assert_eq!(sanitize_text("éé", 3), "é");
        assert_eq!(sanitize_text("short", 64), "short");
    }
}
