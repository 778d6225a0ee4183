//! Persistence protocol over the host's save-state record stream.
//!
//! One record kind, little-endian payload:
//!
//! ```text
//! entryCount: u32
//! entryCount × { contextKey: u32, textLen: u32, textBytes: [u8], timestamp: u64 }
//! ```
//!
//! Kind tag and version live in the host's generic record header. Decoding
//! is per-entry: a malformed entry is skipped and counted, not fatal, so a
//! corrupted entry loses itself and nothing else.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::host::{CosaveRead, CosaveWrite};
use crate::model::note::{ContextKey, Note};
use crate::model::store::NoteStore;

/// Record kind tag in the host's save-state stream.
pub const RECORD_KIND: [u8; 4] = *b"QNTS";

/// Current wire version.
pub const CURRENT_VERSION: u32 = 2;

/// The v1 layout predates the tagged key domain and is incompatible.
const LEGACY_VERSION: u32 = 1;

/// Hard cap on a wire text length. The writer never exceeds the configured
/// maximum (at most 4096 after clamping), so anything above this is a
/// corrupted or foreign length field.
const MAX_WIRE_TEXT_LEN: u32 = 4096;

#[derive(Debug, Error)]
enum EntryError {
    #[error("record ended early")]
    ShortRead,
    #[error("text length {0} exceeds the wire maximum")]
    OversizedText(u32),
    #[error("entry carries the invalid context key 0")]
    InvalidKey,
    #[error("text bytes are not valid UTF-8")]
    MalformedText,
    #[error("entry carries empty text")]
    EmptyText,
}

impl EntryError {
    /// Whether the stream cursor is still positioned at the next entry
    /// after this failure. A short read loses the framing for good.
    fn is_aligned(&self) -> bool {
        !matches!(self, EntryError::ShortRead)
    }
}

/// Serializes the note store into the host's save stream and restores it,
/// one record per save cycle.
pub struct CosaveProtocol {
    store: Arc<NoteStore>,
}

impl CosaveProtocol {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    /// Write the current store snapshot as one record. A mid-stream write
    /// failure aborts the remaining writes and is logged; it never
    /// propagates to the host. The load side detects the short record
    /// per entry.
    pub fn save(&self, out: &mut dyn CosaveWrite) {
        let snapshot = self.store.snapshot();

        let result = (|| -> Result<()> {
            out.open_record(RECORD_KIND, CURRENT_VERSION)?;
            out.write_bytes(&(snapshot.len() as u32).to_le_bytes())?;

            for (key, note) in &snapshot {
                out.write_bytes(&key.to_raw().to_le_bytes())?;
                out.write_bytes(&(note.text.len() as u32).to_le_bytes())?;
                out.write_bytes(note.text.as_bytes())?;
                out.write_bytes(&note.timestamp.to_le_bytes())?;
            }

            Ok(())
        })();

        match result {
            Ok(()) => tracing::info!(entries = snapshot.len(), "note record written"),
            Err(err) => tracing::error!("note record write aborted: {err:#}"),
        }
    }

    /// Restore from the host's record iteration. Foreign record kinds are
    /// skipped untouched; version dispatch is explicit below.
    pub fn load(&self, input: &mut dyn CosaveRead) {
        loop {
            let header = match input.next_record() {
                Ok(Some(header)) => header,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!("record iteration failed, stopping restore: {err:#}");
                    break;
                }
            };

            if header.kind != RECORD_KIND {
                self.skip_record(input, header.length, "foreign record kind");
                continue;
            }

            match header.version {
                // Intentional clean break: v1 is known-incompatible and is
                // never partially interpreted.
                LEGACY_VERSION => {
                    tracing::warn!(
                        "note record uses legacy version 1; incompatible by design, skipping"
                    );
                    self.skip_record(input, header.length, "legacy version");
                }
                CURRENT_VERSION => self.load_current(input),
                other => {
                    tracing::warn!(version = other, "unsupported note record version, skipping");
                    self.skip_record(input, header.length, "unsupported version");
                }
            }
        }
    }

    /// Host new-session signal: notes never carry across unrelated
    /// sessions.
    pub fn revert(&self) {
        self.store.clear();
        tracing::info!("note store cleared for new session");
    }

    fn skip_record(&self, input: &mut dyn CosaveRead, length: u32, why: &str) {
        if let Err(err) = input.skip_bytes(length) {
            tracing::warn!("failed to skip record ({why}): {err:#}");
        }
    }

    fn load_current(&self, input: &mut dyn CosaveRead) {
        let count = match read_u32(input) {
            Ok(count) => count,
            Err(_) => {
                tracing::warn!("note record too short for entry count, nothing restored");
                return;
            }
        };

        let mut entries: Vec<(ContextKey, Note)> = Vec::new();
        let mut failed: u32 = 0;

        for index in 0..count {
            match decode_entry(input) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    failed += 1;
                    tracing::warn!(entry = index, "skipping note entry: {err}");
                    if !err.is_aligned() {
                        // Lost framing: everything after this entry is gone.
                        failed += count - index - 1;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            restored = entries.len(),
            failed,
            "note record restored"
        );
        self.store.replace_all(entries);
    }
}

fn read_exact(input: &mut dyn CosaveRead, buf: &mut [u8]) -> Result<(), EntryError> {
    let mut filled = 0;
    while filled < buf.len() {
        let got = input
            .read_bytes(&mut buf[filled..])
            .map_err(|_| EntryError::ShortRead)?;
        if got == 0 {
            return Err(EntryError::ShortRead);
        }
        filled += got;
    }
    Ok(())
}

fn read_u32(input: &mut dyn CosaveRead) -> Result<u32, EntryError> {
    let mut buf = [0u8; 4];
    read_exact(input, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(input: &mut dyn CosaveRead) -> Result<u64, EntryError> {
    let mut buf = [0u8; 8];
    read_exact(input, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Decode one entry. When the entry is well-framed but invalid, its bytes
/// are consumed so the cursor stays aligned for the next entry; only a
/// short read leaves the stream unusable.
fn decode_entry(input: &mut dyn CosaveRead) -> Result<(ContextKey, Note), EntryError> {
    let raw_key = read_u32(input)?;
    let text_len = read_u32(input)?;

    if text_len > MAX_WIRE_TEXT_LEN {
        // The length itself is untrusted here, but consuming the declared
        // span is the only way to reach the next entry; a lying length
        // surfaces as a short read on the following fields.
        input
            .skip_bytes(text_len)
            .map_err(|_| EntryError::ShortRead)?;
        let _ = read_u64(input)?;
        return Err(EntryError::OversizedText(text_len));
    }

    let mut text_buf = vec![0u8; text_len as usize];
    read_exact(input, &mut text_buf)?;
    let timestamp = read_u64(input)?;

    let Some(key) = ContextKey::from_raw(raw_key) else {
        return Err(EntryError::InvalidKey);
    };
    let text = String::from_utf8(text_buf).map_err(|_| EntryError::MalformedText)?;
    if text.is_empty() {
        return Err(EntryError::EmptyText);
    }

    Ok((key, Note { text, timestamp }))
}
