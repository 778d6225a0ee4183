//! Seams between the core and the host.
//!
//! Everything foreign and fragile lives behind these traits: the untyped
//! journal panel value tree, the save-state record stream, and the dialog
//! widgets. Implementations belong to the host shim; the core only sees
//! typed results and treats every failure as a safe default.

use anyhow::Result;

use crate::model::config::{DialogConfig, IndicatorConfig};
use crate::model::note::ContextKey;

/// Narrow view of the host's journal panel.
///
/// Implementations do whatever string-path probing the host's UI value tree
/// requires; none of that leaks past this trait. A query error here is
/// always degraded by the core to "closed"/"no selection".
pub trait JournalUi {
    fn is_panel_open(&self) -> Result<bool>;
    /// Currently highlighted quest id, if any.
    fn selected_entity(&self) -> Result<Option<u32>>;
    /// Display name for a quest id, or `None` when the id is unknown to the
    /// host (e.g. content owned by an unrelated extension).
    fn resolve_display_name(&self, id: u32) -> Option<String>;

    /// Create the hint indicator element owned by the tracker.
    fn create_indicator(&self, style: &IndicatorConfig) -> Result<()>;
    fn set_indicator_text(&self, text: &str) -> Result<()>;
    /// Tear the indicator down. Infallible: a panel that is already gone
    /// has nothing left to destroy.
    fn destroy_indicator(&self);
}

/// Header of one record in the host's save-state stream. Kind and version
/// live here, in the host's generic header, not in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: [u8; 4],
    pub version: u32,
    pub length: u32,
}

/// Write side of the host's record stream.
pub trait CosaveWrite {
    fn open_record(&mut self, kind: [u8; 4], version: u32) -> Result<()>;
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;
}

/// Read side of the host's record stream. The host drives iteration and
/// hands out one header per stored record.
pub trait CosaveRead {
    fn next_record(&mut self) -> Result<Option<RecordHeader>>;
    /// Read up to `buf.len()` payload bytes of the current record. Returns
    /// the byte count actually read; short counts mean the record ended.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Discard `n` payload bytes of the current record.
    fn skip_bytes(&mut self, mut n: u32) -> Result<()> {
        let mut scratch = [0u8; 256];
        while n > 0 {
            let want = (n as usize).min(scratch.len());
            let got = self.read_bytes(&mut scratch[..want])?;
            if got == 0 {
                break;
            }
            n -= got as u32;
        }
        Ok(())
    }
}

/// Request handed to the modal text-entry widget. The widget later calls
/// `NotesPlugin::on_text_result` with the same context, exactly once on
/// acceptance and never on cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEntryRequest {
    pub context: ContextKey,
    pub title: String,
    pub existing_text: String,
}

pub trait TextEntry {
    fn request_text(&self, request: TextEntryRequest, style: &DialogConfig);
}

/// One row of the read-only notes overview.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewRow {
    pub display_name: String,
    pub preview: String,
    pub full_text: String,
    pub context: ContextKey,
}

pub trait ListView {
    fn show(&self, rows: Vec<ListViewRow>, style: &DialogConfig);
}

/// Transient user-visible messages ("Note saved", "Nothing selected").
pub trait Notifier {
    fn notify(&self, message: &str);
}
