use std::collections::HashMap;
use std::sync::RwLock;

use super::note::{ContextKey, Note, sanitize_text};

/// Authoritative in-memory note mapping.
///
/// The host calls save/load/revert off the input thread, so all access goes
/// through a reader/writer lock: queries and snapshots take the shared lock,
/// mutations the exclusive one. Each entry is written inside a single
/// exclusive section, so a snapshot never observes a half-written entry.
pub struct NoteStore {
    notes: RwLock<HashMap<ContextKey, Note>>,
    max_text_len: usize,
}

impl NoteStore {
    pub fn new(max_text_len: usize) -> Self {
        Self {
            notes: RwLock::new(HashMap::new()),
            max_text_len,
        }
    }

    /// Stored text for `key`, or an empty string if absent. Never fails.
    pub fn get(&self, key: ContextKey) -> String {
        self.notes
            .read()
            .expect("note store lock poisoned")
            .get(&key)
            .map(|note| note.text.clone())
            .unwrap_or_default()
    }

    pub fn has(&self, key: ContextKey) -> bool {
        self.notes
            .read()
            .expect("note store lock poisoned")
            .contains_key(&key)
    }

    pub fn count(&self) -> usize {
        self.notes.read().expect("note store lock poisoned").len()
    }

    /// Insert/overwrite the note for `key`, stamping it now. Empty text
    /// removes the entry instead. `Quest(0)` is the host's invalid-key
    /// marker and is dropped with a diagnostic rather than an error.
    pub fn save(&self, key: ContextKey, text: &str) {
        if key == ContextKey::Quest(crate::model::note::INVALID_RAW_KEY) {
            tracing::warn!("refusing to save note for invalid context key 0");
            return;
        }

        let mut notes = self.notes.write().expect("note store lock poisoned");

        if text.is_empty() {
            if notes.remove(&key).is_some() {
                tracing::debug!(key = key.to_raw(), "note removed");
            }
            return;
        }

        let sanitized = sanitize_text(text, self.max_text_len);
        if sanitized.len() < text.len() {
            tracing::info!(
                key = key.to_raw(),
                from = text.len(),
                to = sanitized.len(),
                "note text truncated to maximum length"
            );
        }
        if sanitized.is_empty() {
            // Input was nothing but NULs. Treat like an empty save.
            notes.remove(&key);
            return;
        }

        notes.insert(key, Note::new(sanitized));
    }

    /// Defensive copy of the full mapping, for enumeration and the
    /// persistence path. Never a live reference.
    pub fn snapshot(&self) -> Vec<(ContextKey, Note)> {
        self.notes
            .read()
            .expect("note store lock poisoned")
            .iter()
            .map(|(key, note)| (*key, note.clone()))
            .collect()
    }

    /// Empty the store unconditionally (session revert).
    pub fn clear(&self) {
        self.notes.write().expect("note store lock poisoned").clear();
    }

    /// Swap in a freshly decoded mapping wholesale. Load path only.
    pub(crate) fn replace_all(&self, entries: Vec<(ContextKey, Note)>) {
        let mut notes = self.notes.write().expect("note store lock poisoned");
        notes.clear();
        notes.extend(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> NoteStore {
        NoteStore::new(1024)
    }

    #[test]
    fn empty_store_reads() {
        let store = store();
        assert_eq!(store.get(ContextKey::Quest(1001)), "");
        assert!(!store.has(ContextKey::Quest(1001)));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn save_then_get_round_trips() {
        let store = store();
        store.save(ContextKey::Quest(1001), "Check the chest");
        assert_eq!(store.get(ContextKey::Quest(1001)), "Check the chest");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn empty_text_removes_entry() {
        let store = store();
        store.save(ContextKey::Quest(1001), "Check the chest");
        store.save(ContextKey::Quest(1001), "");
        assert_eq!(store.count(), 0);
        assert!(!store.has(ContextKey::Quest(1001)));

        // Idempotent when already absent.
        store.save(ContextKey::Quest(1001), "");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn invalid_key_save_is_a_no_op() {
        let store = store();
        store.save(ContextKey::Quest(0), "should vanish");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn general_key_is_a_valid_context() {
        let store = store();
        store.save(ContextKey::General, "shopping list");
        assert!(store.has(ContextKey::General));
        assert_eq!(store.get(ContextKey::General), "shopping list");
    }

    #[test]
    fn oversized_text_is_truncated_not_rejected() {
        let store = NoteStore::new(8);
        store.save(ContextKey::Quest(5), "0123456789");
        assert_eq!(store.get(ContextKey::Quest(5)), "01234567");
    }

    #[test]
    fn clear_empties_unconditionally() {
        let store = store();
        store.save(ContextKey::Quest(1), "a");
        store.save(ContextKey::General, "b");
        store.clear();
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = store();
        store.save(ContextKey::Quest(1), "a");
        let snap = store.snapshot();
        store.clear();
        assert_eq!(snap.len(), 1);
        assert_eq!(store.count(), 0);
    }
}
