use std::sync::Arc;

use crate::host::{JournalUi, ListView, ListViewRow, Notifier, TextEntry, TextEntryRequest};
use crate::input::{ButtonState, InputEvent};
use crate::model::config::{DialogConfig, HotkeyConfig};
use crate::model::note::ContextKey;
use crate::model::store::NoteStore;
use crate::tracker::ContextTracker;

/// Display name substituted for keys the host cannot resolve.
const UNKNOWN_QUEST_NAME: &str = "(unknown quest)";

/// Dialog title for the general context.
const GENERAL_TITLE: &str = "General notes";

/// Single entry point for host input, invoked once per tick with that
/// tick's event batch.
///
/// The adapter exposes no open/close callback, only a level query, so the
/// dispatcher keeps a previous/current watcher and synthesizes the
/// tracker's edges itself. Selection re-polls happen on key *release* and
/// pointer movement: the host panel updates its own selection
/// asynchronously relative to key-down delivery.
pub struct InputDispatcher {
    store: Arc<NoteStore>,
    tracker: ContextTracker,
    ui: Box<dyn JournalUi>,
    text_entry: Box<dyn TextEntry>,
    list_view: Box<dyn ListView>,
    notifier: Box<dyn Notifier>,
    hotkeys: HotkeyConfig,
    dialog: DialogConfig,
    preview_width: usize,
    panel_was_open: bool,
    edit_key_held: bool,
}

impl InputDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<NoteStore>,
        tracker: ContextTracker,
        ui: Box<dyn JournalUi>,
        text_entry: Box<dyn TextEntry>,
        list_view: Box<dyn ListView>,
        notifier: Box<dyn Notifier>,
        hotkeys: HotkeyConfig,
        dialog: DialogConfig,
        preview_width: usize,
    ) -> Self {
        Self {
            store,
            tracker,
            ui,
            text_entry,
            list_view,
            notifier,
            hotkeys,
            dialog,
            preview_width,
            panel_was_open: false,
            edit_key_held: false,
        }
    }

    /// Process one tick's worth of input events.
    pub fn process_tick(&mut self, events: &[InputEvent]) {
        let open = match self.ui.is_panel_open() {
            Ok(open) => open,
            Err(err) => {
                tracing::warn!("panel-open query failed, treating as closed: {err:#}");
                false
            }
        };

        if open != self.panel_was_open {
            self.tracker.set_panel_open(&*self.ui, open);
            self.panel_was_open = open;
        }

        for event in events {
            self.handle_event(*event);
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { code, state } if code == self.hotkeys.edit_key => match state {
                ButtonState::Pressed => {
                    // Edge, not held: a repeating key opens one dialog.
                    if !self.edit_key_held {
                        self.edit_key_held = true;
                        self.handle_edit_pressed();
                    }
                }
                ButtonState::Released => self.edit_key_held = false,
            },
            InputEvent::Key {
                code,
                state: ButtonState::Pressed,
            } if code == self.hotkeys.list_key => {
                if !self.panel_was_open {
                    self.show_note_list();
                }
            }
            InputEvent::Key {
                code,
                state: ButtonState::Released,
            } if self.hotkeys.nav_keys.contains(&code) => {
                if self.panel_was_open {
                    self.tracker.poll_selection(&*self.ui, false);
                }
            }
            InputEvent::PointerButton {
                button,
                state: ButtonState::Released,
            } if button == self.hotkeys.pointer_primary => {
                if self.panel_was_open {
                    self.tracker.poll_selection(&*self.ui, false);
                }
            }
            InputEvent::PointerMove { .. } => {
                // Tracker debounce absorbs rapid movement.
                if self.panel_was_open {
                    self.tracker.poll_selection(&*self.ui, false);
                }
            }
            _ => {}
        }
    }

    fn handle_edit_pressed(&mut self) {
        if self.panel_was_open {
            match self.tracker.selected() {
                Some(id) => self.request_edit(ContextKey::Quest(id)),
                None => self.notifier.notify("Nothing selected"),
            }
        } else {
            self.request_edit(ContextKey::General);
        }
    }

    fn request_edit(&self, context: ContextKey) {
        let title = match context {
            ContextKey::General => GENERAL_TITLE.to_string(),
            ContextKey::Quest(id) => match self.ui.resolve_display_name(id) {
                Some(name) => format!("Note: {name}"),
                None => "Note".to_string(),
            },
        };

        self.text_entry.request_text(
            TextEntryRequest {
                context,
                title,
                existing_text: self.store.get(context),
            },
            &self.dialog,
        );
    }

    fn show_note_list(&self) {
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            self.notifier.notify("No notes yet");
            return;
        }

        let mut rows: Vec<ListViewRow> = snapshot
            .into_iter()
            .map(|(context, note)| {
                let display_name = match context {
                    ContextKey::General => "General".to_string(),
                    ContextKey::Quest(id) => self
                        .ui
                        .resolve_display_name(id)
                        .unwrap_or_else(|| UNKNOWN_QUEST_NAME.to_string()),
                };
                ListViewRow {
                    display_name,
                    preview: preview_line(&note.text, self.preview_width),
                    full_text: note.text,
                    context,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then(a.context.to_raw().cmp(&b.context.to_raw()))
        });

        self.list_view.show(rows, &self.dialog);
    }

    /// Text-entry callback: fires exactly once on acceptance, never on
    /// cancel; no state changes happen before it.
    pub fn on_text_result(&mut self, context: ContextKey, text: &str) {
        // Keys that no longer resolve still keep their note: the quest may
        // belong to an unrelated extension.
        if let Some(id) = context.quest_id() {
            if self.ui.resolve_display_name(id).is_none() {
                tracing::warn!(id, "saving note for a quest unknown to the host");
            }
        }

        let valid = ContextKey::from_raw(context.to_raw()).is_some();
        self.store.save(context, text);
        if !valid {
            // Store already logged the rejected key; no user notification.
            return;
        }

        if self.panel_was_open && self.tracker.selected().map(ContextKey::Quest) == Some(context) {
            self.tracker.poll_selection(&*self.ui, true);
        }

        if text.is_empty() {
            self.notifier.notify("Note removed");
        } else if self.store.has(context) {
            self.notifier.notify("Note saved");
        }
    }

    #[cfg(test)]
    pub(crate) fn tracker(&self) -> &ContextTracker {
        &self.tracker
    }
}

/// First line of the note, truncated to `width` characters.
fn preview_line(text: &str, width: usize) -> String {
    let first = text.lines().next().unwrap_or_default();
    let mut preview: String = first.chars().take(width).collect();
    if preview.len() < first.len() {
        preview.push('…');
    }
    preview
}
