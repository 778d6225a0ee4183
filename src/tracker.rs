use std::sync::Arc;

use crate::host::JournalUi;
use crate::model::config::IndicatorConfig;
use crate::model::note::ContextKey;
use crate::model::store::NoteStore;

/// Observed journal panel state. Cycles for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    /// Panel not visible.
    #[default]
    Closed,
    /// Panel visible, no quest highlighted.
    OpenNoSelection,
    /// Panel visible with a quest highlighted.
    OpenSelected(u32),
}

/// Polling state machine over the journal panel.
///
/// The adapter only offers level queries, so open/close edges arrive from
/// the dispatcher's per-tick watcher; selection changes come from
/// `poll_selection`. The tracker owns the hint indicator element: created
/// on the open edge, destroyed on close, and its text recomputed only when
/// the observed selection actually changes (or a caller forces it after a
/// save).
pub struct ContextTracker {
    store: Arc<NoteStore>,
    style: IndicatorConfig,
    state: PanelState,
}

impl ContextTracker {
    pub fn new(store: Arc<NoteStore>, style: IndicatorConfig) -> Self {
        Self {
            store,
            style,
            state: PanelState::default(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != PanelState::Closed
    }

    /// Currently selected quest id, if the panel is open with a selection.
    pub fn selected(&self) -> Option<u32> {
        match self.state {
            PanelState::OpenSelected(id) => Some(id),
            _ => None,
        }
    }

    /// Apply an open/close edge. Opening recreates the indicator and resets
    /// the last-known selection; closing tears the indicator down.
    pub fn set_panel_open(&mut self, ui: &dyn JournalUi, open: bool) {
        match (self.is_open(), open) {
            (false, true) => {
                if let Err(err) = ui.create_indicator(&self.style) {
                    tracing::warn!("failed to create note indicator: {err:#}");
                }
                self.state = PanelState::OpenNoSelection;
                self.refresh_indicator(ui);
            }
            (true, false) => {
                ui.destroy_indicator();
                self.state = PanelState::Closed;
            }
            _ => {}
        }
    }

    /// Re-query the adapter's selected quest. Repeated polls reporting the
    /// same value are no-ops; `force` recomputes the indicator anyway
    /// (used right after a save so the add/edit hint flips without a
    /// selection change).
    pub fn poll_selection(&mut self, ui: &dyn JournalUi, force: bool) {
        if !self.is_open() {
            return;
        }

        let selected = match ui.selected_entity() {
            Ok(selected) => selected,
            Err(err) => {
                tracing::warn!("journal selection query failed, treating as none: {err:#}");
                None
            }
        };

        // A raw 0 or the reserved maximum from a misbehaving panel is not a
        // usable quest id; same treatment as no selection.
        let next = selected
            .and_then(ContextKey::from_raw)
            .and_then(ContextKey::quest_id)
            .map_or(PanelState::OpenNoSelection, PanelState::OpenSelected);

        if next == self.state && !force {
            return;
        }

        self.state = next;
        self.refresh_indicator(ui);
    }

    fn refresh_indicator(&self, ui: &dyn JournalUi) {
        let text = match self.state {
            PanelState::OpenSelected(id) => {
                if self.store.has(ContextKey::Quest(id)) {
                    self.style.hint_edit.as_str()
                } else {
                    self.style.hint_add.as_str()
                }
            }
            _ => "",
        };

        if let Err(err) = ui.set_indicator_text(text) {
            tracing::warn!("failed to update note indicator: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeUi {
        open: Cell<bool>,
        selection: Cell<Option<u32>>,
        selection_fails: Cell<bool>,
        indicator_alive: Cell<bool>,
        indicator_text: RefCell<String>,
        text_updates: Cell<usize>,
    }

    impl JournalUi for FakeUi {
        fn is_panel_open(&self) -> Result<bool> {
            Ok(self.open.get())
        }

        fn selected_entity(&self) -> Result<Option<u32>> {
            if self.selection_fails.get() {
                return Err(anyhow!("value tree has unexpected shape"));
            }
            Ok(self.selection.get())
        }

        fn resolve_display_name(&self, _id: u32) -> Option<String> {
            None
        }

        fn create_indicator(&self, _style: &IndicatorConfig) -> Result<()> {
            self.indicator_alive.set(true);
            Ok(())
        }

        fn set_indicator_text(&self, text: &str) -> Result<()> {
            *self.indicator_text.borrow_mut() = text.to_string();
            self.text_updates.set(self.text_updates.get() + 1);
            Ok(())
        }

        fn destroy_indicator(&self) {
            self.indicator_alive.set(false);
            self.indicator_text.borrow_mut().clear();
        }
    }

    fn style() -> IndicatorConfig {
        IndicatorConfig {
            hint_add: "[Y] Add note".into(),
            hint_edit: "[Y] Edit note".into(),
            anchor_x: 0.8,
            anchor_y: 0.9,
            font_scale: 1.0,
        }
    }

    fn tracker(store: &Arc<NoteStore>) -> ContextTracker {
        ContextTracker::new(Arc::clone(store), style())
    }

    #[test]
    fn open_select_save_flips_hint_on_forced_refresh() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        tracker.set_panel_open(&ui, true);
        assert_eq!(tracker.state(), PanelState::OpenNoSelection);
        assert!(ui.indicator_alive.get());
        assert_eq!(*ui.indicator_text.borrow(), "");

        ui.selection.set(Some(42));
        tracker.poll_selection(&ui, false);
        assert_eq!(tracker.selected(), Some(42));
        assert_eq!(*ui.indicator_text.borrow(), "[Y] Add note");

        // Save for the selected quest, then force a refresh: the hint flips
        // without any new selection event.
        store.save(ContextKey::Quest(42), "x");
        tracker.poll_selection(&ui, true);
        assert_eq!(*ui.indicator_text.borrow(), "[Y] Edit note");
    }

    #[test]
    fn identical_polls_are_debounced() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        tracker.set_panel_open(&ui, true);
        ui.selection.set(Some(7));
        tracker.poll_selection(&ui, false);
        let updates = ui.text_updates.get();

        tracker.poll_selection(&ui, false);
        tracker.poll_selection(&ui, false);
        assert_eq!(ui.text_updates.get(), updates);

        tracker.poll_selection(&ui, true);
        assert_eq!(ui.text_updates.get(), updates + 1);
    }

    #[test]
    fn close_destroys_indicator_and_resets() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        tracker.set_panel_open(&ui, true);
        ui.selection.set(Some(7));
        tracker.poll_selection(&ui, false);

        tracker.set_panel_open(&ui, false);
        assert_eq!(tracker.state(), PanelState::Closed);
        assert!(!ui.indicator_alive.get());
        assert_eq!(tracker.selected(), None);

        // Reopening starts from no-selection again.
        tracker.set_panel_open(&ui, true);
        assert_eq!(tracker.state(), PanelState::OpenNoSelection);
    }

    #[test]
    fn adapter_failure_degrades_to_no_selection() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        tracker.set_panel_open(&ui, true);
        ui.selection.set(Some(7));
        tracker.poll_selection(&ui, false);
        assert_eq!(tracker.selected(), Some(7));

        ui.selection_fails.set(true);
        tracker.poll_selection(&ui, false);
        assert_eq!(tracker.state(), PanelState::OpenNoSelection);
        assert_eq!(*ui.indicator_text.borrow(), "");
    }

    #[test]
    fn reserved_raw_values_are_not_selections() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        tracker.set_panel_open(&ui, true);
        for raw in [0, u32::MAX] {
            ui.selection.set(Some(raw));
            tracker.poll_selection(&ui, false);
            assert_eq!(tracker.state(), PanelState::OpenNoSelection);
        }
    }

    #[test]
    fn polling_while_closed_is_inert() {
        let store = Arc::new(NoteStore::new(1024));
        let ui = FakeUi::default();
        let mut tracker = tracker(&store);

        ui.selection.set(Some(7));
        tracker.poll_selection(&ui, false);
        assert_eq!(tracker.state(), PanelState::Closed);
        assert_eq!(ui.text_updates.get(), 0);
    }
}
