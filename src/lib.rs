//! quest-notes: embedded note-taking core for a game host.
//!
//! The host owns the event loop; this crate plugs into it at four points:
//! input ticks, save, load, and revert. Notes attach to a quest id or to
//! the general context and live in the host's save-state stream between
//! sessions.
//!
//! Wiring is explicit: the host shim constructs its adapter and widget
//! implementations (see [`host`]), hands them to [`NotesPlugin::new`], and
//! forwards lifecycle calls. No global state.

pub mod cosave;
pub mod dispatch;
pub mod host;
pub mod input;
pub mod model;
pub mod tracker;

use std::sync::Arc;

use anyhow::Result;

use crate::cosave::CosaveProtocol;
use crate::dispatch::InputDispatcher;
use crate::host::{CosaveRead, CosaveWrite, JournalUi, ListView, Notifier, TextEntry};
use crate::input::InputEvent;
use crate::model::config::PluginConfig;
use crate::model::note::ContextKey;
use crate::model::store::NoteStore;
use crate::tracker::ContextTracker;

/// Owning root of the subsystem. One instance per plugin lifetime.
pub struct NotesPlugin {
    store: Arc<NoteStore>,
    protocol: CosaveProtocol,
    dispatcher: InputDispatcher,
}

impl NotesPlugin {
    pub fn new(
        config: PluginConfig,
        ui: Box<dyn JournalUi>,
        text_entry: Box<dyn TextEntry>,
        list_view: Box<dyn ListView>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(NoteStore::new(config.notes.max_text_len));
        let protocol = CosaveProtocol::new(Arc::clone(&store));
        let tracker = ContextTracker::new(Arc::clone(&store), config.indicator.clone());
        let dispatcher = InputDispatcher::new(
            Arc::clone(&store),
            tracker,
            ui,
            text_entry,
            list_view,
            notifier,
            config.hotkeys.clone(),
            config.dialog.clone(),
            config.notes.preview_width,
        );

        tracing::info!("quest-notes initialized");
        Self {
            store,
            protocol,
            dispatcher,
        }
    }

    /// Shared handle to the store, for host shims that expose their own
    /// query surface (console commands and the like).
    pub fn store(&self) -> Arc<NoteStore> {
        Arc::clone(&self.store)
    }

    /// Host input tick with that tick's new events.
    pub fn handle_input(&mut self, events: &[InputEvent]) {
        self.dispatcher.process_tick(events);
    }

    /// Text-entry widget callback (acceptance only; cancel never calls).
    pub fn on_text_result(&mut self, context: ContextKey, text: &str) {
        self.dispatcher.on_text_result(context, text);
    }

    /// Host save boundary. May run off the input thread.
    pub fn on_save(&self, out: &mut dyn CosaveWrite) {
        self.protocol.save(out);
    }

    /// Host load boundary. May run off the input thread.
    pub fn on_load(&self, input: &mut dyn CosaveRead) {
        self.protocol.load(input);
    }

    /// Host new-session signal: drop all notes.
    pub fn on_revert(&self) {
        self.protocol.revert();
    }
}

/// Initialize file logging (never stdout: the host owns the console).
/// Call once from the host shim at startup.
pub fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "quest-notes")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "quest-notes.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter("quest_notes=info")
        .init();

    tracing::info!("quest-notes logging started");
    Ok(guard)
}
