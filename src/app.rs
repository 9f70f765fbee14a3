use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::commands::{status_label, Command, StatusLabel};
use crate::config::Config;
use crate::decorations::TerminalDecorations;
use crate::document::{Document, DocumentId};
use crate::highlighter::{now_ms, Highlighter};
use crate::refresh::{RefreshGate, RefreshRequest, SeedResult};

pub struct App {
    pub documents: Vec<Document>,
    pub active: usize,
    pub scroll: usize,
    pub should_quit: bool,

    // Decoration pipeline and the surface it paints on.
    pub highlighter: Highlighter,
    pub decorations: TerminalDecorations,

    // Timer-driven refresh in flight.
    pub gate: RefreshGate,

    // Where commands persist configuration; `None` keeps changes in memory.
    pub config_path: Option<PathBuf>,

    // Opened documents still waiting for their first seed.
    unseeded: Vec<DocumentId>,
}

impl App {
    pub fn new(config: Config, documents: Vec<Document>, config_path: Option<PathBuf>) -> Self {
        let mut decorations = TerminalDecorations::new();
        let mut highlighter = Highlighter::new(config, &mut decorations);
        let unseeded = documents
            .iter()
            .filter(|doc| highlighter.ensure_tracked(doc))
            .map(|doc| doc.id().clone())
            .collect();
        Self {
            documents,
            active: 0,
            scroll: 0,
            should_quit: false,
            highlighter,
            decorations,
            gate: RefreshGate::default(),
            config_path,
            unseeded,
        }
    }

    pub fn config(&self) -> &Config {
        self.highlighter.config()
    }

    pub fn status_label(&self) -> StatusLabel {
        status_label(self.config())
    }

    pub fn update_interval(&self) -> Duration {
        self.config().update_interval()
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.documents.get(self.active)
    }

    /// Filesystem paths of every open document.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.documents
            .iter()
            .filter_map(|d| d.path().map(Path::to_path_buf))
            .collect()
    }

    /// Opening is an explicit trigger: seed the documents that were opened
    /// without one, then apply.
    pub fn on_open(&mut self) -> Option<RefreshRequest> {
        let unseeded = std::mem::take(&mut self.unseeded);
        self.start_refresh(false, Some(&unseeded))
    }

    /// Explicit refresh: seed every open document, then apply. Not gated by
    /// the timer's in-flight flag.
    pub fn refresh(&mut self) -> Option<RefreshRequest> {
        self.start_refresh(false, None)
    }

    /// Timer tick. Dropped while a previous timer refresh is in flight.
    pub fn on_tick(&mut self) -> Option<RefreshRequest> {
        if !self.gate.try_begin() {
            return None;
        }
        self.start_refresh(true, None)
    }

    /// `only` narrows seeding to those documents; everything is rendered.
    fn start_refresh(
        &mut self,
        scheduled: bool,
        only: Option<&[DocumentId]>,
    ) -> Option<RefreshRequest> {
        let targets: Vec<_> = if self.config().enabled {
            self.documents
                .iter()
                .filter(|d| only.map_or(true, |ids| ids.contains(d.id())))
                .filter_map(|d| self.highlighter.seed_target(d))
                .collect()
        } else {
            Vec::new()
        };
        if targets.is_empty() {
            // Nothing to wait for: apply (or clear) right away.
            self.render_all();
            if scheduled {
                self.gate.finish();
            }
            return None;
        }
        Some(RefreshRequest { scheduled, targets })
    }

    /// Blame results for a refresh started earlier.
    pub fn on_seeds_ready(&mut self, scheduled: bool, results: Vec<SeedResult>) {
        for result in results {
            // The document may have closed while blame was running.
            if let Some(doc) = self.documents.iter().find(|d| *d.id() == result.id) {
                self.highlighter.apply_seed(doc, &result.lines);
            }
        }
        self.render_all();
        if scheduled {
            self.gate.finish();
        }
    }

    pub fn render_all(&mut self) {
        let docs: Vec<&Document> = self.documents.iter().collect();
        self.highlighter
            .render_visible(&docs, &mut self.decorations, now_ms());
    }

    /// The file at `path` now reads `text`.
    pub fn on_file_changed(&mut self, path: &Path, text: &str) {
        let Some(index) = self.document_index(path) else {
            return;
        };
        let edits = self.documents[index].diff_edits(text);
        if edits.is_empty() {
            return;
        }
        self.documents[index].apply_edits(&edits);
        let doc = &self.documents[index];
        if self
            .highlighter
            .on_document_changed(doc, &edits, now_ms())
        {
            self.render_all();
        }
    }

    /// Re-read `path` after a change notification. Only a file that is gone
    /// closes its document; a read that fails while the file still exists
    /// (mid-save, not UTF-8) keeps the open copy.
    pub fn reload_file(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(text) => self.on_file_changed(path, &text),
            Err(_) if !path.exists() => self.on_file_removed(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not reload file, keeping open copy");
            }
        }
    }

    pub fn on_file_removed(&mut self, path: &Path) {
        let Some(index) = self.document_index(path) else {
            return;
        };
        let doc = self.documents.remove(index);
        self.highlighter
            .close_document(doc.id(), &mut self.decorations);
        self.decorations.forget_document(doc.id());
        if self.active >= self.documents.len() {
            self.active = self.documents.len().saturating_sub(1);
        }
        tracing::info!(document = %doc.id(), "closed removed file");
    }

    fn document_index(&self, path: &Path) -> Option<usize> {
        let canonical = path.canonicalize().ok();
        self.documents.iter().position(|d| {
            d.path()
                .is_some_and(|p| p == path || canonical.as_deref() == Some(p))
        })
    }

    /// Swap in a reloaded configuration. Unchanged settings are a no-op, so
    /// the echo of our own save does not trigger a second rebuild.
    pub fn on_config_changed(&mut self, config: Config) -> Option<RefreshRequest> {
        if *self.config() == config {
            return None;
        }
        self.highlighter
            .on_config_changed(config, &mut self.decorations);
        self.refresh()
    }

    pub fn run_command(&mut self, command: Command) -> Option<RefreshRequest> {
        match command.apply(self.config()) {
            Some(config) => {
                self.persist(&config);
                self.on_config_changed(config)
            }
            None => self.refresh(),
        }
    }

    fn persist(&self, config: &Config) {
        if let Some(path) = &self.config_path {
            if let Err(e) = config.save(path) {
                tracing::warn!(path = %path.display(), error = %e, "could not save config");
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<RefreshRequest> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('t') => return self.run_command(Command::Toggle),
            KeyCode::Char('c') => return self.run_command(Command::Cycle),
            KeyCode::Char('r') => return self.run_command(Command::Recompute),
            KeyCode::Char('b') => return self.run_command(Command::ToggleColorTarget),
            KeyCode::Char('v') => return self.run_command(Command::ToggleReverseAll),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(20),
            KeyCode::PageUp => self.scroll_by(-20),
            KeyCode::Tab => return self.focus_next(),
            _ => {}
        }
        None
    }

    fn scroll_by(&mut self, delta: i64) {
        let longest = self
            .documents
            .iter()
            .map(Document::line_count)
            .max()
            .unwrap_or(1);
        let next = self.scroll as i64 + delta;
        self.scroll = next.clamp(0, longest as i64 - 1) as usize;
    }

    /// Make the next document active; counts as an active-editor change.
    fn focus_next(&mut self) -> Option<RefreshRequest> {
        if self.documents.is_empty() {
            return None;
        }
        self.active = (self.active + 1) % self.documents.len();
        self.refresh()
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
