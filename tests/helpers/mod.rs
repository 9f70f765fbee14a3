use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::config::Config;
use crate::document::{Document, DocumentId};
use crate::history::{BlameLine, RevisionId};
use crate::refresh::SeedResult;

/// A document backed by a (fictional) file under `/repo`.
pub fn disk_doc(name: &str, text: &str) -> Document {
    let path = PathBuf::from(format!("/repo/{name}"));
    Document::from_text(DocumentId::for_path(&path), Some(path), text)
}

/// A document with no file behind it.
pub fn scratch_doc(text: &str) -> Document {
    Document::from_text(DocumentId::new("untitled:1"), None, text)
}

/// Blame lines from `(revision, epoch_ms)` pairs.
pub fn blame(lines: &[(&str, i64)]) -> Vec<BlameLine> {
    lines
        .iter()
        .map(|(rev, ts)| BlameLine::new(Some(RevisionId::from(*rev)), Some(*ts)))
        .collect()
}

/// One seed result per open document, in document order.
pub fn seeds(app: &App, per_doc: &[&[(&str, i64)]]) -> Vec<SeedResult> {
    app.documents
        .iter()
        .zip(per_doc)
        .map(|(doc, lines)| SeedResult {
            id: doc.id().clone(),
            lines: blame(lines),
        })
        .collect()
}

/// An app that never writes its configuration anywhere.
pub fn test_app(config: Config, documents: Vec<Document>) -> App {
    App::new(config, documents, None)
}

pub fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}
