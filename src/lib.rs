//! Color source lines by how recently they changed.
//!
//! Line ages come from live edits and from `git blame`. They are ranked
//! into a fixed bank of pre-registered styles and applied per document
//! through a [`decorations::DecorationHost`].

pub mod app;
pub mod color;
pub mod commands;
pub mod config;
pub mod decorations;
pub mod document;
pub mod highlighter;
pub mod history;
pub mod ranker;
pub mod refresh;
pub mod store;
pub mod styles;
