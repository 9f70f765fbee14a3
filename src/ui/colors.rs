//! Chrome colors for the TUI. Line colors come from the palette, not from here.

use ratatui::style::Color;

pub const BORDER_ACTIVE: Color = Color::Cyan;
pub const BORDER_IDLE: Color = Color::DarkGray;
pub const GUTTER: Color = Color::Rgb(100, 100, 100);
pub const TITLE: Color = Color::Rgb(255, 220, 150);

// ── Status bar ──────────────────────────────────────────────────────
pub const STATUS_BG: Color = Color::DarkGray;
pub const STATUS_FG: Color = Color::White;
pub const KEY_HINT: Color = Color::Rgb(160, 160, 160);
pub const LABEL_OFF: Color = Color::Rgb(180, 60, 60);
pub const LABEL_NEW: Color = Color::Rgb(80, 220, 120);
pub const LABEL_OLD: Color = Color::Rgb(230, 160, 60);
