//! The host's decoration surface.
//!
//! Hosts require styles to be declared before use, so the pipeline
//! registers one style per palette bucket up front and afterwards only
//! hands each style a list of line ranges per document.

use std::collections::HashMap;

use ratatui::style::{Color, Style};

use crate::color::Rgba;
use crate::config::ColorTarget;
use crate::document::DocumentId;

/// Opaque handle to a style registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleHandle(pub u32);

/// What a style paints: the text itself or the line background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSpec {
    pub color: Rgba,
    pub target: ColorTarget,
}

/// A whole line, from column 0 to the end of its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineRange {
    pub line: usize,
    pub end: usize,
}

pub trait DecorationHost {
    fn create_style(&mut self, spec: StyleSpec) -> StyleHandle;
    fn dispose_style(&mut self, handle: StyleHandle);
    /// Replace the ranges painted with `handle` in `document`.
    fn set_ranges(&mut self, document: &DocumentId, handle: StyleHandle, ranges: Vec<LineRange>);
}

/// Default text color the foreground tint is blended over.
const BASE_FG: (u8, u8, u8) = (204, 204, 204);
/// Default background the highlight is blended over.
const BASE_BG: (u8, u8, u8) = (0, 0, 0);

/// Decorations for a terminal, which cannot draw translucent colors: each
/// style is pre-blended against the default foreground or background.
#[derive(Debug, Default)]
pub struct TerminalDecorations {
    next_handle: u32,
    styles: HashMap<StyleHandle, Style>,
    applied: HashMap<DocumentId, HashMap<StyleHandle, Vec<LineRange>>>,
}

impl TerminalDecorations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    pub fn style(&self, handle: StyleHandle) -> Option<Style> {
        self.styles.get(&handle).copied()
    }

    /// Ranges currently painted with `handle` in `document`.
    pub fn ranges(&self, document: &DocumentId, handle: StyleHandle) -> &[LineRange] {
        self.applied
            .get(document)
            .and_then(|by_style| by_style.get(&handle))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of decorated ranges in `document`.
    pub fn decorated_count(&self, document: &DocumentId) -> usize {
        self.applied
            .get(document)
            .map_or(0, |by_style| by_style.values().map(Vec::len).sum())
    }

    /// Per-line style for rendering, indexed by line number.
    pub fn line_styles(&self, document: &DocumentId, line_count: usize) -> Vec<Option<Style>> {
        let mut out = vec![None; line_count];
        if let Some(by_style) = self.applied.get(document) {
            for (handle, ranges) in by_style {
                let Some(style) = self.styles.get(handle) else {
                    continue;
                };
                for range in ranges {
                    if let Some(slot) = out.get_mut(range.line) {
                        *slot = Some(*style);
                    }
                }
            }
        }
        out
    }

    pub fn forget_document(&mut self, document: &DocumentId) {
        self.applied.remove(document);
    }
}

impl DecorationHost for TerminalDecorations {
    fn create_style(&mut self, spec: StyleSpec) -> StyleHandle {
        self.next_handle += 1;
        let handle = StyleHandle(self.next_handle);
        self.styles.insert(handle, terminal_style(spec));
        handle
    }

    fn dispose_style(&mut self, handle: StyleHandle) {
        self.styles.remove(&handle);
        for by_style in self.applied.values_mut() {
            by_style.remove(&handle);
        }
    }

    fn set_ranges(&mut self, document: &DocumentId, handle: StyleHandle, ranges: Vec<LineRange>) {
        let by_style = self.applied.entry(document.clone()).or_default();
        if ranges.is_empty() {
            by_style.remove(&handle);
        } else {
            by_style.insert(handle, ranges);
        }
    }
}

/// Blend `spec` over the terminal defaults into an opaque style.
pub fn terminal_style(spec: StyleSpec) -> Style {
    let base = match spec.target {
        ColorTarget::Foreground => BASE_FG,
        ColorTarget::Background => BASE_BG,
    };
    let a = spec.color.alpha;
    let mix = |c: u8, b: u8| (c as f64 * a + b as f64 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
    let rgb = spec.color.rgb;
    let color = Color::Rgb(mix(rgb.red, base.0), mix(rgb.green, base.1), mix(rgb.blue, base.2));
    match spec.target {
        ColorTarget::Foreground => Style::default().fg(color),
        ColorTarget::Background => Style::default().bg(color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn spec(alpha: f64, target: ColorTarget) -> StyleSpec {
        StyleSpec {
            color: Rgba::new(Srgb::new(255, 0, 0), alpha),
            target,
        }
    }

    #[test]
    fn opaque_foreground_keeps_color() {
        let style = terminal_style(spec(1.0, ColorTarget::Foreground));
        assert_eq!(style.fg, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(style.bg, None);
    }

    #[test]
    fn translucent_background_blends_toward_black() {
        let style = terminal_style(spec(0.4, ColorTarget::Background));
        assert_eq!(style.bg, Some(Color::Rgb(102, 0, 0)));
    }

    #[test]
    fn ranges_follow_set_and_dispose() {
        let mut host = TerminalDecorations::new();
        let doc = DocumentId::new("file:///x");
        let h = host.create_style(spec(1.0, ColorTarget::Foreground));
        host.set_ranges(&doc, h, vec![LineRange { line: 1, end: 4 }]);
        assert_eq!(host.decorated_count(&doc), 1);

        let styles = host.line_styles(&doc, 3);
        assert!(styles[0].is_none());
        assert!(styles[1].is_some());

        host.dispose_style(h);
        assert_eq!(host.decorated_count(&doc), 0);
        assert_eq!(host.style_count(), 0);
    }
}
