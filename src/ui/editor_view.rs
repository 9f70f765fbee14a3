use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use recency::app::App;

use super::colors;

/// Draw document `index` with its line decorations.
pub fn render(f: &mut Frame, app: &App, index: usize, area: Rect) {
    let Some(doc) = app.documents.get(index) else {
        return;
    };

    let border_style = if index == app.active {
        Style::default().fg(colors::BORDER_ACTIVE)
    } else {
        Style::default().fg(colors::BORDER_IDLE)
    };
    let name = doc
        .path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| doc.id().to_string());

    let block = Block::default()
        .title(Span::styled(
            format!(" {name} "),
            Style::default().fg(colors::TITLE).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(border_style);

    let styles = app.decorations.line_styles(doc.id(), doc.line_count());
    let gutter = doc.line_count().to_string().len();

    let lines: Vec<Line> = doc
        .lines()
        .zip(styles)
        .enumerate()
        .skip(app.scroll)
        .take(area.height as usize)
        .map(|(i, (text, style))| {
            Line::from(vec![
                Span::styled(
                    format!("{:>gutter$} ", i + 1),
                    Style::default().fg(colors::GUTTER),
                ),
                Span::styled(text.replace('\t', "    "), style.unwrap_or_default()),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;
    use ratatui::Terminal;
    use recency::config::{Config, Mode};
    use recency::document::{Document, DocumentId};
    use std::path::{Path, PathBuf};

    fn app_with(text: &str) -> App {
        let path = PathBuf::from("/repo/view.rs");
        let doc = Document::from_text(DocumentId::for_path(&path), Some(path), text);
        let config = Config {
            mode: Mode::Time,
            use_git_blame: false,
            ..Config::default()
        };
        App::new(config, vec![doc], None)
    }

    fn draw(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(30, 6)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                render(f, app, 0, area);
            })
            .unwrap();
        terminal
    }

    #[test]
    fn edited_line_is_colored_and_others_are_not() {
        let mut app = app_with("alpha\nbeta");
        app.on_file_changed(Path::new("/repo/view.rs"), "alpha\nBETA");

        let terminal = draw(&app);
        let buffer = terminal.backend().buffer();
        // Border at row 0, gutter "1 " then text from column 3.
        assert_eq!(buffer[(3, 1)].symbol(), "a");
        assert_eq!(buffer[(3, 1)].fg, Color::Reset);
        assert_eq!(buffer[(3, 2)].symbol(), "B");
        assert!(matches!(buffer[(3, 2)].fg, Color::Rgb(..)));
    }

    #[test]
    fn title_shows_file_name() {
        let app = app_with("x");
        let terminal = draw(&app);
        let buffer = terminal.backend().buffer();
        let top: String = (0..30).map(|x| buffer[(x, 0)].symbol()).collect();
        assert!(top.contains("view.rs"));
    }
}
