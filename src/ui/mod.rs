pub mod colors;
pub mod editor_view;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use recency::app::App;
use recency::commands::StatusLabel;

pub fn render(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // editors
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    if app.documents.is_empty() {
        let empty = Paragraph::new(" no open files")
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(colors::BORDER_IDLE)));
        f.render_widget(empty, outer[0]);
    } else {
        let count = app.documents.len() as u32;
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
            .split(outer[0]);
        for (index, pane) in panes.iter().enumerate() {
            editor_view::render(f, app, index, *pane);
        }
    }

    render_status_bar(f, app, outer[1]);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let label = app.status_label();
    let label_color = match label {
        StatusLabel::Off => colors::LABEL_OFF,
        StatusLabel::New => colors::LABEL_NEW,
        StatusLabel::Old => colors::LABEL_OLD,
    };

    let mut spans = vec![Span::styled(
        format!(" {label} "),
        Style::default().fg(label_color).add_modifier(Modifier::BOLD),
    )];
    for (key, rest) in [
        ("[t]", "oggle "),
        ("[c]", "ycle "),
        ("[r]", "ecompute "),
        ("[b]", "g/fg "),
        ("[v]", " reverse "),
        ("[tab]", "file "),
        ("[j/k]", "scroll "),
        ("[q]", "uit "),
    ] {
        spans.push(Span::styled(key, Style::default().fg(colors::KEY_HINT)));
        spans.push(Span::raw(rest));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(colors::STATUS_BG).fg(colors::STATUS_FG)),
        area,
    );
}
