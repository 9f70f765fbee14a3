mod events;
mod ui;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser as ClapParser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    execute,
    style::{Color as AnsiColor, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Style};
use ratatui::Terminal;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, Registry};

use events::AppEvent;
use recency::app::App;
use recency::config::Config;
use recency::document::Document;
use recency::history::git::GitBlame;
use recency::refresh::{collect_seeds, RefreshRequest};

#[derive(ClapParser, Debug)]
#[command(name = "recency", about = "Color source lines by how recently they changed")]
struct Cli {
    /// Files to open.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Settings file (JSON, camelCase keys). Created by the first command
    /// that changes a setting.
    #[arg(short, long, default_value = ".recency.json")]
    config: PathBuf,

    /// Print each file once with its colors instead of launching the TUI.
    #[arg(long)]
    dump: bool,

    /// Write logs here while the TUI owns the terminal. Defaults to
    /// `recency.log` in the temp directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = Config::load(&cli.config);
    let log_level = init_logging(&cli, config.debug_logging)?;

    let documents = cli
        .files
        .iter()
        .map(|path| Document::open(path))
        .collect::<Result<Vec<_>>>()?;
    let history = Arc::new(GitBlame::default());
    let mut app = App::new(config, documents, Some(cli.config.clone()));

    if cli.dump {
        return dump(&mut app, history).await;
    }

    // Launch TUI.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &mut app, history, &cli.config, &log_level).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Handle for switching the log level when `debugLogging` changes.
type LogLevel = reload::Handle<LevelFilter, Registry>;

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn set_log_level(handle: &LogLevel, debug: bool) {
    if let Err(e) = handle.modify(|filter| *filter = level_for(debug)) {
        tracing::warn!(error = %e, "could not change log level");
    }
}

/// Logs go to stderr in dump mode and to a file otherwise, since the TUI
/// owns the terminal.
fn init_logging(cli: &Cli, debug: bool) -> Result<LogLevel> {
    let writer = if cli.dump {
        BoxMakeWriter::new(io::stderr)
    } else if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .wrap_err_with(|| format!("creating log file {}", path.display()))?;
        BoxMakeWriter::new(Mutex::new(file))
    } else {
        // Opened per event, so a quiet session leaves no file behind.
        let path = std::env::temp_dir().join("recency.log");
        BoxMakeWriter::new(move || -> Box<dyn Write> {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Box::new(file),
                Err(_) => Box::new(io::sink()),
            }
        })
    };

    let (filter, handle) = reload::Layer::new(level_for(debug));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(cli.dump)
                .with_writer(writer),
        )
        .init();
    Ok(handle)
}

async fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    history: Arc<GitBlame>,
    config_path: &Path,
    log_level: &LogLevel,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    events::spawn_key_reader(tx.clone());
    let mut interval = app.update_interval();
    let mut timer = events::spawn_tick_timer(tx.clone(), interval);
    let _watcher = events::watch_paths(&app.watched_paths(), config_path, tx.clone())?;

    if let Some(request) = app.on_open() {
        spawn_seeds(&tx, &history, request);
    }
    let mut debug = app.config().debug_logging;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        let Some(event) = rx.recv().await else {
            break;
        };
        let request = match event {
            AppEvent::Key(key) => app.handle_key(key),
            AppEvent::Tick => app.on_tick(),
            AppEvent::FileChanged(path) => {
                app.reload_file(&path);
                None
            }
            AppEvent::ConfigChanged => app.on_config_changed(Config::load(config_path)),
            AppEvent::SeedsReady { scheduled, results } => {
                app.on_seeds_ready(scheduled, results);
                None
            }
        };
        if let Some(request) = request {
            spawn_seeds(&tx, &history, request);
        }

        if app.config().debug_logging != debug {
            debug = app.config().debug_logging;
            set_log_level(log_level, debug);
        }
        if app.update_interval() != interval {
            interval = app.update_interval();
            timer.abort();
            timer = events::spawn_tick_timer(tx.clone(), interval);
        }
        if app.should_quit {
            break;
        }
    }

    timer.abort();
    Ok(())
}

/// Blame off the event loop; the results come back as `SeedsReady`.
fn spawn_seeds(tx: &UnboundedSender<AppEvent>, history: &Arc<GitBlame>, request: RefreshRequest) {
    let tx = tx.clone();
    let history = Arc::clone(history);
    tokio::spawn(async move {
        let results = collect_seeds(history, request.targets).await;
        let _ = tx.send(AppEvent::SeedsReady {
            scheduled: request.scheduled,
            results,
        });
    });
}

async fn dump(app: &mut App, history: Arc<GitBlame>) -> Result<()> {
    if let Some(request) = app.on_open() {
        let results = collect_seeds(history, request.targets).await;
        app.on_seeds_ready(request.scheduled, results);
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", app.status_label())?;
    for doc in &app.documents {
        writeln!(out)?;
        writeln!(out, "{}", doc.id())?;
        let styles = app.decorations.line_styles(doc.id(), doc.line_count());
        let gutter = doc.line_count().to_string().len();
        for (i, (text, style)) in doc.lines().zip(styles).enumerate() {
            writeln!(out, "{:>gutter$} {}", i + 1, ansi(text, style))?;
        }
    }
    Ok(())
}

fn ansi(text: &str, style: Option<Style>) -> String {
    let Some(style) = style else {
        return text.to_string();
    };
    let mut styled = text.stylize();
    if let Some(Color::Rgb(r, g, b)) = style.fg {
        styled = styled.with(AnsiColor::Rgb { r, g, b });
    }
    if let Some(Color::Rgb(r, g, b)) = style.bg {
        styled = styled.on(AnsiColor::Rgb { r, g, b });
    }
    styled.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_follows_debug_flag() {
        let (_filter, handle) = reload::Layer::<_, Registry>::new(level_for(false));
        assert_eq!(handle.clone_current(), Some(LevelFilter::INFO));
        set_log_level(&handle, true);
        assert_eq!(handle.clone_current(), Some(LevelFilter::DEBUG));
        set_log_level(&handle, false);
        assert_eq!(handle.clone_current(), Some(LevelFilter::INFO));
    }
}
