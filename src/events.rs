use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{self, Event, KeyEvent};
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use recency::refresh::SeedResult;

/// Unified application event.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    /// A watched document was written, replaced or removed.
    FileChanged(PathBuf),
    ConfigChanged,
    SeedsReady {
        scheduled: bool,
        results: Vec<SeedResult>,
    },
}

/// Spawn a thread that polls crossterm key events and sends them to the channel.
pub fn spawn_key_reader(tx: UnboundedSender<AppEvent>) {
    std::thread::spawn(move || loop {
        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
        } else if tx.is_closed() {
            break;
        }
    });
}

/// Spawn a task that sends `Tick` every `interval`. Abort the handle to
/// restart it with a different interval.
pub fn spawn_tick_timer(tx: UnboundedSender<AppEvent>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately; the initial refresh is explicit.
        ticks.tick().await;
        loop {
            ticks.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    })
}

/// Watch the directories holding `files` and `config`. Editors often save
/// by writing a new file and renaming it over the old one, so watching the
/// files themselves would lose track after the first save.
pub fn watch_paths(
    files: &[PathBuf],
    config: &Path,
    tx: UnboundedSender<AppEvent>,
) -> Result<RecommendedWatcher> {
    let files: HashSet<PathBuf> = files.iter().map(|p| canonical(p)).collect();
    let config = canonical(config);

    let mut dirs: HashSet<PathBuf> = files
        .iter()
        .chain(std::iter::once(&config))
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .collect();
    dirs.retain(|d| d.is_dir());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "watch error");
                return;
            }
        };
        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) {
            return;
        }
        for path in event.paths {
            let sent = if path == config {
                tx.send(AppEvent::ConfigChanged)
            } else if files.contains(&path) {
                tx.send(AppEvent::FileChanged(path))
            } else {
                continue;
            };
            if sent.is_err() {
                return;
            }
        }
    })?;
    for dir in &dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }
    Ok(watcher)
}

/// `path` with its directory resolved, even when the file itself is gone.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
