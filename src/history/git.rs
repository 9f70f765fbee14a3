use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;

use super::{BlameLine, HistoryProvider, RevisionId};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("git exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },
    #[error("git produced no output")]
    Empty,
}

/// Blame through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitBlame {
    program: PathBuf,
}

impl Default for GitBlame {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitBlame {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Top level of the repository containing `dir`.
    pub async fn resolve_root(&self, dir: &Path) -> Result<PathBuf, HistoryError> {
        let out = self
            .run(dir, &["rev-parse", "--show-toplevel"])
            .await?;
        let root = out.trim();
        if root.is_empty() {
            return Err(HistoryError::Empty);
        }
        Ok(PathBuf::from(root))
    }

    /// Blame `path`, trying the repository-relative form first and then the
    /// raw path from the file's own directory.
    pub async fn blame_file(&self, path: &Path) -> Result<Vec<BlameLine>, HistoryError> {
        let file_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let root = match self.resolve_root(&file_dir).await {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!(dir = %file_dir.display(), error = %e, "no repository root, using file directory");
                file_dir.clone()
            }
        };
        let rel = relative_to(path, &root);

        let primary = self
            .run(
                &root,
                &["blame", "--line-porcelain", "--", &rel.to_string_lossy()],
            )
            .await;
        match primary.map(|text| parse_porcelain(&text)) {
            Ok(lines) if !lines.is_empty() => return Ok(lines),
            Ok(_) => tracing::debug!(file = %path.display(), "root-relative blame had no lines, retrying"),
            Err(e) => tracing::debug!(file = %path.display(), error = %e, "root-relative blame failed, retrying"),
        }

        let text = self
            .run(
                &file_dir,
                &["blame", "--line-porcelain", "--", &path.to_string_lossy()],
            )
            .await?;
        Ok(parse_porcelain(&text))
    }

    async fn run(&self, cwd: &Path, args: &[&str]) -> Result<String, HistoryError> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| HistoryError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(HistoryError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(HistoryError::Empty);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl HistoryProvider for GitBlame {
    async fn blame(&self, path: &Path) -> Vec<BlameLine> {
        match self.blame_file(path).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "blame unavailable");
                Vec::new()
            }
        }
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    if let Ok(rel) = path.strip_prefix(root) {
        return rel.to_path_buf();
    }
    // `git rev-parse` reports the canonical root; compare canonically too.
    match (path.canonicalize(), root.canonicalize()) {
        (Ok(p), Ok(r)) => p
            .strip_prefix(&r)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Parse `git blame --line-porcelain` output into one record per source
/// line. Unrecognized lines are skipped.
pub fn parse_porcelain(text: &str) -> Vec<BlameLine> {
    let mut lines = Vec::new();
    let mut revision: Option<RevisionId> = None;
    let mut timestamp_ms: Option<i64> = None;

    for line in text.lines() {
        if line.starts_with('\t') {
            lines.push(BlameLine::new(revision.clone(), timestamp_ms));
        } else if let Some(secs) = line.strip_prefix("author-time ") {
            if let Ok(secs) = secs.trim().parse::<i64>() {
                timestamp_ms = secs.checked_mul(1000);
            }
        } else if let Some(hash) = header_hash(line) {
            // Revisions repeat across lines; share the allocation.
            if revision.as_deref() != Some(hash) {
                revision = Some(RevisionId::from(hash));
            }
            timestamp_ms = None;
        }
    }
    lines
}

/// `<hash> <orig-line> <final-line> [<count>]`, hash optionally `^`-prefixed.
fn header_hash(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    let hash = parts.next()?;
    let hash = hash.strip_prefix('^').unwrap_or(hash);
    if !(8..=40).contains(&hash.len())
        || !hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return None;
    }
    let numbers = parts.take(3).filter(|p| p.bytes().all(|b| b.is_ascii_digit())).count();
    (numbers == 3).then_some(hash)
}
