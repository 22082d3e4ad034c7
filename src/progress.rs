//! Search and packaging progress reporting.
//!
//! Provider searches run one person at a time with a pause in between, so a
//! long people list takes a while. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// About to search for person `n` (1-based) of `total`.
    Searching { person: String, n: usize, total: usize },
    /// Both searches for a person finished.
    Found {
        person: String,
        videos: usize,
        photos: usize,
    },
    /// Fetched item `n` of `total` for the bundle.
    Fetched { path: String, n: usize, total: usize },
}

/// Reports progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "search 2 / 7  Jane Doe".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Searching { person, n, total } => {
                format!("search {} / {}  {}\n", n, total, person)
            }
            ProgressEvent::Found {
                person,
                videos,
                photos,
            } => format!("  {}: {} videos, {} photos\n", person, videos, photos),
            ProgressEvent::Fetched { path, n, total } => {
                format!("fetch {} / {}  {}\n", n, total, path)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Searching { person, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "searching",
                "person": person,
                "n": n,
                "total": total
            }),
            ProgressEvent::Found {
                person,
                videos,
                photos,
            } => serde_json::json!({
                "event": "progress",
                "phase": "found",
                "person": person,
                "videos": videos,
                "photos": photos
            }),
            ProgressEvent::Fetched { path, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "fetched",
                "path": path,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!(ProgressMode::parse("json"), Some(ProgressMode::Json));
        assert_eq!(ProgressMode::parse("off"), Some(ProgressMode::Off));
        assert_eq!(ProgressMode::parse("loud"), None);
    }
}
