//! Notes reader.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Resolve a notes path. A path that does not exist as given is looked up under `notes_dir`.
pub fn resolve_notes_path(path: &Path, notes_dir: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = notes_dir.join(path);
    if candidate.exists() {
        candidate
    } else {
        path.to_path_buf()
    }
}

/// Read the notes file. A missing or unreadable file yields empty text.
pub fn read_notes(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            info!(path = %path.display(), chars = text.len(), "Read notes");
            text
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Notes unavailable, continuing with empty notes");
            String::new()
        }
    }
}
