pub mod config;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::error::RetrievalError;
use crate::models::{ImageFormat, ImagePayload};

pub use config::{Config, ConfigStorage, GeneralConfig, LoggingConfig, TomlConfigStorage};

const FILE_PREFIX: &str = "clipboard-";

static FILENAME_SEQ: AtomicU64 = AtomicU64::new(0);

/// Location of the config file
///
/// XDG Base Directory Specification:
/// - Config: $XDG_CONFIG_HOME/clipgrab/clipgrab.toml (default: ~/.config/clipgrab/clipgrab.toml)
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("clipgrab")
    } else {
        let home = env::var("HOME").context("HOME environment variable not set")?;
        PathBuf::from(home).join(".config/clipgrab")
    };

    Ok(config_dir.join("clipgrab.toml"))
}

/// Create (if needed) and return the directory clipboard images are saved into
/// Defaults to `<temp dir>/clipgrab`
pub fn ensure_clipboard_dir(configured: Option<&Path>) -> io::Result<PathBuf> {
    let dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => env::temp_dir().join("clipgrab"),
    };

    fs::create_dir_all(&dir)?;
    log::trace!("Clipboard directory: {:?}", dir);
    Ok(dir)
}

/// Unique file name for a new clipboard image
/// Timestamp + pid + in-process sequence keeps concurrent callers apart
pub fn generate_clipboard_filename(format: ImageFormat) -> String {
    let seq = FILENAME_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}{}-{}-{}.{}",
        FILE_PREFIX,
        chrono::Local::now().format("%Y%m%d-%H%M%S%3f"),
        std::process::id(),
        seq,
        format.extension()
    )
}

/// Write a payload into `dir` and verify it landed
///
/// Uses the atomic write pattern: bytes go to a `.tmp` file which is checked
/// for a non-zero size before being renamed into place. Every failure path
/// removes whatever was written, so the only file ever left behind is a
/// complete one.
pub fn persist(dir: &Path, payload: ImagePayload) -> Result<PathBuf, RetrievalError> {
    let path = dir.join(generate_clipboard_filename(payload.format));
    let tmp_path = path.with_extension(format!("{}.tmp", payload.format.extension()));

    if let Err(e) = fs::write(&tmp_path, &payload.bytes) {
        remove_quietly(&tmp_path);
        return Err(RetrievalError::io("write failed", e));
    }

    let size = match fs::metadata(&tmp_path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            remove_quietly(&tmp_path);
            return Err(RetrievalError::io("stat failed", e));
        }
    };

    if size == 0 {
        remove_quietly(&tmp_path);
        return Err(RetrievalError::EmptyContent);
    }

    if let Err(e) = fs::rename(&tmp_path, &path) {
        remove_quietly(&tmp_path);
        return Err(RetrievalError::io("rename failed", e));
    }

    log::debug!("Saved {} bytes of {} to {:?}", size, payload.format, path);
    Ok(path)
}

/// Remove saved clipboard images older than `max_age`
/// Returns the number of files removed
pub fn cleanup_stale(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_ours = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(FILE_PREFIX));
        if !is_ours {
            continue;
        }

        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }

        let age = meta
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();

        if age > max_age {
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("Failed to remove stale {:?}: {}", entry.path(), e),
            }
        }
    }

    log::debug!("Removed {} stale clipboard images from {:?}", removed, dir);
    Ok(removed)
}

/// Best-effort delete; secondary failures are only logged
fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::debug!("Failed to remove partial file {:?}: {}", path, e);
        }
    }
}
