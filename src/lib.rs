//! Clipgrab - save the image on the system clipboard to a temporary file
//!
//! Each platform driver walks an ordered list of external clipboard tools
//! (wl-paste, xclip and xsel on Linux, PowerShell on Windows) and falls back
//! from one to the next until an image has been read and written to disk.

pub mod clipboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod storage;

pub use clipboard::{ClipboardDriver, Platform, RetrievalSettings};
pub use error::{RetrievalError, RetrievalOutcome, RunError};
pub use models::{ImageFormat, ImagePayload};
