use std::time::Duration;

use super::runner::{CommandRunner, RunOptions};
use super::{linux, windows};
use crate::error::{RetrievalError, RunError};
use crate::models::ImageFormat;

/// Type listings are tiny; anything larger is a misbehaving tool
const TYPE_LIST_LIMIT: usize = 64 * 1024;
const PROBE_OUTPUT_LIMIT: usize = 4 * 1024;

/// External tools that can read an image off the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// `wl-paste` from wl-clipboard (Wayland)
    WlPaste,
    /// `xclip` (X11)
    Xclip,
    /// `xsel` (X11), text only
    Xsel,
    /// Windows PowerShell with System.Windows.Forms
    PowerShell,
}

/// What a backend is able to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_enumerate_types: bool,
    pub can_read_image_bytes: bool,
}

/// Result of asking a backend which image encoding the clipboard holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// The clipboard exposes this encoding
    Format(ImageFormat),
    /// The backend looked and there is definitely no image
    NoImage,
    /// The backend has no way of telling
    Undetermined,
}

/// Per-step limits for the commands a backend runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLimits {
    pub probe: RunOptions,
    pub query: RunOptions,
    pub fetch: RunOptions,
}

impl CommandLimits {
    pub fn new(probe_timeout: Duration, command_timeout: Duration, max_image_bytes: usize) -> Self {
        CommandLimits {
            probe: RunOptions::new(probe_timeout, PROBE_OUTPUT_LIMIT),
            query: RunOptions::new(command_timeout, TYPE_LIST_LIMIT),
            fetch: RunOptions::new(command_timeout, max_image_bytes),
        }
    }
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::WlPaste => "wl-paste",
            Backend::Xclip => "xclip",
            Backend::Xsel => "xsel",
            Backend::PowerShell => "powershell",
        }
    }

    /// Executable invoked for this backend
    pub fn program(&self) -> &'static str {
        match self {
            Backend::WlPaste => "wl-paste",
            Backend::Xclip => "xclip",
            Backend::Xsel => "xsel",
            Backend::PowerShell => "powershell",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Backend::WlPaste | Backend::Xclip => Capabilities {
                can_enumerate_types: true,
                can_read_image_bytes: true,
            },
            Backend::Xsel => Capabilities {
                can_enumerate_types: false,
                can_read_image_bytes: false,
            },
            Backend::PowerShell => Capabilities {
                can_enumerate_types: false,
                can_read_image_bytes: true,
            },
        }
    }

    /// Check whether the backend's executable is installed
    /// Advisory only: the tool can still fail when actually used
    pub fn is_available(&self, runner: &dyn CommandRunner, limits: &CommandLimits) -> bool {
        let locator = match self {
            Backend::PowerShell => "where",
            _ => "which",
        };

        match runner.run(locator, &[self.program()], &limits.probe) {
            Ok(_) => true,
            Err(e) => {
                log::debug!(target: "clipboard", "{} is not available: {}", self.name(), e);
                false
            }
        }
    }

    /// Work out which image encoding the clipboard currently exposes
    pub fn negotiate_format(
        &self,
        runner: &dyn CommandRunner,
        limits: &CommandLimits,
    ) -> Result<Negotiation, RetrievalError> {
        match self {
            Backend::WlPaste | Backend::Xclip => {
                let args = linux::list_types_args(*self);
                let stdout = runner
                    .run(self.program(), &args, &limits.query)
                    .map_err(|e| self.failure(e))?;
                Ok(linux::parse_type_list(&stdout))
            }
            Backend::Xsel => Ok(Negotiation::Undetermined),
            Backend::PowerShell => {
                let args = windows::contains_image_args();
                let stdout = runner
                    .run(self.program(), &args, &limits.query)
                    .map_err(|e| self.failure(e))?;
                Ok(windows::parse_contains_image(&stdout))
            }
        }
    }

    /// Pull the raw bytes for `format` off the clipboard
    pub fn fetch_bytes(
        &self,
        runner: &dyn CommandRunner,
        format: ImageFormat,
        limits: &CommandLimits,
    ) -> Result<Vec<u8>, RetrievalError> {
        match self {
            Backend::WlPaste | Backend::Xclip => {
                let args = linux::fetch_args(*self, format);
                runner
                    .run(self.program(), &args, &limits.fetch)
                    .map_err(|e| self.failure(e))
            }
            Backend::Xsel => Err(self.failure(RunError::Unsupported {
                program: self.program().to_string(),
            })),
            Backend::PowerShell => {
                let args = windows::fetch_png_args();
                match runner.run(self.program(), &args, &limits.fetch) {
                    Ok(bytes) => Ok(bytes),
                    Err(RunError::Exit { status, .. }) if windows::is_null_image(status) => {
                        Err(RetrievalError::NoImagePresent)
                    }
                    Err(e) => Err(self.failure(e)),
                }
            }
        }
    }

    fn failure(&self, source: RunError) -> RetrievalError {
        RetrievalError::BackendExecution {
            backend: self.name(),
            source,
        }
    }
}
