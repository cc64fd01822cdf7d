pub mod backend;
pub mod chain;
pub mod linux;
pub mod runner;
pub mod windows;

use std::path::PathBuf;
use std::time::Duration;

pub use backend::{Backend, Capabilities, CommandLimits, Negotiation};
pub use chain::FallbackChain;
pub use runner::{CommandRunner, RunOptions, SystemRunner};

use crate::error::RetrievalOutcome;
use crate::storage::GeneralConfig;

/// Platforms with a clipboard image driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Driver for the platform this binary was built for, if there is one
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(Platform::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    /// Backends in order of preference
    pub fn backends(&self) -> &'static [Backend] {
        match self {
            Platform::Linux => linux::CHAIN,
            Platform::Windows => windows::CHAIN,
        }
    }

    fn install_hint(&self) -> &'static str {
        match self {
            Platform::Linux => linux::INSTALL_HINT,
            Platform::Windows => windows::INSTALL_HINT,
        }
    }
}

/// Knobs for a detection or retrieval run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalSettings {
    pub output_dir: Option<PathBuf>,
    pub limits: CommandLimits,
    pub chain_timeout: Option<Duration>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        GeneralConfig::default().retrieval_settings()
    }
}

/// Availability of one backend, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    pub backend: Backend,
    pub available: bool,
}

/// Reads images off the clipboard of one platform
/// Holds no clipboard state: every call queries the tools afresh
pub struct ClipboardDriver {
    platform: Platform,
    runner: Box<dyn CommandRunner>,
    settings: RetrievalSettings,
}

impl ClipboardDriver {
    pub fn new(
        platform: Platform,
        runner: Box<dyn CommandRunner>,
        settings: RetrievalSettings,
    ) -> Self {
        ClipboardDriver {
            platform,
            runner,
            settings,
        }
    }

    /// Driver for the current platform using real processes
    /// Returns None on platforms without a driver
    pub fn for_current_platform(settings: RetrievalSettings) -> Option<Self> {
        let platform = Platform::current()?;
        log::debug!("Using {:?} clipboard driver", platform);
        Some(ClipboardDriver::new(platform, Box::new(SystemRunner::new()), settings))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Advisory check for an image on the clipboard
    /// The clipboard may change before a following `save_clipboard_image`
    pub fn has_clipboard_image(&self) -> bool {
        self.chain().detect()
    }

    /// Save the clipboard image to a new file in the output directory
    pub fn save_clipboard_image(&self) -> RetrievalOutcome {
        self.chain().retrieve()
    }

    /// Which of the platform's backends are installed
    pub fn backend_report(&self) -> Vec<BackendStatus> {
        self.platform
            .backends()
            .iter()
            .map(|&backend| BackendStatus {
                backend,
                available: backend.is_available(self.runner.as_ref(), &self.settings.limits),
            })
            .collect()
    }

    fn chain(&self) -> FallbackChain<'_> {
        FallbackChain::new(
            self.platform.backends(),
            self.runner.as_ref(),
            &self.settings,
            self.platform.install_hint(),
        )
    }
}
