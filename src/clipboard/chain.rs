use std::time::{Duration, Instant};

use super::RetrievalSettings;
use super::backend::{Backend, Negotiation};
use super::runner::CommandRunner;
use crate::error::{RetrievalError, RetrievalOutcome};
use crate::models::{ImageFormat, ImagePayload};
use crate::storage;

/// Ordered walk over a platform's backends
///
/// Backends are tried one at a time. A backend that is missing, fails to run,
/// cannot tell what is on the clipboard, or hands back nothing is skipped in
/// favour of the next one. A backend that lists the clipboard types and finds
/// no image ends the walk: later backends would see the same clipboard.
pub struct FallbackChain<'a> {
    backends: &'a [Backend],
    runner: &'a dyn CommandRunner,
    settings: &'a RetrievalSettings,
    install_hint: &'static str,
}

/// What one backend had to say about the clipboard
enum Probe {
    Unavailable,
    Found(ImageFormat),
    NoImage,
    Skip(Option<RetrievalError>),
}

impl<'a> FallbackChain<'a> {
    pub fn new(
        backends: &'a [Backend],
        runner: &'a dyn CommandRunner,
        settings: &'a RetrievalSettings,
        install_hint: &'static str,
    ) -> Self {
        FallbackChain {
            backends,
            runner,
            settings,
            install_hint,
        }
    }

    /// Whether some backend currently sees an image on the clipboard
    pub fn detect(&self) -> bool {
        let deadline = Deadline::start(self.settings.chain_timeout);

        for &backend in self.backends {
            if deadline.expired() {
                log::warn!(target: "clipboard", "Chain deadline hit before trying {}", backend.name());
                break;
            }

            match self.probe(backend) {
                Probe::Found(format) => {
                    log::debug!(target: "clipboard", "{} reports {} on the clipboard", backend.name(), format);
                    return true;
                }
                Probe::NoImage => return false,
                Probe::Unavailable | Probe::Skip(_) => continue,
            }
        }

        false
    }

    /// Fetch the clipboard image and write it to the output directory
    pub fn retrieve(&self) -> RetrievalOutcome {
        let deadline = Deadline::start(self.settings.chain_timeout);
        let mut any_available = false;
        // Failure of the most recent available backend only; reset by each one reached
        let mut last_failure = None;

        for &backend in self.backends {
            if deadline.expired() {
                log::warn!(target: "clipboard", "Chain deadline hit before trying {}", backend.name());
                return Err(RetrievalError::DeadlineExceeded {
                    budget: self.settings.chain_timeout.unwrap_or_default(),
                });
            }

            let format = match self.probe(backend) {
                Probe::Unavailable => continue,
                Probe::Found(format) => format,
                Probe::NoImage => return Err(RetrievalError::NoImagePresent),
                Probe::Skip(failure) => {
                    any_available = true;
                    last_failure = failure;
                    continue;
                }
            };
            any_available = true;
            last_failure = None;

            let bytes = match backend.fetch_bytes(self.runner, format, &self.settings.limits) {
                Ok(bytes) if bytes.is_empty() => {
                    log::debug!(target: "clipboard", "{} returned no image data", backend.name());
                    last_failure = Some(RetrievalError::EmptyContent);
                    continue;
                }
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!(target: "clipboard", "{} fetch failed: {}", backend.name(), e);
                    last_failure = Some(e);
                    continue;
                }
            };

            log::info!(
                target: "clipboard",
                "Read {} bytes of {} via {}",
                bytes.len(),
                format,
                backend.name()
            );

            let dir = storage::ensure_clipboard_dir(self.settings.output_dir.as_deref())
                .map_err(|e| RetrievalError::io("could not prepare output directory", e))?;
            return storage::persist(&dir, ImagePayload::validated(bytes, format));
        }

        if !any_available {
            return Err(RetrievalError::NoToolAvailable {
                hint: self.install_hint,
            });
        }

        Err(last_failure.unwrap_or(RetrievalError::NoImagePresent))
    }

    /// Availability check followed by type negotiation
    fn probe(&self, backend: Backend) -> Probe {
        if !backend.is_available(self.runner, &self.settings.limits) {
            return Probe::Unavailable;
        }

        match backend.negotiate_format(self.runner, &self.settings.limits) {
            Ok(Negotiation::Format(format)) => Probe::Found(format),
            Ok(Negotiation::NoImage) => {
                log::debug!(target: "clipboard", "{} lists no image types", backend.name());
                Probe::NoImage
            }
            Ok(Negotiation::Undetermined) => {
                log::debug!(target: "clipboard", "{} cannot list clipboard types, skipping", backend.name());
                Probe::Skip(None)
            }
            Err(e) => {
                log::debug!(target: "clipboard", "{} type query failed: {}", backend.name(), e);
                Probe::Skip(Some(e))
            }
        }
    }
}

/// Optional wall-clock budget for a whole chain walk
struct Deadline(Option<Instant>);

impl Deadline {
    fn start(budget: Option<Duration>) -> Self {
        Deadline(budget.map(|budget| Instant::now() + budget))
    }

    fn expired(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
