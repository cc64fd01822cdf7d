use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::RunError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Limits applied to a single external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Kill the command if it has not finished within this time
    pub timeout: Duration,
    /// Kill the command once stdout grows past this many bytes
    pub max_output_bytes: usize,
}

impl RunOptions {
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        RunOptions {
            timeout,
            max_output_bytes,
        }
    }
}

/// Trait for running external clipboard tools
/// Returns captured stdout on success; any spawn error, timeout, oversized output
/// or non-zero exit is reported as a `RunError`
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str], opts: &RunOptions) -> Result<Vec<u8>, RunError>;
}

/// `CommandRunner` backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], opts: &RunOptions) -> Result<Vec<u8>, RunError> {
        let started = Instant::now();

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            kill_quietly(&mut child);
            return Err(RunError::Io {
                program: program.to_string(),
                source: std::io::Error::other("stdout was not captured"),
            });
        };

        // Read one byte past the limit so overflow is detectable
        let read_limit = (opts.max_output_bytes as u64).saturating_add(1);
        let reader = thread::spawn(move || -> std::io::Result<Vec<u8>> {
            let mut buffer = Vec::new();
            stdout.take(read_limit).read_to_end(&mut buffer)?;
            Ok(buffer)
        });

        while !reader.is_finished() {
            if started.elapsed() >= opts.timeout {
                // The reader thread is left to finish on its own once the pipe closes
                kill_quietly(&mut child);
                return Err(RunError::Timeout {
                    program: program.to_string(),
                    timeout: opts.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }

        let output = match reader.join() {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                kill_quietly(&mut child);
                return Err(RunError::Io {
                    program: program.to_string(),
                    source,
                });
            }
            Err(_) => {
                kill_quietly(&mut child);
                return Err(RunError::Io {
                    program: program.to_string(),
                    source: std::io::Error::other("stdout reader panicked"),
                });
            }
        };

        if output.len() > opts.max_output_bytes {
            kill_quietly(&mut child);
            return Err(RunError::OutputLimit {
                program: program.to_string(),
                limit: opts.max_output_bytes,
            });
        }

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= opts.timeout => {
                    kill_quietly(&mut child);
                    return Err(RunError::Timeout {
                        program: program.to_string(),
                        timeout: opts.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    kill_quietly(&mut child);
                    return Err(RunError::Io {
                        program: program.to_string(),
                        source,
                    });
                }
            }
        };

        if !status.success() {
            return Err(RunError::Exit {
                program: program.to_string(),
                status,
            });
        }

        log::trace!(
            target: "clipboard",
            "{} {:?} produced {} bytes in {:?}",
            program,
            args,
            output.len(),
            started.elapsed()
        );
        Ok(output)
    }
}

fn kill_quietly(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::trace!(target: "clipboard", "Failed to kill child process: {}", e);
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn opts() -> RunOptions {
        RunOptions::new(Duration::from_secs(5), 1024)
    }

    #[test]
    fn test_captures_stdout() {
        let out = SystemRunner.run("sh", &["-c", "printf hello"], &opts()).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = SystemRunner
            .run("clipgrab-definitely-not-installed", &[], &opts())
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[test]
    fn test_non_zero_exit() {
        let err = SystemRunner.run("sh", &["-c", "exit 3"], &opts()).unwrap_err();
        assert!(matches!(err, RunError::Exit { .. }));
    }

    #[test]
    fn test_output_limit() {
        let opts = RunOptions::new(Duration::from_secs(5), 8);
        let err = SystemRunner
            .run("sh", &["-c", "printf 0123456789abcdef"], &opts)
            .unwrap_err();
        assert!(matches!(err, RunError::OutputLimit { limit: 8, .. }));
    }

    #[test]
    fn test_unlimited_output_ceiling() {
        let opts = RunOptions::new(Duration::from_secs(5), usize::MAX);
        let out = SystemRunner.run("sh", &["-c", "printf hi"], &opts).unwrap();
        assert_eq!(out, b"hi");
    }

    #[test]
    fn test_unbounded_output_is_cut_off() {
        let opts = RunOptions::new(Duration::from_secs(5), 4096);
        let err = SystemRunner.run("yes", &[], &opts).unwrap_err();
        assert!(matches!(err, RunError::OutputLimit { .. }));
    }

    #[test]
    fn test_timeout() {
        let opts = RunOptions::new(Duration::from_millis(100), 1024);
        let started = Instant::now();
        let err = SystemRunner.run("sleep", &["5"], &opts).unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
