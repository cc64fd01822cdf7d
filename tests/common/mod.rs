#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use clipgrab::clipboard::{
    ClipboardDriver, CommandLimits, CommandRunner, Platform, RetrievalSettings, RunOptions,
};
use clipgrab::RunError;

type Reply = Box<dyn Fn() -> Result<Vec<u8>, RunError> + Send + Sync>;

/// CommandRunner that answers from a script keyed by the full command line
/// Unscripted commands fail as if the program were not installed
#[derive(Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, command: &str, stdout: &[u8]) -> Self {
        let stdout = stdout.to_vec();
        self.replies
            .insert(command.to_string(), Box::new(move || Ok(stdout.clone())));
        self
    }

    pub fn err(mut self, command: &str, make: fn(&str) -> RunError) -> Self {
        let program = command.split(' ').next().unwrap_or_default().to_string();
        self.replies
            .insert(command.to_string(), Box::new(move || Err(make(&program))));
        self
    }

    /// Mark a program as installed for the `which`/`where` probe
    pub fn installed(self, locator: &str, program: &str) -> Self {
        let command = format!("{} {}", locator, program);
        let path = format!("/usr/bin/{}\n", program);
        self.ok(&command, path.as_bytes())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Shares the script so tests can inspect calls after handing a runner to the driver
pub struct SharedRunner(pub std::sync::Arc<ScriptedRunner>);

impl CommandRunner for SharedRunner {
    fn run(&self, program: &str, args: &[&str], _opts: &RunOptions) -> Result<Vec<u8>, RunError> {
        let command = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.0.calls.lock().unwrap().push(command.clone());

        match self.0.replies.get(&command) {
            Some(reply) => reply(),
            None => Err(RunError::Spawn {
                program: program.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

pub fn settings(output_dir: &Path) -> RetrievalSettings {
    RetrievalSettings {
        output_dir: Some(output_dir.to_path_buf()),
        limits: CommandLimits::new(Duration::from_secs(1), Duration::from_secs(1), 1024 * 1024),
        chain_timeout: None,
    }
}

pub fn driver(
    platform: Platform,
    runner: &std::sync::Arc<ScriptedRunner>,
    output_dir: &Path,
) -> ClipboardDriver {
    ClipboardDriver::new(
        platform,
        Box::new(SharedRunner(runner.clone())),
        settings(output_dir),
    )
}

pub fn output_limit(program: &str) -> RunError {
    RunError::OutputLimit {
        program: program.to_string(),
        limit: 1024 * 1024,
    }
}

pub fn timeout(program: &str) -> RunError {
    RunError::Timeout {
        program: program.to_string(),
        timeout: Duration::from_secs(1),
    }
}

pub fn targets_not_available(program: &str) -> RunError {
    RunError::Io {
        program: program.to_string(),
        source: std::io::Error::other("target TARGETS not available"),
    }
}

/// A real 4x4 PNG
pub fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
