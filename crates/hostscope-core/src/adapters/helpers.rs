//! Shared helpers for adapters: sysfs reads and bounded subprocess calls.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Result, SampleError};

/// Read a file and trim it; empty content is an error.
pub fn read_trimmed(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| SampleError::read(path, &e))?;
    let v = raw.trim();
    if v.is_empty() {
        return Err(SampleError::parse(path.display().to_string(), "empty file"));
    }
    Ok(v.to_string())
}

/// Read a file holding one integer (sysfs style).
pub fn read_integer(path: &Path) -> Result<i64> {
    let text = read_trimmed(path)?;
    let token = text.split_whitespace().next().unwrap_or_default();
    token
        .parse::<i64>()
        .map_err(|e| SampleError::parse(path.display().to_string(), format!("{token:?}: {e}")))
}

/// Sorted entry names of a directory.
pub fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SampleError::read(dir, &e))?;
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Run `program args…` and return trimmed stdout, killing it after `timeout`.
pub fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let display = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    let command_err = |reason: String| SampleError::Command {
        command: display.clone(),
        reason,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| command_err(e.to_string()))?;

    // Drain stdout while waiting so a full pipe cannot stall the child.
    let reader = child.stdout.take().map(|mut stdout| {
        std::thread::spawn(move || {
            let mut out = Vec::new();
            let _ = stdout.read_to_end(&mut out);
            out
        })
    });

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let out = reader
                    .and_then(|r| r.join().ok())
                    .unwrap_or_default();
                let text = String::from_utf8_lossy(&out).trim().to_string();
                // smartctl reports SMART warnings through non-zero exit bits
                // while still printing the attribute table.
                if !status.success() && text.is_empty() {
                    return Err(command_err(format!("exited with {status}")));
                }
                return Ok(text);
            }
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SampleError::Timeout {
                        command: display,
                        after: timeout,
                    });
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => return Err(command_err(e.to_string())),
        }
    }
}
