//! Output formatting for the installer CLI.
//!
//! Human-facing text goes to stderr so stdout carries only the machine
//! readable result (the resolved version or the installed service root).

use crate::artefact::fetch::ProgressSink;
use crate::install_flow::InstalledService;
use std::io::Write;

/// Bytes between progress lines when the content length is unknown.
const UNKNOWN_LENGTH_STEP: u64 = 1024 * 1024;

/// Percentage points between progress lines when the length is known.
const PERCENT_STEP: u64 = 10;

/// Write a line to stderr, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Progress sink that prints coarse download progress to stderr.
///
/// With a declared length a line is printed every ten percent; without
/// one, every mebibyte.
pub struct StderrProgress<'a> {
    stderr: &'a mut dyn Write,
    next_report: u64,
}

impl<'a> StderrProgress<'a> {
    /// Create a sink writing to `stderr`.
    pub fn new(stderr: &'a mut dyn Write) -> Self {
        Self {
            stderr,
            next_report: 0,
        }
    }
}

impl ProgressSink for StderrProgress<'_> {
    fn update(&mut self, bytes_read: u64, content_length: Option<u64>) {
        match content_length.filter(|&len| len > 0) {
            Some(len) => {
                let percent = bytes_read.saturating_mul(100) / len;
                if self.next_report == 0 {
                    self.next_report = PERCENT_STEP;
                }
                if percent >= self.next_report {
                    write_stderr_line(
                        self.stderr,
                        format!("  {percent:>3}% ({bytes_read} of {len} bytes)"),
                    );
                    self.next_report = (percent / PERCENT_STEP + 1) * PERCENT_STEP;
                }
            }
            None => {
                if self.next_report == 0 {
                    self.next_report = UNKNOWN_LENGTH_STEP;
                }
                if bytes_read >= self.next_report {
                    write_stderr_line(self.stderr, format!("  {bytes_read} bytes"));
                    self.next_report = (bytes_read / UNKNOWN_LENGTH_STEP + 1) * UNKNOWN_LENGTH_STEP;
                }
            }
        }
    }
}

/// Format a success message after installation.
#[must_use]
pub fn success_message(installed: &InstalledService) -> String {
    let verification = if installed.checksum().is_verified() {
        "checksum verified"
    } else {
        "checksum not declared by server"
    };
    format!(
        "Installed {} {} to {} ({verification})",
        installed.metadata().artifact(),
        installed.version(),
        installed.service_root()
    )
}
