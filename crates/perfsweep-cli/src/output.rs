//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use perfsweep::{AggregateSummary, SweepManifest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format for pass results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress reporter for trials and sweeps.
///
/// Everything goes to stderr so stdout stays reserved for results.
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` steps
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures are shown even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Print the closing line of a pass or sweep
    pub fn summary(&self, label: &str, completed: usize, duration: Duration) {
        if self.quiet {
            return;
        }

        let secs = duration.as_secs_f64();
        if self.use_color {
            let ok = Style::new().green().bold();
            self.line(&format!(
                "{} {completed} {label} in {secs:.2}s",
                ok.apply_to("DONE")
            ));
        } else {
            self.line(&format!("DONE {completed} {label} in {secs:.2}s"));
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }
}

/// Render per-counter means for stdout
#[must_use]
pub fn render_summary(summary: &AggregateSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let width = summary.keys().map(str::len).max().unwrap_or(0);
            summary
                .means()
                .iter()
                .map(|(key, mean)| format!("{key:<width$}  {mean}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
        OutputFormat::Json => {
            let means: Vec<_> = summary
                .means()
                .iter()
                .map(|(key, mean)| serde_json::json!({ "key": key, "mean": mean }))
                .collect();
            serde_json::json!({ "trials": summary.trials(), "means": means }).to_string()
        }
    }
}

/// Render the archived entries of a sweep for stdout
#[must_use]
pub fn render_manifest(manifest: &SweepManifest, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            manifest
                .entries
                .iter()
                .map(|entry| {
                    let profile = entry
                        .profile
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |p| p.display().to_string());
                    format!("{}  {profile}", entry.configuration)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        OutputFormat::Json => serde_json::to_string(manifest).unwrap_or_default(),
    }
}
