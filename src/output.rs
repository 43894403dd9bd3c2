//! CLI output formatting.
//!
//! Each report has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 photos/dawn.jpg → thumbs/dawn-thumbnail.jpg
//! 002 photos/broken.png
//!     Error: Decode error: invalid PNG signature
//!
//! Wrote 1 thumbnail, 1 failed
//! ```
//!
//! With `--json` the same run is printed as a [`RunReport`].
//!
//! ## Formats
//!
//! ```text
//! jpeg  jpg, jpeg  read/write  quality
//! png   png        read/write  types: fast, best
//! avif  avif       write       quality
//! ```

use crate::imaging::Format;
use crate::thumbnails::Outcome;
use serde::Serialize;
use std::path::PathBuf;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Run output
// ============================================================================

/// One line per input, with failures explained on an indented line.
pub fn format_outcomes(outcomes: &[Outcome<PathBuf>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        let index = format_index(i + 1);
        match &outcome.result {
            Ok(path) => lines.push(format!(
                "{} {} \u{2192} {}",
                index,
                outcome.name,
                path.display()
            )),
            Err(e) => {
                lines.push(format!("{} {}", index, outcome.name));
                lines.push(format!("    Error: {}", e));
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    let written = outcomes.len() - failed;
    if !lines.is_empty() {
        lines.push(String::new());
    }
    if failed == 0 {
        lines.push(format!("Wrote {}", plural(written, "thumbnail")));
    } else {
        lines.push(format!(
            "Wrote {}, {} failed",
            plural(written, "thumbnail"),
            failed
        ));
    }
    lines
}

pub fn print_outcomes(outcomes: &[Outcome<PathBuf>]) {
    for line in format_outcomes(outcomes) {
        println!("{}", line);
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub written: usize,
    pub failed: usize,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Serialize)]
pub struct ItemReport {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn from_outcomes(outcomes: &[Outcome<PathBuf>]) -> Self {
        let items: Vec<ItemReport> = outcomes
            .iter()
            .map(|outcome| ItemReport {
                input: outcome.name.clone(),
                output: outcome.result.as_ref().ok().cloned(),
                error: outcome.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        let failed = items.iter().filter(|item| item.error.is_some()).count();
        Self {
            written: items.len() - failed,
            failed,
            items,
        }
    }
}

pub fn format_outcomes_json(outcomes: &[Outcome<PathBuf>]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RunReport::from_outcomes(outcomes))
}

pub fn print_outcomes_json(outcomes: &[Outcome<PathBuf>]) -> Result<(), serde_json::Error> {
    println!("{}", format_outcomes_json(outcomes)?);
    Ok(())
}

// ============================================================================
// Format listing
// ============================================================================

/// Supported formats with their extensions and encoder options.
pub fn format_formats() -> Vec<String> {
    let rows: Vec<[String; 4]> = Format::ALL
        .iter()
        .map(|format| {
            let access = if format.readable() { "read/write" } else { "write" };
            let mut options = Vec::new();
            if format.supports_quality() {
                options.push("quality".to_string());
            }
            if !format.format_types().is_empty() {
                options.push(format!("types: {}", format.format_types().join(", ")));
            }
            [
                format.name().to_string(),
                format.extensions().join(", "),
                access.to_string(),
                options.join("; "),
            ]
        })
        .collect();

    let name_width = rows.iter().map(|r| r[0].len()).max().unwrap_or(0);
    let ext_width = rows.iter().map(|r| r[1].len()).max().unwrap_or(0);
    let access_width = rows.iter().map(|r| r[2].len()).max().unwrap_or(0);
    rows.iter()
        .map(|[name, extensions, access, options]| {
            format!(
                "{:<name_width$}  {:<ext_width$}  {:<access_width$}  {}",
                name, extensions, access, options
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn print_formats() {
    for line in format_formats() {
        println!("{}", line);
    }
}
