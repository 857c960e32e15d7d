//! Plain-text report.
//!
//! One block per duplicate group, largest groups first:
//!
//! ```text
//! 3f0a9c1 2
//!     /data/a.txt
//! ```
//!
//! The first line is the last seven characters of the fingerprint and the
//! number of files sharing it. The indented line is the representative path
//! (every path with `--all`). Skipped items and the elapsed time follow.

use std::io::{self, Write};
use std::time::Duration;

use yansi::{Paint, Style};

use crate::duplicates::ScanReport;
use crate::scanner::SHORT_FINGERPRINT_LEN;

const FINGERPRINT_STYLE: Style = Style::new().yellow().bold();
const WARNING_STYLE: Style = Style::new().red();
const DIM_STYLE: Style = Style::new().dim();

/// Text formatter for a [`ScanReport`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a ScanReport,
    show_all: bool,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Formatter printing one representative path per group, without colour.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self {
            report,
            show_all: false,
            color: false,
        }
    }

    /// Print every path of each group instead of the representative.
    #[must_use]
    pub fn with_all_paths(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }

    /// Enable ANSI colours.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in self.report.grouping.duplicate_groups() {
            writeln!(
                writer,
                "{} {}",
                self.paint(group.short_fingerprint(SHORT_FINGERPRINT_LEN), FINGERPRINT_STYLE),
                group.len()
            )?;

            if self.show_all {
                for path in &group.paths {
                    writeln!(writer, "    {}", path.display())?;
                }
            } else if let Some(path) = group.representative() {
                writeln!(writer, "    {}", path.display())?;
            }
        }

        let summary = &self.report.summary;
        if !summary.skipped.is_empty() {
            writeln!(
                writer,
                "{}",
                self.paint(
                    &format!(
                        "Skipped {} ({} subtrees, {} files):",
                        summary.skipped.len(),
                        summary.skipped_subtrees(),
                        summary.skipped_files()
                    ),
                    WARNING_STYLE
                )
            )?;
            for diagnostic in &summary.skipped {
                writeln!(writer, "    {}", diagnostic)?;
            }
        }

        writeln!(
            writer,
            "{}",
            self.paint(&format_elapsed(summary.scan_duration), DIM_STYLE)
        )
    }

    /// Render the report into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// `Time elapsed: <duration>` line.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("Time elapsed: {:?}", elapsed)
}
