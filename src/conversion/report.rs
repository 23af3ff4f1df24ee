//! Conversion report types.
//!
//! Every skip and policy decision made while converting is recorded here as
//! well as logged, so library callers can inspect what happened without
//! installing a logger.

use serde::Serialize;
use std::fmt;

/// A report generated by one conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Source root that was scanned for datasets.
    pub source: String,
    /// Destination root that received the converted project.
    pub destination: String,
    pub counts: ConversionCounts,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.count(ConversionSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(ConversionSeverity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(ConversionSeverity::Info)
    }

    /// Issues carrying the given code.
    pub fn issues_with(&self, code: ConversionIssueCode) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    fn count(&self, severity: ConversionSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn write_section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        severity: ConversionSeverity,
    ) -> fmt::Result {
        let n = self.count(severity);
        if n == 0 {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "{title} ({n}):")?;
        for issue in self.issues.iter().filter(|i| i.severity == severity) {
            writeln!(f, "  - {}", issue.message)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "Converted {} -> {}",
            self.source, self.destination
        )?;
        writeln!(
            f,
            "  {} dataset(s), {} skipped",
            c.datasets, c.datasets_skipped
        )?;
        writeln!(
            f,
            "  {} image(s) converted, {} missing, {} skipped, {} failed",
            c.images_converted, c.images_missing, c.images_skipped, c.images_failed
        )?;
        writeln!(
            f,
            "  {} label(s), {} tag(s), {} class(es)",
            c.labels, c.tags, c.classes
        )?;

        self.write_section(f, "Errors", ConversionSeverity::Error)?;
        self.write_section(f, "Warnings", ConversionSeverity::Warning)?;
        self.write_section(f, "Notes", ConversionSeverity::Info)?;
        Ok(())
    }
}

/// Counts of what a conversion read and wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    /// Dataset directories found under the source root.
    pub datasets: usize,
    pub datasets_skipped: usize,
    pub images_converted: usize,
    /// Image records with no backing file on disk.
    pub images_missing: usize,
    /// Images whose size could not be determined.
    pub images_skipped: usize,
    /// Images that failed assembly (unknown category).
    pub images_failed: usize,
    pub labels: usize,
    pub tags: usize,
    /// Classes in the project registry when the run finished.
    pub classes: usize,
}

/// A single issue recorded during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// An error: a unit of work (an image) produced no output.
    pub fn error(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self::with_severity(ConversionSeverity::Error, code, message)
    }

    /// A warning: input was skipped.
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self::with_severity(ConversionSeverity::Warning, code, message)
    }

    /// An info note describing a policy decision.
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self::with_severity(ConversionSeverity::Info, code, message)
    }

    fn with_severity(
        severity: ConversionSeverity,
        code: ConversionIssueCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Error,
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    // Dataset scope
    /// No annotation index was found in the dataset's `annotations` directory.
    IndexNotFound,
    /// The annotation index could not be read or parsed.
    IndexParseFailed,

    // Image scope
    /// An image record has no backing file.
    ImageFileMissing,
    /// An image's size is neither declared nor readable from the file.
    ImageSizeUnknown,
    /// An object references a category that is not registered.
    UnknownCategory,

    // Object scope
    /// A segmentation value is neither vertex rings nor an RLE mask.
    MalformedSegmentation,
    /// An RLE mask could not be decoded.
    MalformedMask,
    /// A declared bbox does not have four finite components.
    MalformedBbox,

    // Project scope
    /// An existing project meta file was reused.
    MetaReused,
}
