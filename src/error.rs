use std::{fmt::Display, path::PathBuf};
use thiserror::Error;

pub(crate) const UNEXPECTED_EOF: &str = "unexpected end of document";
pub(crate) const MISSING_ROOT: &str = "document has no root element";
pub(crate) const CONTENT_AFTER_ROOT: &str = "content after the root element";

/// Result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every problem raised while turning a BPMN file into a report.
#[derive(Error, Debug)]
pub enum Error {
    #[error("BPMN file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("BPMN file cannot be read: {} - {reason}", path.display())]
    NotReadable { path: PathBuf, reason: String },

    #[error("Invalid XML syntax in BPMN file: {} - {reason}", path.display())]
    InvalidXml { path: PathBuf, reason: String },

    #[error("Failed to render diagram to: {} - {reason}", path.display())]
    RenderFailed { path: PathBuf, reason: String },

    #[error("Cannot create output directory: {} - {reason}", path.display())]
    OutputDir { path: PathBuf, reason: String },

    #[error("Failed to write report to: {} - {reason}", path.display())]
    ReportFailed { path: PathBuf, reason: String },
}

/// Coarse classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input path missing, not a regular file or unreadable.
    File,
    /// Malformed XML.
    Parse,
    /// Diagram rendering or its output directory.
    Render,
    /// PDF composition.
    Report,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self, f)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound(_) | Error::NotAFile(_) | Error::NotReadable { .. } => {
                ErrorKind::File
            }
            Error::InvalidXml { .. } => ErrorKind::Parse,
            Error::RenderFailed { .. } | Error::OutputDir { .. } => ErrorKind::Render,
            Error::ReportFailed { .. } => ErrorKind::Report,
        }
    }

    pub(crate) fn not_readable(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::NotReadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_xml(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::InvalidXml {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn render_failed(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::RenderFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output_dir(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::OutputDir {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn report_failed(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Error::ReportFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let error = Error::FileNotFound("missing.bpmn".into());
        assert_eq!(error.to_string(), "BPMN file not found: missing.bpmn");

        let error = Error::invalid_xml("broken.bpmn", "unexpected end of document");
        assert_eq!(
            error.to_string(),
            "Invalid XML syntax in BPMN file: broken.bpmn - unexpected end of document"
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(Error::NotAFile("dir".into()).kind(), ErrorKind::File);
        assert_eq!(Error::not_readable("a", "denied").kind(), ErrorKind::File);
        assert_eq!(Error::invalid_xml("a", "bad").kind(), ErrorKind::Parse);
        assert_eq!(Error::render_failed("a.png", "boom").kind(), ErrorKind::Render);
        assert_eq!(Error::output_dir("out", "denied").kind(), ErrorKind::Render);
        assert_eq!(Error::report_failed("a.pdf", "boom").kind(), ErrorKind::Report);
    }
}
