//! Error handling for schedule extraction.
//!
//! Four error kinds are distinguished so callers can decide between
//! retrying, skipping a sheet or aborting the whole import without
//! matching on message text.

use thiserror::Error;

type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// Layout directory missing or unreadable, or no usable layout in it.
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// Workbook or sheet unreadable, row read failure, invalid argument.
    #[error("Input error: {message}")]
    Input {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// No header row on the sheet, or a header row no layout accepts.
    #[error("Layout match error in sheet '{sheet}': {message}")]
    LayoutMatch { sheet: String, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },
}

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Input,
    LayoutMatch,
    NotFound,
}

impl ExtractError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration_with(
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            source: None,
        }
    }

    pub fn input_with(message: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self::Input {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn layout_match(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LayoutMatch {
            sheet: sheet.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Input { .. } => ErrorKind::Input,
            Self::LayoutMatch { .. } => ErrorKind::LayoutMatch,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Whether the failure only concerns the sheet being parsed, leaving the
    /// rest of the workbook usable.
    pub fn is_sheet_scoped(&self) -> bool {
        matches!(self, Self::LayoutMatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ExtractError::configuration("x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ExtractError::input("x").kind(), ErrorKind::Input);
        assert_eq!(
            ExtractError::layout_match("IIN", "x").kind(),
            ErrorKind::LayoutMatch
        );
        assert_eq!(ExtractError::not_found("x").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_only_layout_errors_are_sheet_scoped() {
        assert!(ExtractError::layout_match("IIN", "no header").is_sheet_scoped());
        assert!(!ExtractError::input("bad row").is_sheet_scoped());
        assert!(!ExtractError::configuration("no layouts").is_sheet_scoped());
    }

    #[test]
    fn test_source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = ExtractError::input_with("Failed to open workbook", io);

        assert_eq!(error.to_string(), "Input error: Failed to open workbook");
        assert_eq!(error.source().map(|s| s.to_string()), Some("gone".into()));
    }
}
