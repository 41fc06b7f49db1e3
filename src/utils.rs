use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for grammar loading and generation
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("grammar source unavailable ({}): {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed grammar at line {line} ({reason}): {content:?}")]
    MalformedGrammar {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("random source exhausted after {consumed} draws")]
    RandomSourceExhausted { consumed: usize },

    #[error("Grammar validation failed: {0}")]
    ValidationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GrammarError {
    pub(crate) fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        GrammarError::MalformedGrammar {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    /// Line number of the offending record, if this is a parse failure
    pub fn line(&self) -> Option<usize> {
        match self {
            GrammarError::MalformedGrammar { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Trait extension for Option<T> to convert a missing record field to GrammarError
pub trait OptionExt<T> {
    fn ok_or_malformed(self, line: usize, content: &str, reason: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_malformed(self, line: usize, content: &str, reason: &str) -> Result<T> {
        self.ok_or_else(|| GrammarError::malformed(line, content, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_line() {
        let err = GrammarError::malformed(3, "x:A:AB:1.0", "non-numeric index");
        let text = err.to_string();
        assert!(text.contains("line 3"));
        assert!(text.contains("non-numeric index"));
        assert!(text.contains("x:A:AB:1.0"));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<&str> = None;
        let err = missing
            .ok_or_malformed(2, "0:A", "missing replacement field")
            .unwrap_err();
        assert!(matches!(err, GrammarError::MalformedGrammar { line: 2, .. }));

        assert_eq!(Some(5).ok_or_malformed(1, "", "unused").unwrap(), 5);
    }

    #[test]
    fn test_source_unavailable_keeps_source() {
        use std::error::Error;

        let err = GrammarError::SourceUnavailable {
            path: PathBuf::from("missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.txt"));
        assert!(err.source().is_some());
        assert_eq!(err.line(), None);
    }
}
