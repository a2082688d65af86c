//! Error types for numeric parsing.
//!
//! Detection never surfaces these to callers: a candidate whose amount
//! fails to parse is dropped and the scan continues. They are public so that
//! [`NumberParser`](crate::NumberParser) can be used on its own.

use thiserror::Error;

/// Errors returned by [`NumberParser::parse`](crate::NumberParser::parse).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input was empty or only whitespace.
    #[error("Empty numeric input")]
    Empty,

    /// The input contains a character that is neither a digit nor a
    /// recognised separator.
    #[error("Invalid character '{0}' in numeric input")]
    InvalidCharacter(char),

    /// Separators are doubled, leading, or trailing (e.g. `1,,2`, `.5.`).
    #[error("Malformed separators in '{0}'")]
    MalformedSeparators(String),

    /// Thousands groups do not follow Western (3-3-3) or Indian (2-2-3)
    /// grouping.
    #[error("Inconsistent digit grouping in '{0}'")]
    InconsistentGrouping(String),

    /// More than one separator style competes for the thousands role, or the
    /// decimal separator appears more than once.
    #[error("Ambiguous separators in '{0}'")]
    Ambiguous(String),

    /// The value does not fit in a decimal.
    #[error("Numeric value out of range: '{0}'")]
    OutOfRange(String),
}

impl ParseError {
    /// Whether this failure comes from separator disambiguation rather than
    /// from non-numeric input.
    pub fn is_ambiguity(&self) -> bool {
        matches!(
            self,
            Self::Ambiguous(_) | Self::InconsistentGrouping(_) | Self::MalformedSeparators(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguity_classification() {
        assert!(ParseError::Ambiguous("1'2.3,4".into()).is_ambiguity());
        assert!(ParseError::InconsistentGrouping("1.23.4".into()).is_ambiguity());
        assert!(!ParseError::Empty.is_ambiguity());
        assert!(!ParseError::InvalidCharacter('x').is_ambiguity());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ParseError::InvalidCharacter('x').to_string(),
            "Invalid character 'x' in numeric input"
        );
        assert_eq!(
            ParseError::InconsistentGrouping("1,23,4".into()).to_string(),
            "Inconsistent digit grouping in '1,23,4'"
        );
    }
}
