use std::fmt;

/// An error raised while reading quads or values from an input surface.
///
/// Format parsers in front of the store report malformed content as
/// [`ValueError::Invalid`] and truncated content as
/// [`ValueError::Incomplete`]; everything behind the parser treats these as
/// opaque sentinels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("invalid value: {reason} at {position}")]
    Invalid { reason: String, position: Position },
    #[error("incomplete input")]
    Incomplete,
}

impl ValueError {
    pub fn invalid(reason: impl Into<String>, line: usize, column: usize) -> Self {
        ValueError::Invalid {
            reason: reason.into(),
            position: Position { line, column },
        }
    }
}

/// A line/column position inside an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
